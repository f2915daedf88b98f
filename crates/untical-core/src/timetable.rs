//! Day-bucket assembly: filtering, grouping, ordering, free-period synthesis.
//!
//! A [`Timetable`] holds one bucket of entries per calendar day. Buckets
//! iterate in true chronological order (the map is keyed by [`NaiveDate`],
//! never by a formatted string), and entries within a bucket are ordered by
//! start time. Downstream projectors rely on this iteration order.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::lesson::{Entry, FreePeriod, Lesson};

/// Minimum gap, in minutes, that counts as a free period. Anything shorter
/// is a normal between-class transition.
pub const FREE_PERIOD_THRESHOLD_MIN: i64 = 15;

/// Administrative placeholder code; lessons whose subject carries it are
/// dropped from the timetable entirely.
pub const EXCLUDED_SUBJECT_MARKER: &str = "EBC";

/// Per-day buckets of lessons and synthesized free periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timetable {
    days: BTreeMap<NaiveDate, Vec<Entry>>,
}

impl Timetable {
    /// Builds a timetable from decoded lessons.
    ///
    /// Lessons whose short or long subject name contains
    /// [`EXCLUDED_SUBJECT_MARKER`] are dropped. The remaining lessons are
    /// bucketed by day and sorted by start time within each bucket; the
    /// buckets themselves are chronological by construction.
    pub fn from_lessons(lessons: Vec<Lesson>) -> Self {
        let mut days: BTreeMap<NaiveDate, Vec<Entry>> = BTreeMap::new();

        for lesson in lessons {
            if lesson.subject_short.contains(EXCLUDED_SUBJECT_MARKER)
                || lesson.subject_long.contains(EXCLUDED_SUBJECT_MARKER)
            {
                continue;
            }
            days.entry(lesson.date).or_default().push(Entry::Lesson(lesson));
        }

        for entries in days.values_mut() {
            entries.sort_by_key(Entry::start_time);
        }

        Self { days }
    }

    /// Inserts a synthetic [`FreePeriod`] into every in-day gap of at least
    /// [`FREE_PERIOD_THRESHOLD_MIN`] minutes.
    ///
    /// The synthesized entry spans exactly the gap and lands immediately
    /// before the entry that follows it. Nothing is inserted before the
    /// first or after the last entry of a day.
    pub fn insert_free_periods(&mut self) {
        let threshold = Duration::minutes(FREE_PERIOD_THRESHOLD_MIN);

        for (date, entries) in self.days.iter_mut() {
            let mut filled = Vec::with_capacity(entries.len());
            let mut previous_end = None;

            for entry in entries.drain(..) {
                if let Some(prev) = previous_end {
                    if entry.start_time() - prev >= threshold {
                        filled.push(Entry::Free(FreePeriod {
                            date: *date,
                            start_time: prev,
                            end_time: entry.start_time(),
                        }));
                    }
                }
                previous_end = Some(entry.end_time());
                filled.push(entry);
            }

            *entries = filled;
        }
    }

    /// Merges week timetables into one, keeping chronological day order.
    ///
    /// Weeks do not overlap; if two inputs do carry the same day, their
    /// entries are concatenated in input order.
    pub fn merge(weeks: impl IntoIterator<Item = Timetable>) -> Self {
        let mut days: BTreeMap<NaiveDate, Vec<Entry>> = BTreeMap::new();
        for week in weeks {
            for (date, entries) in week.days {
                days.entry(date).or_default().extend(entries);
            }
        }
        Self { days }
    }

    /// Iterates day buckets in chronological order.
    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, &[Entry])> {
        self.days.iter().map(|(date, entries)| (*date, entries.as_slice()))
    }

    /// Flattens the timetable back into its lessons, in iteration order.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.days.values().flatten().filter_map(Entry::as_lesson)
    }

    /// Number of day buckets.
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Returns true if no day carries any entry.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
