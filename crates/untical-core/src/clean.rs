//! Cleaned JSON export of a timetable.
//!
//! The cleaned document is the machine-readable sibling of the calendar
//! feed: `{generatedAt, days: [{date, lessons, freePeriods}]}` with ISO
//! dates. It derives from the same [`Timetable`] the calendar projector
//! consumes, so the two outputs cannot drift apart.
//!
//! Cancelled lessons are retained here with their `state` field as the
//! audit flag; only the calendar projection hides them.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::lesson::{Entry, Lesson};
use crate::time::clock_time;
use crate::timetable::Timetable;

/// The cleaned export document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanDocument {
    /// When this document was produced.
    pub generated_at: DateTime<Utc>,
    /// Day records in chronological order.
    pub days: Vec<CleanDay>,
}

/// One exported day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanDay {
    /// ISO calendar date (`yyyy-mm-dd`).
    pub date: NaiveDate,
    /// Lessons of the day, in start-time order.
    pub lessons: Vec<CleanLesson>,
    /// Synthesized free periods of the day.
    pub free_periods: Vec<CleanSlot>,
}

/// One exported lesson. Fields the upstream did not supply are omitted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanLesson {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_long: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(with = "clock_time")]
    pub start: NaiveTime,
    #[serde(with = "clock_time")]
    pub end: NaiveTime,
    /// Upstream scheduling state ("CANCEL" marks retained cancellations).
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

/// A bare time slot, used for free periods.
#[derive(Debug, Clone, Serialize)]
pub struct CleanSlot {
    #[serde(with = "clock_time")]
    pub start: NaiveTime,
    #[serde(with = "clock_time")]
    pub end: NaiveTime,
}

impl CleanDocument {
    /// Builds the cleaned document from an assembled timetable.
    pub fn from_timetable(timetable: &Timetable) -> Self {
        let days = timetable
            .days()
            .map(|(date, entries)| {
                let mut lessons = Vec::new();
                let mut free_periods = Vec::new();
                for entry in entries {
                    match entry {
                        Entry::Lesson(lesson) => lessons.push(clean_lesson(lesson)),
                        Entry::Free(free) => free_periods.push(CleanSlot {
                            start: free.start_time,
                            end: free.end_time,
                        }),
                    }
                }
                CleanDay {
                    date,
                    lessons,
                    free_periods,
                }
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            days,
        }
    }
}

fn clean_lesson(lesson: &Lesson) -> CleanLesson {
    CleanLesson {
        id: lesson.id,
        lesson_id: lesson.lesson_id,
        subject: non_empty(&lesson.subject_short),
        subject_long: non_empty(&lesson.subject_long),
        teacher: non_empty(&lesson.teacher_name),
        room: non_empty(&lesson.room),
        start: lesson.start_time,
        end: lesson.end_time,
        state: lesson.cell_state.as_code().to_string(),
        period_text: lesson.period_text.clone().filter(|t| !t.is_empty()),
        color: lesson.color(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
