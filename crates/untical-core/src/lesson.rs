//! Normalized lesson model.
//!
//! [`Lesson`] is the per-period record produced by decoding the upstream
//! timetable payload. It is created once per raw period, may have its
//! `teacher_name` backfilled by the enrichment pass, and is read-only
//! afterwards. [`FreePeriod`] entries are synthesized into day gaps and
//! never mutated.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::time::{clock_time, dotted_date};

/// The scheduling state of a period as reported by the upstream cell.
///
/// Unknown states are preserved verbatim so nothing is lost on the way to
/// the cleaned export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellState {
    /// A regularly scheduled lesson.
    Standard,
    /// The lesson is cancelled.
    Cancel,
    /// The lesson was moved to another slot.
    Shift,
    /// An exam takes place in this slot.
    Exam,
    /// Another teacher substitutes.
    Substitution,
    /// Any state this crate does not know about.
    Other(String),
}

impl CellState {
    /// Parses the upstream state code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "STANDARD" => Self::Standard,
            "CANCEL" => Self::Cancel,
            "SHIFT" => Self::Shift,
            "EXAM" => Self::Exam,
            "SUBSTITUTION" => Self::Substitution,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the upstream state code.
    pub fn as_code(&self) -> &str {
        match self {
            Self::Standard => "STANDARD",
            Self::Cancel => "CANCEL",
            Self::Shift => "SHIFT",
            Self::Exam => "EXAM",
            Self::Substitution => "SUBSTITUTION",
            Self::Other(code) => code,
        }
    }

    /// Advisory display color for this state, if one is defined.
    pub fn color(&self) -> Option<&'static str> {
        match self {
            Self::Standard => Some("#B4F8B4"),
            Self::Cancel => Some("#C5C6C6"),
            Self::Shift => Some("#B5A0C1"),
            Self::Exam => Some("#F5F1C1"),
            Self::Substitution => Some("#B79CC4"),
            Self::Other(_) => None,
        }
    }

    /// Returns true if the period is cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancel)
    }
}

impl Serialize for CellState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_code())
    }
}

impl<'de> Deserialize<'de> for CellState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::from_code(&code))
    }
}

/// One decoded timetable period.
///
/// Element references the upstream did not supply come through as empty
/// strings rather than errors; the enrichment pass may later fill in a
/// missing `teacher_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    /// Upstream period id.
    pub id: i64,

    /// Upstream lesson (course) id, when reported.
    pub lesson_id: Option<i64>,

    /// Free-form period annotation, when the cell carries one.
    pub period_text: Option<String>,

    /// Calendar day of the period.
    #[serde(with = "dotted_date")]
    pub date: NaiveDate,

    /// Start of the period.
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,

    /// End of the period.
    #[serde(with = "clock_time")]
    pub end_time: NaiveTime,

    /// Scheduling state of the cell.
    pub cell_state: CellState,

    /// Teacher display name; empty when the upstream withheld it.
    pub teacher_name: String,

    /// Room name; empty when unknown.
    pub room: String,

    /// Short subject code (e.g. "MATH").
    pub subject_short: String,

    /// Title-cased long subject name.
    pub subject_long: String,
}

impl Lesson {
    /// Advisory display color derived from the cell state.
    pub fn color(&self) -> Option<&'static str> {
        self.cell_state.color()
    }

    /// Calendar summary line: the subject code, falling back through the
    /// long name and the period text to a generic placeholder.
    pub fn summary(&self) -> &str {
        if !self.subject_short.is_empty() {
            return &self.subject_short;
        }
        if !self.subject_long.is_empty() {
            return &self.subject_long;
        }
        match self.period_text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => "Lesson",
        }
    }

    /// Returns true if the enrichment pass still needs to resolve a teacher.
    pub fn missing_teacher(&self) -> bool {
        self.teacher_name.is_empty()
    }
}

/// A synthesized unscheduled slot between two lessons of the same day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreePeriod {
    /// Calendar day of the gap.
    #[serde(with = "dotted_date")]
    pub date: NaiveDate,

    /// Start of the gap (end of the previous lesson).
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,

    /// End of the gap (start of the next lesson).
    #[serde(with = "clock_time")]
    pub end_time: NaiveTime,
}

/// One entry of a day bucket: a lesson or a synthesized free period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    /// A decoded lesson.
    Lesson(Lesson),
    /// A synthesized gap.
    Free(FreePeriod),
}

impl Entry {
    /// Start time of the entry.
    pub fn start_time(&self) -> NaiveTime {
        match self {
            Self::Lesson(lesson) => lesson.start_time,
            Self::Free(free) => free.start_time,
        }
    }

    /// End time of the entry.
    pub fn end_time(&self) -> NaiveTime {
        match self {
            Self::Lesson(lesson) => lesson.end_time,
            Self::Free(free) => free.end_time,
        }
    }

    /// Returns the lesson if this entry is one.
    pub fn as_lesson(&self) -> Option<&Lesson> {
        match self {
            Self::Lesson(lesson) => Some(lesson),
            Self::Free(_) => None,
        }
    }

    /// Returns true for synthesized free periods.
    pub fn is_free_period(&self) -> bool {
        matches!(self, Self::Free(_))
    }
}
