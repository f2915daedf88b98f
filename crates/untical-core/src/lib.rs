//! Core types: lessons, timetable assembly, school-year math, calendar projection

pub mod clean;
pub mod ical;
pub mod lesson;
pub mod time;
pub mod timetable;
pub mod tracing;

pub use clean::{CleanDay, CleanDocument, CleanLesson, CleanSlot};
pub use ical::{CALENDAR_NAME, FEED_TIMEZONE, project_calendar};
pub use lesson::{CellState, Entry, FreePeriod, Lesson};
pub use time::{DecodeError, decode_date, decode_time};
pub use timetable::{EXCLUDED_SUBJECT_MARKER, FREE_PERIOD_THRESHOLD_MIN, Timetable};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
