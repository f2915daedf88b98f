//! Calendar (ICS) projection of a timetable.
//!
//! Consumes the assembled [`Timetable`] and emits one VEVENT per scheduled
//! lesson. Cancelled periods and synthesized free periods never reach the
//! calendar; the cleaned JSON export is the place to inspect those.

use chrono_tz::Tz;
use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike};
use tracing::warn;

use crate::lesson::Lesson;
use crate::timetable::Timetable;

/// Timezone the feed is anchored in.
pub const FEED_TIMEZONE: Tz = chrono_tz::Europe::Vienna;

/// Display name of the generated calendar.
pub const CALENDAR_NAME: &str = "School Timetable";

/// Projects a timetable into a calendar document.
///
/// Events carry timezone-anchored start/end times, a summary derived from
/// the subject, a description assembled from the optional fields, and the
/// advisory `COLOR` hint when the cell state defines one. An entry with an
/// inverted time range is skipped rather than failing the whole calendar.
pub fn project_calendar(timetable: &Timetable) -> Calendar {
    let mut calendar = Calendar::new();
    calendar.name(CALENDAR_NAME);
    calendar.timezone(FEED_TIMEZONE.name());

    for (date, entries) in timetable.days() {
        for entry in entries {
            let Some(lesson) = entry.as_lesson() else {
                continue;
            };
            if lesson.cell_state.is_cancelled() {
                continue;
            }
            if lesson.end_time < lesson.start_time {
                warn!(
                    id = lesson.id,
                    %date,
                    "skipping event with inverted time range"
                );
                continue;
            }

            let mut event = Event::new();
            event
                .uid(&format!("untical-{}-{}", lesson.id, date))
                .summary(lesson.summary())
                .description(&describe(lesson))
                .starts(CalendarDateTime::WithTimezone {
                    date_time: date.and_time(lesson.start_time),
                    tzid: FEED_TIMEZONE.name().to_string(),
                })
                .ends(CalendarDateTime::WithTimezone {
                    date_time: date.and_time(lesson.end_time),
                    tzid: FEED_TIMEZONE.name().to_string(),
                });
            if let Some(color) = lesson.color() {
                event.add_property("COLOR", color);
            }

            calendar.push(event.done());
        }
    }

    calendar
}

/// Joins the lesson's optional fields into a description, omitting absent
/// ones.
fn describe(lesson: &Lesson) -> String {
    let mut parts = Vec::new();
    if !lesson.subject_long.is_empty() {
        parts.push(lesson.subject_long.clone());
    }
    if !lesson.room.is_empty() {
        parts.push(format!("Room: {}", lesson.room));
    }
    if !lesson.teacher_name.is_empty() {
        parts.push(format!("Teacher: {}", lesson.teacher_name));
    }
    if let Some(text) = lesson.period_text.as_deref() {
        if !text.is_empty() {
            parts.push(text.to_string());
        }
    }
    parts.join(", ")
}
