//! Raw period decoding.
//!
//! Turns the upstream's flat period + element-reference records into
//! [`Lesson`] values. Element references the payload does not carry degrade
//! to empty strings; malformed numeric date/time fields are an error, since
//! a period without a valid slot cannot be placed anywhere.

use untical_core::lesson::{CellState, Lesson};
use untical_core::time::{decode_date, decode_time, title_case};

use crate::error::{UntisError, UntisResult};
use crate::raw::{ElementIndex, ElementKind, RawPeriod};

/// Decodes one lesson per raw period, preserving input order.
pub fn decode_periods(periods: &[RawPeriod], index: &ElementIndex<'_>) -> UntisResult<Vec<Lesson>> {
    periods
        .iter()
        .map(|period| decode_period(period, index))
        .collect()
}

fn decode_period(period: &RawPeriod, index: &ElementIndex<'_>) -> UntisResult<Lesson> {
    let date = decode_date(period.date).map_err(|e| {
        UntisError::invalid_response(format!("period {}: {e}", period.id)).with_source(e)
    })?;
    let start_time = decode_time(period.start_time).map_err(|e| {
        UntisError::invalid_response(format!("period {}: {e}", period.id)).with_source(e)
    })?;
    let end_time = decode_time(period.end_time).map_err(|e| {
        UntisError::invalid_response(format!("period {}: {e}", period.id)).with_source(e)
    })?;

    let teacher_name = period
        .element_of(ElementKind::Teacher)
        .and_then(|id| index.name_of(ElementKind::Teacher, id))
        .unwrap_or_default()
        .to_string();
    let room = period
        .element_of(ElementKind::Room)
        .and_then(|id| index.name_of(ElementKind::Room, id))
        .unwrap_or_default()
        .to_string();

    let subject = period
        .element_of(ElementKind::Lesson)
        .and_then(|id| index.get(ElementKind::Lesson, id));
    let subject_short = subject.map(|s| s.name.clone()).unwrap_or_default();
    let subject_long = title_case(subject.map(|s| s.long_name.as_str()).unwrap_or_default());

    Ok(Lesson {
        id: period.id,
        lesson_id: period.lesson_id,
        period_text: if period.has_period_text {
            period.period_text.clone().filter(|text| !text.is_empty())
        } else {
            None
        },
        date,
        start_time,
        end_time,
        cell_state: CellState::from_code(&period.cell_state),
        teacher_name,
        room,
        subject_short,
        subject_long,
    })
}
