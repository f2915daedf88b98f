//! Time and date handling for timetable data.
//!
//! The upstream API transports times as compact integers (`835` for 08:35,
//! `20240905` for 2024-09-05). This module decodes those into [`chrono`]
//! types, provides the fixed-width string forms used by the cleaned exports
//! (`HH:MM` and `dd.mm.yyyy`), and carries the school-year window math that
//! bounds how far a feed may extend.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use thiserror::Error;

/// Errors from decoding the upstream compact numeric formats.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The value is not a valid `hhmm` clock time.
    #[error("not a valid hhmm time: {0}")]
    Time(u32),

    /// The value is not a valid `yyyymmdd` calendar date.
    #[error("not a valid yyyymmdd date: {0}")]
    Date(u32),
}

/// Decodes a compact `hhmm` integer into a [`NaiveTime`].
///
/// The upstream omits leading zeros, so `835` means 08:35.
pub fn decode_time(raw: u32) -> Result<NaiveTime, DecodeError> {
    let (hour, minute) = (raw / 100, raw % 100);
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or(DecodeError::Time(raw))
}

/// Decodes a compact `yyyymmdd` integer into a [`NaiveDate`].
pub fn decode_date(raw: u32) -> Result<NaiveDate, DecodeError> {
    let (year, month, day) = (raw / 10_000, raw / 100 % 100, raw % 100);
    NaiveDate::from_ymd_opt(year as i32, month, day).ok_or(DecodeError::Date(raw))
}

/// Serde adapter for the `dd.mm.yyyy` date form used in lesson records.
pub mod dotted_date {
    use chrono::NaiveDate;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%d.%m.%Y";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for the zero-padded `HH:MM` clock form.
pub mod clock_time {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Title-cases a phrase word by word ("mathematics advanced" → "Mathematics Advanced").
///
/// The rest of each word is lowered first, so ALL-CAPS upstream long names
/// come out readable.
pub fn title_case(phrase: &str) -> String {
    phrase
        .to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns the Monday of the week containing `date`.
pub fn monday_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// First Monday of September: the start of the school year beginning in `year`.
pub fn first_monday_of_september(year: i32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, 9, 1).expect("September 1st exists");
    let offset = (8 - first.weekday().num_days_from_sunday()) % 7;
    first + Duration::days(offset as i64)
}

/// End of the school year that `today` falls in: July 7th.
pub fn school_year_end(today: NaiveDate) -> NaiveDate {
    let end_year = if today.month() >= 9 {
        today.year() + 1
    } else {
        today.year()
    };
    NaiveDate::from_ymd_opt(end_year, 7, 7).expect("July 7th exists")
}

/// Start of the next school year strictly at or after `today`.
pub fn next_school_year_start(today: NaiveDate) -> NaiveDate {
    let this_start = first_monday_of_september(today.year());
    if today < this_start {
        this_start
    } else {
        first_monday_of_september(today.year() + 1)
    }
}

/// Whether `date` falls in the summer break (July 7th up to the next
/// school-year start).
pub fn is_summer_break(date: NaiveDate) -> bool {
    let summer_start = NaiveDate::from_ymd_opt(date.year(), 7, 7).expect("July 7th exists");
    date >= summer_start && date < first_monday_of_september(date.year())
}

/// Number of school weeks left between `start` and the school-year end,
/// rounded up. Zero once the year is over.
pub fn remaining_school_weeks(start: NaiveDate) -> u32 {
    let end = school_year_end(start);
    if start >= end {
        return 0;
    }
    let days = (end - start).num_days() as u64;
    days.div_ceil(7) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn decodes_compact_times() {
        assert_eq!(
            decode_time(835).unwrap(),
            NaiveTime::from_hms_opt(8, 35, 0).unwrap()
        );
        assert_eq!(
            decode_time(1420).unwrap(),
            NaiveTime::from_hms_opt(14, 20, 0).unwrap()
        );
        assert_eq!(
            decode_time(0).unwrap(),
            NaiveTime::from_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_invalid_times() {
        assert_eq!(decode_time(2400), Err(DecodeError::Time(2400)));
        assert_eq!(decode_time(1260), Err(DecodeError::Time(1260)));
    }

    #[test]
    fn decodes_compact_dates() {
        assert_eq!(
            decode_date(20240905).unwrap(),
            NaiveDate::from_ymd_opt(2024, 9, 5).unwrap()
        );
    }

    #[test]
    fn rejects_invalid_dates() {
        assert_eq!(decode_date(20241341), Err(DecodeError::Date(20241341)));
        assert_eq!(decode_date(123), Err(DecodeError::Date(123)));
    }

    #[test]
    fn dotted_date_roundtrip() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wrapper {
            #[serde(with = "dotted_date")]
            date: NaiveDate,
        }

        let wrapper = Wrapper {
            date: NaiveDate::from_ymd_opt(2024, 9, 5).unwrap(),
        };
        let json = serde_json::to_string(&wrapper).unwrap();
        assert_eq!(json, r#"{"date":"05.09.2024"}"#);

        let parsed: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.date, wrapper.date);
    }

    #[test]
    fn clock_time_is_zero_padded() {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(with = "clock_time")]
            time: NaiveTime,
        }

        let wrapper = Wrapper {
            time: NaiveTime::from_hms_opt(8, 5, 0).unwrap(),
        };
        assert_eq!(
            serde_json::to_string(&wrapper).unwrap(),
            r#"{"time":"08:05"}"#
        );
    }

    #[test]
    fn title_cases_word_by_word() {
        assert_eq!(title_case("mathematics"), "Mathematics");
        assert_eq!(title_case("PHYSICAL EDUCATION"), "Physical Education");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn monday_snapping() {
        // 2024-09-05 is a Thursday
        let thursday = NaiveDate::from_ymd_opt(2024, 9, 5).unwrap();
        assert_eq!(
            monday_of_week(thursday),
            NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
        );
        let monday = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        assert_eq!(monday_of_week(monday), monday);
    }

    #[test]
    fn school_year_starts_on_a_monday() {
        for year in [2023, 2024, 2025, 2026] {
            let start = first_monday_of_september(year);
            assert_eq!(start.weekday(), Weekday::Mon, "year {year}");
            assert_eq!(start.month(), 9);
            assert!(start.day() <= 7);
        }
    }

    #[test]
    fn next_start_skips_past_current_year_start() {
        // June: the upcoming start is this calendar year's.
        let june = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(next_school_year_start(june), first_monday_of_september(2024));

        // October: this year's start already passed.
        let october = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        assert_eq!(
            next_school_year_start(october),
            first_monday_of_september(2025)
        );
    }

    #[test]
    fn summer_break_window() {
        assert!(is_summer_break(
            NaiveDate::from_ymd_opt(2024, 7, 20).unwrap()
        ));
        assert!(is_summer_break(NaiveDate::from_ymd_opt(2024, 7, 7).unwrap()));
        assert!(!is_summer_break(
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
        ));
        assert!(!is_summer_break(first_monday_of_september(2024)));
    }

    #[test]
    fn remaining_weeks_count_down_to_zero() {
        // One week before the year end.
        let start = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        assert_eq!(remaining_school_weeks(start), 1);

        // After the end: nothing left.
        let past = NaiveDate::from_ymd_opt(2025, 7, 8).unwrap();
        assert_eq!(remaining_school_weeks(past), 0);

        // From the start of the year there is a whole year's worth.
        let autumn = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        assert!(remaining_school_weeks(autumn) > 40);
    }
}
