//! Raw weekly timetable payload as the upstream delivers it.
//!
//! The weekly endpoint returns a flat list of typed elements (classes,
//! teachers, lessons, rooms) plus per-person period records that reference
//! those elements by id. [`ElementIndex`] classifies the elements once so
//! decoding can look them up in O(1).

use std::collections::HashMap;

use serde::Deserialize;

/// The element categories the upstream attaches to periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A school class (form).
    Class,
    /// A teacher.
    Teacher,
    /// A lesson (course/subject).
    Lesson,
    /// A room.
    Room,
}

impl ElementKind {
    /// Parses the numeric wire code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Class),
            2 => Some(Self::Teacher),
            3 => Some(Self::Lesson),
            4 => Some(Self::Room),
            _ => None,
        }
    }

    /// Returns the numeric wire code.
    pub fn code(self) -> i64 {
        match self {
            Self::Class => 1,
            Self::Teacher => 2,
            Self::Lesson => 3,
            Self::Room => 4,
        }
    }
}

/// One typed element of the weekly payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawElement {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub long_name: String,
}

/// A period's reference to an element.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawElementRef {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: i64,
}

/// One scheduled time-slot record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPeriod {
    pub id: i64,
    #[serde(default)]
    pub lesson_id: Option<i64>,
    /// Compact `yyyymmdd` date.
    pub date: u32,
    /// Compact `hhmm` start time.
    pub start_time: u32,
    /// Compact `hhmm` end time.
    pub end_time: u32,
    #[serde(default)]
    pub cell_state: String,
    #[serde(default)]
    pub has_period_text: bool,
    #[serde(default)]
    pub period_text: Option<String>,
    #[serde(default)]
    pub elements: Vec<RawElementRef>,
}

impl RawPeriod {
    /// Id of the referenced element of the given kind, if the period has one.
    pub fn element_of(&self, kind: ElementKind) -> Option<i64> {
        self.elements
            .iter()
            .find(|element| element.kind == kind.code())
            .map(|element| element.id)
    }
}

/// The weekly payload: elements plus per-person period lists.
///
/// The upstream keys `elementPeriods` by the person id as a string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTimetable {
    #[serde(default)]
    pub elements: Vec<RawElement>,
    #[serde(default)]
    pub element_periods: HashMap<String, Vec<RawPeriod>>,
}

impl RawTimetable {
    /// Periods scheduled for the given person; empty when the payload has
    /// none for them.
    pub fn periods_for(&self, person_id: i64) -> &[RawPeriod] {
        self.element_periods
            .get(&person_id.to_string())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Elements classified by kind and indexed by id.
#[derive(Debug)]
pub struct ElementIndex<'a> {
    by_kind: HashMap<(i64, i64), &'a RawElement>,
}

impl<'a> ElementIndex<'a> {
    /// Classifies the payload's elements.
    pub fn build(elements: &'a [RawElement]) -> Self {
        let by_kind = elements
            .iter()
            .map(|element| ((element.kind, element.id), element))
            .collect();
        Self { by_kind }
    }

    /// Looks up an element by kind and id.
    pub fn get(&self, kind: ElementKind, id: i64) -> Option<&'a RawElement> {
        self.by_kind.get(&(kind.code(), id)).copied()
    }

    /// Short name of an element, if present.
    pub fn name_of(&self, kind: ElementKind, id: i64) -> Option<&'a str> {
        self.get(kind, id).map(|element| element.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> RawTimetable {
        serde_json::from_str(
            r#"{
                "elements": [
                    {"id": 1, "type": 2, "name": "Smith", "longName": "Smith John"},
                    {"id": 2, "type": 4, "name": "101", "longName": "Room 101"},
                    {"id": 3, "type": 3, "name": "MATH", "longName": "mathematics"}
                ],
                "elementPeriods": {
                    "1234": [
                        {
                            "id": 10,
                            "lessonId": 77,
                            "date": 20240905,
                            "startTime": 835,
                            "endTime": 920,
                            "cellState": "STANDARD",
                            "hasPeriodText": false,
                            "elements": [
                                {"id": 1, "type": 2},
                                {"id": 2, "type": 4},
                                {"id": 3, "type": 3}
                            ]
                        }
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn deserializes_weekly_payload() {
        let raw = sample_payload();
        assert_eq!(raw.elements.len(), 3);
        assert_eq!(raw.periods_for(1234).len(), 1);
        assert!(raw.periods_for(999).is_empty());

        let period = &raw.periods_for(1234)[0];
        assert_eq!(period.date, 20240905);
        assert_eq!(period.lesson_id, Some(77));
    }

    #[test]
    fn element_lookup_by_kind() {
        let raw = sample_payload();
        let period = &raw.periods_for(1234)[0];

        assert_eq!(period.element_of(ElementKind::Teacher), Some(1));
        assert_eq!(period.element_of(ElementKind::Room), Some(2));
        assert_eq!(period.element_of(ElementKind::Lesson), Some(3));
        assert_eq!(period.element_of(ElementKind::Class), None);
    }

    #[test]
    fn index_classifies_by_kind_and_id() {
        let raw = sample_payload();
        let index = ElementIndex::build(&raw.elements);

        assert_eq!(index.name_of(ElementKind::Teacher, 1), Some("Smith"));
        assert_eq!(index.name_of(ElementKind::Room, 2), Some("101"));
        // Same id under a different kind must not collide.
        assert!(index.get(ElementKind::Teacher, 3).is_none());
    }

    #[test]
    fn element_kind_codes() {
        assert_eq!(ElementKind::from_code(2), Some(ElementKind::Teacher));
        assert_eq!(ElementKind::from_code(9), None);
        assert_eq!(ElementKind::Lesson.code(), 3);
    }
}
