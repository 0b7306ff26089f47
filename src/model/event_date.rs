use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How directly a date is labeled in the source: tier1 (explicit label) >
/// tier2 (header) > propagated > anchor (offset-derived).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// Ordered so anchor < propagated < tier2 < tier1 for `max()`-style
    /// "pick the best-ranked date" comparisons.
    Anchor,
    Propagated,
    Tier2,
    Tier1,
}

impl DateSource {
    pub fn confidence_points(&self) -> i32 {
        match self {
            DateSource::Tier1 => 35,
            DateSource::Tier2 => 20,
            DateSource::Propagated | DateSource::Anchor => 15,
        }
    }
}

/// A tagged union over the four ways a date can be expressed once extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventDateValue {
    Single { value: NaiveDate },
    Range { start: NaiveDate, end: Option<NaiveDate> },
    Relative { anchor_event_id: String, offset_days: i64 },
    Partial {
        month: Option<u32>,
        day: Option<u32>,
        year: Option<i32>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDate {
    #[serde(flatten)]
    pub value: EventDateValue,
    pub source: DateSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl EventDate {
    pub fn single(value: NaiveDate, source: DateSource) -> Self {
        Self {
            value: EventDateValue::Single { value },
            source,
            time: None,
        }
    }

    /// A finite, sortable representative date, used by every stage that
    /// needs a single comparison key (dedup, gap detection, projection
    /// ordering). Ranges sort by `start`; relative dates and fully-unknown
    /// partials have no finite representative and return `None`.
    pub fn sort_key(&self) -> Option<NaiveDate> {
        match &self.value {
            EventDateValue::Single { value } => Some(*value),
            EventDateValue::Range { start, .. } => Some(*start),
            EventDateValue::Relative { .. } => None,
            EventDateValue::Partial { month, day, year } => {
                match (year, month, day) {
                    (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(*y, *m, *d),
                    _ => None,
                }
            }
        }
    }

    /// Year-range sanity: a finite representative date must fall within
    /// `1970 ..= today`.
    pub fn is_sane(&self, today: NaiveDate) -> bool {
        match self.sort_key() {
            Some(d) => d.format("%Y").to_string().parse::<i32>().unwrap_or(0) >= 1970 && d <= today,
            None => true,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self.value, EventDateValue::Single { .. } | EventDateValue::Range { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_source_confidence_points() {
        assert_eq!(DateSource::Tier1.confidence_points(), 35);
        assert_eq!(DateSource::Tier2.confidence_points(), 20);
        assert_eq!(DateSource::Propagated.confidence_points(), 15);
        assert_eq!(DateSource::Anchor.confidence_points(), 15);
    }

    #[test]
    fn test_sort_key_single() {
        let d = EventDate::single(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), DateSource::Tier1);
        assert_eq!(d.sort_key(), NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_sort_key_relative_is_none() {
        let d = EventDate {
            value: EventDateValue::Relative {
                anchor_event_id: "e1".into(),
                offset_days: 2,
            },
            source: DateSource::Anchor,
            time: None,
        };
        assert_eq!(d.sort_key(), None);
    }

    #[test]
    fn test_is_sane_rejects_pre_1970() {
        let d = EventDate::single(NaiveDate::from_ymd_opt(1950, 1, 1).unwrap(), DateSource::Tier1);
        assert!(!d.is_sane(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
    }

    #[test]
    fn test_is_sane_rejects_future() {
        let d = EventDate::single(NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(), DateSource::Tier1);
        assert!(!d.is_sane(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
    }
}
