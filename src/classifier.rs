//! Time-of-day classification.
//!
//! Partitions the clock into three buckets. Only the time component of a
//! timestamp matters; boundary instants belong to the later bucket:
//!
//! ```text
//! Morning   [00:00, 12:00)
//! Afternoon [12:00, 17:00)
//! Evening   [17:00, 24:00)
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime, Timelike};

use crate::error::ReportError;

/// Hour at which Afternoon starts.
pub const AFTERNOON_STARTS: u32 = 12;
/// Hour at which Evening starts.
pub const EVENING_STARTS: u32 = 17;

/// Time-of-day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// All buckets, in clock order.
    pub const ALL: [TimeOfDay; 3] = [TimeOfDay::Morning, TimeOfDay::Afternoon, TimeOfDay::Evening];

    /// Classify a timestamp by its time component.
    pub fn classify(timestamp: &NaiveDateTime) -> Self {
        Self::of_time(&timestamp.time())
    }

    /// Classify a wall-clock time.
    pub fn of_time(time: &NaiveTime) -> Self {
        match time.hour() {
            h if h < AFTERNOON_STARTS => TimeOfDay::Morning,
            h if h < EVENING_STARTS => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }

    /// Label as stored in the report tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeOfDay {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeOfDay::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| ReportError::UnknownLabel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> TimeOfDay {
        TimeOfDay::of_time(&NaiveTime::from_hms_opt(h, m, s).unwrap())
    }

    #[test]
    fn test_boundaries_belong_to_upper_bucket() {
        assert_eq!(at(0, 0, 0), TimeOfDay::Morning);
        assert_eq!(at(11, 59, 59), TimeOfDay::Morning);
        assert_eq!(at(12, 0, 0), TimeOfDay::Afternoon);
        assert_eq!(at(16, 59, 59), TimeOfDay::Afternoon);
        assert_eq!(at(17, 0, 0), TimeOfDay::Evening);
        assert_eq!(at(23, 59, 59), TimeOfDay::Evening);
    }

    #[test]
    fn test_sub_second_before_noon_is_morning() {
        let time = NaiveTime::from_hms_nano_opt(11, 59, 59, 999_999_999).unwrap();
        assert_eq!(TimeOfDay::of_time(&time), TimeOfDay::Morning);
    }

    #[test]
    fn test_every_minute_maps_to_exactly_one_bucket() {
        let mut counts = [0u32; 3];
        for minute in 0..24 * 60 {
            let label = at(minute / 60, minute % 60, 0);
            counts[TimeOfDay::ALL.iter().position(|l| *l == label).unwrap()] += 1;
        }
        assert_eq!(counts, [12 * 60, 5 * 60, 7 * 60]);
    }

    #[test]
    fn test_date_component_is_ignored() {
        let a = NaiveDateTime::parse_from_str("2005-05-24 22:53:30", "%Y-%m-%d %H:%M:%S").unwrap();
        let b = NaiveDateTime::parse_from_str("2006-02-14 22:53:30", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(TimeOfDay::classify(&a), TimeOfDay::classify(&b));
        assert_eq!(TimeOfDay::classify(&a), TimeOfDay::Evening);
    }

    #[test]
    fn test_label_parse() {
        for label in TimeOfDay::ALL {
            assert_eq!(label.as_str().parse::<TimeOfDay>().unwrap(), label);
        }
        assert!(matches!(
            "Night".parse::<TimeOfDay>(),
            Err(ReportError::UnknownLabel(s)) if s == "Night"
        ));
    }
}
