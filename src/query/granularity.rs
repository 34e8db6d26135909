use crate::error::RollupError;
use crate::query::range::format_timestamp;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Month,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::Hour, Granularity::Day, Granularity::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Month => "month",
        }
    }

    /// Derives the bucket a timestamp falls into.
    pub fn key_for(&self, ts: &NaiveDateTime) -> BucketKey {
        match self {
            Granularity::Hour => BucketKey::Hour(truncate_to_hour(ts)),
            Granularity::Day => BucketKey::DayOfYear(ts.ordinal()),
            Granularity::Month => BucketKey::Month(ts.month()),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = RollupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Granularity::ALL
            .into_iter()
            .find(|g| g.as_str() == normalized)
            .ok_or_else(|| {
                RollupError::invalid_input(format!(
                    "unsupported group_type '{}', expected one of hour, day, month",
                    s
                ))
            })
    }
}

/// Scalar identifying one bucket. Day and month keys carry no year, so
/// ranges spanning a year boundary fold onto the same ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    Hour(NaiveDateTime),
    DayOfYear(u32),
    Month(u32),
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Hour(ts) => f.write_str(&format_timestamp(ts)),
            BucketKey::DayOfYear(day) => write!(f, "{}", day),
            BucketKey::Month(month) => write!(f, "{}", month),
        }
    }
}

pub fn truncate_to_hour(ts: &NaiveDateTime) -> NaiveDateTime {
    ts.date()
        .and_hms_opt(ts.hour(), 0, 0)
        .unwrap_or(*ts)
}
