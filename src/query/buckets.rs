use crate::error::RollupError;
use crate::query::granularity::{truncate_to_hour, BucketKey, Granularity};
use crate::query::range::{format_timestamp, TimeRange};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Where the hourly walk begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourAnchor {
    /// Hour 0 of the start's calendar day.
    #[default]
    StartOfDay,
    /// The start instant truncated to its hour.
    StartHour,
}

impl FromStr for HourAnchor {
    type Err = RollupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "start_of_day" => Ok(HourAnchor::StartOfDay),
            "hour" | "start_hour" => Ok(HourAnchor::StartHour),
            other => Err(RollupError::invalid_input(format!(
                "unknown hour anchor '{}'",
                other
            ))),
        }
    }
}

/// One slot of the output series. The lookup key and the display label
/// are derived from the same instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub key: BucketKey,
    pub start: NaiveDateTime,
    pub label: String,
}

impl Bucket {
    fn new(key: BucketKey, start: NaiveDateTime) -> Self {
        Self {
            key,
            start,
            label: format_timestamp(&start),
        }
    }
}

/// Lists every bucket the output must contain, in chronological order.
/// An inverted range yields no buckets.
pub fn enumerate(range: &TimeRange, granularity: Granularity, anchor: HourAnchor) -> Vec<Bucket> {
    if range.is_inverted() {
        return Vec::new();
    }

    match granularity {
        Granularity::Hour => hour_buckets(range, anchor),
        Granularity::Day => day_buckets(range),
        Granularity::Month => month_buckets(range),
    }
}

fn hour_buckets(range: &TimeRange, anchor: HourAnchor) -> Vec<Bucket> {
    let count = (range.end - range.start).num_seconds() / 3600 + 1;
    let origin = match anchor {
        HourAnchor::StartOfDay => range.start.date().and_time(chrono::NaiveTime::MIN),
        HourAnchor::StartHour => truncate_to_hour(&range.start),
    };

    // Calendar arithmetic: the day rolls every 24 buckets and months roll over correctly.
    (0..count)
        .map_while(|i| origin.checked_add_signed(Duration::hours(i)))
        .map(|ts| Bucket::new(BucketKey::Hour(ts), ts))
        .collect()
}

fn day_buckets(range: &TimeRange) -> Vec<Bucket> {
    let count = (range.end - range.start).num_days() + 1;

    (0..count)
        .map_while(|i| range.start.checked_add_signed(Duration::days(i)))
        .map(|ts| Bucket::new(BucketKey::DayOfYear(ts.ordinal()), ts))
        .collect()
}

fn month_buckets(range: &TimeRange) -> Vec<Bucket> {
    let year = range.start.year();

    // Only months of the start's year are produced; keys carry no year.
    (range.start.month()..=range.end.month())
        .filter_map(|month| NaiveDate::from_ymd_opt(year, month, 1))
        .map(|date| {
            let ts = date.and_time(chrono::NaiveTime::MIN);
            Bucket::new(BucketKey::Month(date.month()), ts)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn range(from: &str, to: &str) -> TimeRange {
        TimeRange::normalize(from, to).unwrap()
    }

    fn labels(buckets: &[Bucket]) -> Vec<&str> {
        buckets.iter().map(|b| b.label.as_str()).collect()
    }

    #[test]
    fn test_hour_buckets_include_both_ends() {
        let buckets = enumerate(
            &range("2024-01-01T00:00:00", "2024-01-01T02:00:00"),
            Granularity::Hour,
            HourAnchor::StartOfDay,
        );

        assert_eq!(
            labels(&buckets),
            vec!["2024-01-01T00:00:00", "2024-01-01T01:00:00", "2024-01-01T02:00:00"]
        );
        assert_eq!(buckets[1].key.to_string(), "2024-01-01T01:00:00");
    }

    #[test]
    fn test_hour_rollover_every_24_buckets() {
        let buckets = enumerate(
            &range("2024-01-01T00:00:00", "2024-01-02T01:00:00"),
            Granularity::Hour,
            HourAnchor::StartOfDay,
        );

        assert_eq!(buckets.len(), 26);
        assert_eq!(buckets[23].start.day(), 1);
        assert_eq!(buckets[23].start.hour(), 23);
        assert_eq!(buckets[24].start.day(), 2);
        assert_eq!(buckets[24].start.hour(), 0);
    }

    #[test]
    fn test_hour_walk_crosses_month_end_on_real_calendar() {
        let buckets = enumerate(
            &range("2024-02-28T00:00:00", "2024-03-01T05:00:00"),
            Granularity::Hour,
            HourAnchor::StartOfDay,
        );

        // Feb 29 exists in 2024, so hour 48 lands on March 1st.
        assert_eq!(buckets.len(), 54);
        assert_eq!(buckets[24].label, "2024-02-29T00:00:00");
        assert_eq!(buckets[48].label, "2024-03-01T00:00:00");
        assert_eq!(buckets.last().unwrap().label, "2024-03-01T05:00:00");
    }

    #[test]
    fn test_hour_anchor_selects_walk_origin() {
        let r = range("2024-01-01T10:30:00", "2024-01-01T12:00:00");

        let from_midnight = enumerate(&r, Granularity::Hour, HourAnchor::StartOfDay);
        assert_eq!(labels(&from_midnight), vec!["2024-01-01T00:00:00", "2024-01-01T01:00:00"]);

        let from_hour = enumerate(&r, Granularity::Hour, HourAnchor::StartHour);
        assert_eq!(labels(&from_hour), vec!["2024-01-01T10:00:00", "2024-01-01T11:00:00"]);
    }

    #[test]
    fn test_day_buckets() {
        let buckets = enumerate(
            &range("2024-01-01T00:00:00", "2024-01-03T00:00:00"),
            Granularity::Day,
            HourAnchor::default(),
        );

        assert_eq!(
            labels(&buckets),
            vec!["2024-01-01T00:00:00", "2024-01-02T00:00:00", "2024-01-03T00:00:00"]
        );
        let keys: Vec<String> = buckets.iter().map(|b| b.key.to_string()).collect();
        assert_eq!(keys, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_day_buckets_span_months_and_keep_time_of_day() {
        let buckets = enumerate(
            &range("2023-01-30T08:00:00", "2023-02-02T07:00:00"),
            Granularity::Day,
            HourAnchor::default(),
        );

        // 2 days 23 hours: the trailing partial day adds no bucket
        assert_eq!(
            labels(&buckets),
            vec!["2023-01-30T08:00:00", "2023-01-31T08:00:00", "2023-02-01T08:00:00"]
        );
        assert_eq!(buckets[2].key, BucketKey::DayOfYear(32));
    }

    #[test]
    fn test_month_buckets() {
        let buckets = enumerate(
            &range("2024-01-15T00:00:00", "2024-03-15T00:00:00"),
            Granularity::Month,
            HourAnchor::default(),
        );

        assert_eq!(
            labels(&buckets),
            vec!["2024-01-01T00:00:00", "2024-02-01T00:00:00", "2024-03-01T00:00:00"]
        );
        let keys: Vec<BucketKey> = buckets.iter().map(|b| b.key).collect();
        assert_eq!(keys, vec![BucketKey::Month(1), BucketKey::Month(2), BucketKey::Month(3)]);
    }

    #[test]
    fn test_inverted_range_has_no_buckets() {
        let r = range("2024-01-20T00:00:00", "2024-01-10T00:00:00");
        for granularity in Granularity::ALL {
            assert!(enumerate(&r, granularity, HourAnchor::default()).is_empty());
        }
    }

    #[test]
    fn test_single_instant_range_has_one_bucket() {
        let r = range("2024-05-05T05:05:05", "2024-05-05T05:05:05");
        for granularity in Granularity::ALL {
            assert_eq!(enumerate(&r, granularity, HourAnchor::default()).len(), 1);
        }
    }

    #[test]
    fn test_parse_hour_anchor() {
        assert_eq!("day".parse::<HourAnchor>().unwrap(), HourAnchor::StartOfDay);
        assert_eq!("start_hour".parse::<HourAnchor>().unwrap(), HourAnchor::StartHour);
        assert!("minute".parse::<HourAnchor>().is_err());
    }
}
