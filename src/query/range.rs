use crate::error::{RollupError, RollupResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Accepted timestamp layout: no timezone, no fractional seconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const TIMESTAMP_LEN: usize = "YYYY-MM-DDTHH:MM:SS".len();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Parses both endpoints. Ordering is not checked here.
    pub fn normalize(from: &str, to: &str) -> RollupResult<Self> {
        Ok(Self {
            start: parse_timestamp(from)?,
            end: parse_timestamp(to)?,
        })
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    /// Half-open membership: `start <= ts < end`.
    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        *ts >= self.start && *ts < self.end
    }

    pub fn ensure_ordered(&self) -> RollupResult<()> {
        if self.is_inverted() {
            return Err(RollupError::RangeInversion {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

pub fn parse_timestamp(raw: &str) -> RollupResult<NaiveDateTime> {
    // chrono tolerates unpadded fields, the wire format does not
    if raw.len() != TIMESTAMP_LEN {
        return Err(RollupError::invalid_input(format!(
            "timestamp '{}' does not match {}",
            raw, TIMESTAMP_FORMAT
        )));
    }

    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|e| {
        RollupError::invalid_input(format!("timestamp '{}' is not valid: {}", raw, e))
    })
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_normalize_valid_range() {
        let range = TimeRange::normalize("2024-01-01T00:00:00", "2024-01-03T12:30:15").unwrap();
        assert_eq!(
            range.start,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(
            range.end,
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap().and_hms_opt(12, 30, 15).unwrap()
        );
        assert!(!range.is_inverted());
    }

    #[test]
    fn test_normalize_rejects_malformed() {
        let cases = [
            "not-a-date",
            "",
            "2024-01-01",
            "2024-01-01 00:00:00",
            "2024-1-1T0:0:0",
            "2024-01-01T00:00:00Z",
            "2024-01-01T00:00:00.123",
            "2024-02-30T00:00:00",
            "2024-01-01T24:00:00",
        ];

        for raw in cases {
            let err = TimeRange::normalize(raw, "2024-01-01T00:00:00").unwrap_err();
            assert!(
                matches!(err, RollupError::InvalidInput { .. }),
                "expected invalid input for {:?}, got {:?}",
                raw,
                err
            );
        }

        assert!(TimeRange::normalize("2024-01-01T00:00:00", "garbage").is_err());
    }

    #[test]
    fn test_inverted_range_is_parsed_but_flagged() {
        let range = TimeRange::normalize("2024-02-01T00:00:00", "2024-01-01T00:00:00").unwrap();
        assert!(range.is_inverted());
        assert!(matches!(
            range.ensure_ordered(),
            Err(RollupError::RangeInversion { .. })
        ));
    }

    #[test]
    fn test_contains_is_half_open() {
        let range = TimeRange::normalize("2024-01-01T00:00:00", "2024-01-01T02:00:00").unwrap();
        assert!(range.contains(&range.start));
        assert!(!range.contains(&range.end));
        assert!(range.contains(&parse_timestamp("2024-01-01T01:59:59").unwrap()));
    }

    #[test]
    fn test_format_round_trips_wire_layout() {
        let raw = "2024-03-09T07:05:00";
        assert_eq!(format_timestamp(&parse_timestamp(raw).unwrap()), raw);
    }
}
