use crate::query::granularity::{BucketKey, Granularity};
use crate::query::range::{format_timestamp, TimeRange};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_TIME_FIELD: &str = "dt";
pub const DEFAULT_SUM_FIELD: &str = "value";

/// Grouping primitive the store applies to each record's timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKey {
    Hour,
    DayOfYear,
    Month,
}

impl GroupKey {
    pub fn for_granularity(granularity: Granularity) -> Self {
        match granularity {
            Granularity::Hour => GroupKey::Hour,
            Granularity::Day => GroupKey::DayOfYear,
            Granularity::Month => GroupKey::Month,
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            GroupKey::Hour => Granularity::Hour,
            GroupKey::DayOfYear => Granularity::Day,
            GroupKey::Month => Granularity::Month,
        }
    }

    pub fn operator(&self) -> &'static str {
        match self {
            GroupKey::Hour => "$dateTrunc",
            GroupKey::DayOfYear => "$dayOfYear",
            GroupKey::Month => "$month",
        }
    }

    pub fn extract(&self, ts: &NaiveDateTime) -> BucketKey {
        self.granularity().key_for(ts)
    }

    fn expression(&self, time_field: &str) -> Value {
        let field = format!("${}", time_field);
        match self {
            GroupKey::Hour => json!({ "$dateTrunc": { "date": field, "unit": "hour" } }),
            other => json!({ other.operator(): field }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_i32(&self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

/// Storage-agnostic "filter, group by bucket, sum, sort" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationRequest {
    pub range: TimeRange,
    pub group_key: GroupKey,
    pub time_field: String,
    pub sum_field: String,
    pub sort: SortOrder,
}

impl AggregationRequest {
    pub fn build(range: TimeRange, granularity: Granularity, sum_field: &str) -> Self {
        Self {
            range,
            group_key: GroupKey::for_granularity(granularity),
            time_field: DEFAULT_TIME_FIELD.to_string(),
            sum_field: sum_field.to_string(),
            sort: SortOrder::Ascending,
        }
    }

    /// Renders the request as a `$match` / `$group` / `$sort` pipeline.
    /// The upper bound is exclusive.
    pub fn to_pipeline(&self) -> Value {
        json!([
            {
                "$match": {
                    self.time_field.as_str(): {
                        "$gte": format_timestamp(&self.range.start),
                        "$lt": format_timestamp(&self.range.end),
                    }
                }
            },
            {
                "$group": {
                    "_id": self.group_key.expression(&self.time_field),
                    "total": { "$sum": format!("${}", self.sum_field) },
                }
            },
            { "$sort": { "_id": self.sort.as_i32() } }
        ])
    }
}
