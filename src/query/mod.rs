pub mod buckets;
pub mod granularity;
pub mod pipeline;
pub mod range;
pub mod reconcile;

pub use buckets::{enumerate, Bucket, HourAnchor};
pub use granularity::{BucketKey, Granularity};
pub use pipeline::{AggregationRequest, GroupKey, SortOrder};
pub use range::TimeRange;
pub use reconcile::{reconcile, Series};

use serde::{Deserialize, Serialize};

/// Wire shape of a cumulative-series request. Fields stay optional so a
/// missing field surfaces as invalid input rather than a decode error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeRequest {
    pub dt_from: Option<String>,
    pub dt_upto: Option<String>,
    pub group_type: Option<String>,
}

impl CumulativeRequest {
    pub fn new(dt_from: &str, dt_upto: &str, group_type: &str) -> Self {
        Self {
            dt_from: Some(dt_from.to_string()),
            dt_upto: Some(dt_upto.to_string()),
            group_type: Some(group_type.to_string()),
        }
    }
}
