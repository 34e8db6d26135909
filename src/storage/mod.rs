pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::RollupResult;
use crate::query::AggregationRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One sparse result row: a stringified bucket key and its summed total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRow {
    pub key: String,
    pub total: f64,
}

impl AggregationRow {
    pub fn new(key: impl Into<String>, total: f64) -> Self {
        Self {
            key: key.into(),
            total,
        }
    }
}

/// Executes an aggregation request against some record source.
#[async_trait]
pub trait AggregationStore: Send + Sync {
    async fn run_aggregation(&self, request: &AggregationRequest) -> RollupResult<Vec<AggregationRow>>;
}
