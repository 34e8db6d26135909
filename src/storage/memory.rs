use crate::error::{RollupError, RollupResult};
use crate::query::{AggregationRequest, BucketKey, SortOrder};
use crate::query::pipeline::{DEFAULT_SUM_FIELD, DEFAULT_TIME_FIELD};
use crate::storage::{AggregationRow, AggregationStore};
use crate::Record;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Records kept in timestamp order. Several records may share a timestamp.
pub struct MemoryStore {
    records: RwLock<BTreeMap<NaiveDateTime, Vec<f64>>>,
    value_field: String,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut map: BTreeMap<NaiveDateTime, Vec<f64>> = BTreeMap::new();
        for record in records {
            map.entry(record.dt).or_default().push(record.value);
        }

        Self {
            records: RwLock::new(map),
            value_field: DEFAULT_SUM_FIELD.to_string(),
        }
    }

    /// Names the numeric field this store's values answer to.
    pub fn with_value_field(mut self, value_field: &str) -> Self {
        self.value_field = value_field.to_string();
        self
    }

    pub fn value_field(&self) -> &str {
        &self.value_field
    }

    pub async fn insert(&self, record: Record) {
        let mut records = self.records.write().await;
        records.entry(record.dt).or_default().push(record.value);
    }

    pub async fn insert_batch(&self, batch: impl IntoIterator<Item = Record>) -> usize {
        let mut records = self.records.write().await;
        let mut inserted = 0;
        for record in batch {
            records.entry(record.dt).or_default().push(record.value);
            inserted += 1;
        }
        inserted
    }

    pub async fn len(&self) -> usize {
        let records = self.records.read().await;
        records.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_fields(&self, request: &AggregationRequest) -> RollupResult<()> {
        if request.time_field != DEFAULT_TIME_FIELD {
            return Err(RollupError::storage(format!(
                "unknown time field '{}'",
                request.time_field
            )));
        }
        if request.sum_field != self.value_field {
            return Err(RollupError::storage(format!(
                "unknown sum field '{}', store holds '{}'",
                request.sum_field, self.value_field
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl AggregationStore for MemoryStore {
    async fn run_aggregation(&self, request: &AggregationRequest) -> RollupResult<Vec<AggregationRow>> {
        self.check_fields(request)?;

        if request.range.is_inverted() {
            return Ok(Vec::new());
        }

        let records = self.records.read().await;
        let mut totals: BTreeMap<BucketKey, f64> = BTreeMap::new();
        let mut matched = 0usize;

        for (ts, values) in records.range(request.range.start..request.range.end) {
            *totals.entry(request.group_key.extract(ts)).or_insert(0.0) += values.iter().sum::<f64>();
            matched += values.len();
        }

        debug!(
            "Aggregated {} records into {} buckets by {:?}",
            matched,
            totals.len(),
            request.group_key
        );

        let rows = totals
            .into_iter()
            .map(|(key, total)| AggregationRow::new(key.to_string(), total));

        Ok(match request.sort {
            SortOrder::Ascending => rows.collect(),
            SortOrder::Descending => rows.rev().collect(),
        })
    }
}
