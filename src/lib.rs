pub mod error;
pub mod query;
pub mod storage;

use chrono::NaiveDateTime;
use error::{RollupError, RollupResult};
use query::pipeline::DEFAULT_SUM_FIELD;
use query::{enumerate, reconcile, AggregationRequest, Bucket, CumulativeRequest, Granularity, HourAnchor, Series, TimeRange};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::AggregationStore;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub dt: NaiveDateTime,
    pub value: f64,
}

impl Record {
    pub fn new(dt: NaiveDateTime, value: f64) -> Self {
        Self { dt, value }
    }
}

#[derive(Debug, Clone)]
pub struct RollupConfig {
    pub bind_address: String,
    pub data_file: Option<String>,
    pub sum_field: String,
    pub hour_anchor: HourAnchor,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            data_file: None,
            sum_field: DEFAULT_SUM_FIELD.to_string(),
            hour_anchor: HourAnchor::StartOfDay,
        }
    }
}

impl RollupConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(bind_addr) = std::env::var("BIND_ADDRESS") {
            config.bind_address = bind_addr;
        }

        if let Ok(data_file) = std::env::var("DATA_FILE") {
            if !data_file.trim().is_empty() {
                config.data_file = Some(data_file);
            }
        }

        if let Ok(sum_field) = std::env::var("SUM_FIELD") {
            if !sum_field.trim().is_empty() {
                config.sum_field = sum_field.trim().to_string();
            }
        }

        if let Ok(anchor) = std::env::var("HOUR_ANCHOR") {
            config.hour_anchor = anchor.parse().unwrap_or_default();
        }

        config
    }
}

/// Everything derived from a request before the store is consulted.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub granularity: Granularity,
    pub buckets: Vec<Bucket>,
    pub aggregation: AggregationRequest,
}

/// Builds dense cumulative series over an injected aggregation store.
#[derive(Clone)]
pub struct Rollup {
    config: RollupConfig,
    store: Arc<dyn AggregationStore>,
}

impl Rollup {
    pub fn new(config: RollupConfig, store: Arc<dyn AggregationStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &RollupConfig {
        &self.config
    }

    /// Validates the request and derives the bucket list and store request.
    /// Fails before any storage access.
    pub fn plan(&self, request: &CumulativeRequest) -> RollupResult<QueryPlan> {
        let granularity: Granularity = required(&request.group_type, "group_type")?.parse()?;
        let range = TimeRange::normalize(
            required(&request.dt_from, "dt_from")?,
            required(&request.dt_upto, "dt_upto")?,
        )?;

        if let Err(e) = range.ensure_ordered() {
            warn!("Rejecting request: {}", e);
            return Err(e);
        }

        let buckets = enumerate(&range, granularity, self.config.hour_anchor);
        let aggregation = AggregationRequest::build(range, granularity, &self.config.sum_field);

        debug!(
            "Planned {} {} buckets for {}..{}",
            buckets.len(),
            granularity,
            range.start,
            range.end
        );

        Ok(QueryPlan {
            granularity,
            buckets,
            aggregation,
        })
    }

    /// Runs the single store aggregation for `request` and zero-fills the
    /// result over every expected bucket.
    pub async fn cumulative(&self, request: &CumulativeRequest) -> RollupResult<Series> {
        let plan = self.plan(request)?;
        let rows = self.store.run_aggregation(&plan.aggregation).await?;
        debug!("Store returned {} rows", rows.len());

        Ok(reconcile(&rows, &plan.buckets))
    }
}

fn required<'a>(field: &'a Option<String>, name: &str) -> RollupResult<&'a str> {
    field
        .as_deref()
        .ok_or_else(|| RollupError::invalid_input(format!("missing field '{}'", name)))
}
