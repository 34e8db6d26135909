use crate::query::buckets::Bucket;
use crate::storage::AggregationRow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dense, index-aligned output: `dataset[i]` is the total for `labels[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub dataset: Vec<f64>,
    pub labels: Vec<String>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.dataset.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels.iter().map(String::as_str).zip(self.dataset.iter().copied())
    }
}

/// Merges sparse store rows onto the full bucket list. Buckets the store
/// did not report are zero.
pub fn reconcile(rows: &[AggregationRow], buckets: &[Bucket]) -> Series {
    let totals: HashMap<&str, f64> = rows
        .iter()
        .map(|row| (row.key.as_str(), row.total))
        .collect();

    let mut series = Series {
        dataset: Vec::with_capacity(buckets.len()),
        labels: Vec::with_capacity(buckets.len()),
    };

    for bucket in buckets {
        let key = bucket.key.to_string();
        series.dataset.push(totals.get(key.as_str()).copied().unwrap_or(0.0));
        series.labels.push(bucket.label.clone());
    }

    debug_assert_eq!(series.dataset.len(), series.labels.len());
    series
}
