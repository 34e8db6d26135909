use crate::error::{RollupError, RollupResult};
use crate::query::pipeline::DEFAULT_TIME_FIELD;
use crate::query::AggregationRequest;
use crate::storage::{AggregationRow, AggregationStore, MemoryStore};
use crate::Record;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tracing::info;

/// Record source backed by a JSON-lines file, one `{"dt": ..., "<field>": n}`
/// object per line. The file is read once on open.
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    pub async fn open<P: AsRef<Path>>(path: P, value_field: &str) -> RollupResult<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = async_fs::read_to_string(&path).await?;
        let records = parse_records(&contents, value_field)
            .map_err(|e| RollupError::storage(format!("{}: {}", path.display(), e)))?;

        info!("Loaded {} records from {}", records.len(), path.display());

        Ok(Self {
            path,
            inner: MemoryStore::from_records(records).with_value_field(value_field),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_inner(self) -> MemoryStore {
        self.inner
    }
}

#[async_trait]
impl AggregationStore for FileStore {
    async fn run_aggregation(&self, request: &AggregationRequest) -> RollupResult<Vec<AggregationRow>> {
        self.inner.run_aggregation(request).await
    }
}

/// Parses JSON-lines records. Blank lines are skipped; anything else that
/// is not a record fails with its 1-based line number.
pub fn parse_records(contents: &str, value_field: &str) -> Result<Vec<Record>, String> {
    let mut records = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record = parse_line(line, value_field).map_err(|e| format!("line {}: {}", idx + 1, e))?;
        records.push(record);
    }

    Ok(records)
}

fn parse_line(line: &str, value_field: &str) -> Result<Record, String> {
    let doc: Value = serde_json::from_str(line).map_err(|e| e.to_string())?;

    let dt = doc
        .get(DEFAULT_TIME_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing string field '{}'", DEFAULT_TIME_FIELD))?;
    let dt = dt
        .parse::<NaiveDateTime>()
        .map_err(|e| format!("bad timestamp '{}': {}", dt, e))?;

    let value = doc
        .get(value_field)
        .and_then(Value::as_f64)
        .ok_or_else(|| format!("missing numeric field '{}'", value_field))?;

    Ok(Record::new(dt, value))
}
