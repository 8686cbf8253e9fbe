// Storage seams. The rollup core and the ingest routes only see these traits;
// `SqliteStore` is the production implementation, acquired once at startup.

mod schema;
mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{ConsolidatedRecord, Device, RawSample, StagedSample, StagingCursor};

pub use sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] sqlx::Error),
    #[error("stored timestamp out of range: {0} ms")]
    InvalidTimestamp(i64),
    #[error("device stats column: {0}")]
    StatsColumn(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Append side of the staging buffer (the ingest path).
#[async_trait]
pub trait SampleSink: Send + Sync {
    /// Appends one sample to staging and returns its staged id.
    async fn append_sample(&self, sample: &RawSample) -> Result<i64, StoreError>;
}

/// Last-seen bookkeeping per device, upserted by the ingest path.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn record_stat(
        &self,
        device_id: &str,
        stat: &str,
        value: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn record_firmware(
        &self,
        device_id: &str,
        fw_version: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn get_device(&self, device_id: &str) -> Result<Option<Device>, StoreError>;
}

/// What a rollup pass needs: a full staging scan, append-only history writes,
/// and the two ways of emptying staging.
#[async_trait]
pub trait RollupStore: Send + Sync {
    /// Every staged sample, ascending by id.
    async fn snapshot_staging(&self) -> Result<Vec<StagedSample>, StoreError>;

    async fn insert_consolidated(&self, record: &ConsolidatedRecord) -> Result<(), StoreError>;

    /// Deletes staged rows with `id <= cursor`. Returns rows removed.
    async fn drain_through(&self, cursor: StagingCursor) -> Result<u64, StoreError>;

    /// Deletes every staged row, including ones appended after the last snapshot.
    async fn clear_staging(&self) -> Result<u64, StoreError>;
}

pub(crate) fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::<Utc>::from_timestamp_millis(ms).ok_or(StoreError::InvalidTimestamp(ms))
}
