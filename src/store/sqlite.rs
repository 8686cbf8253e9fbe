// SQLite-backed staging, history and device registry.
// Uses sqlx for async + connection pooling; WAL so ingest writes and the
// rollup's staging scan do not block each other.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::instrument;

use super::{
    DeviceRegistry, RollupStore, SampleSink, StoreError, from_millis, schema, to_millis,
};
use crate::models::{ConsolidatedRecord, Device, RawSample, StagedSample, StagingCursor};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    /// Creates tables and indexes if missing. Safe to call repeatedly.
    pub async fn init(&self) -> anyhow::Result<()> {
        schema::init_tables(&self.pool).await?;
        Ok(())
    }

    /// Waits for checked-out connections and closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Rows currently staged. Inspection helper for tests and tooling; the
    /// rollup itself works from `snapshot_staging`.
    pub async fn staged_count(&self) -> Result<i64, StoreError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM staged_samples")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// Consolidated rows, oldest first, optionally narrowed to one device.
    /// Inspection helper: no route serves history, downstream readers query
    /// the table directly.
    #[instrument(skip(self), fields(repo = "store", operation = "consolidated_history"))]
    pub async fn consolidated_history(
        &self,
        device_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ConsolidatedRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT device_id, stat, timestamp, value, sample_count
             FROM consolidated_history
             WHERE $1 IS NULL OR device_id = $1
             ORDER BY id DESC LIMIT $2",
        )
        .bind(device_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = rows
            .iter()
            .map(Self::parse_record_row)
            .collect::<Result<Vec<_>, _>>()?;
        out.reverse();
        Ok(out)
    }

    fn parse_record_row(row: &SqliteRow) -> Result<ConsolidatedRecord, StoreError> {
        Ok(ConsolidatedRecord {
            device_id: row.try_get("device_id")?,
            stat: row.try_get("stat")?,
            timestamp: from_millis(row.try_get("timestamp")?)?,
            value: row.try_get("value")?,
            sample_count: row.try_get("sample_count")?,
        })
    }

    fn parse_staged_row(row: &SqliteRow) -> Result<StagedSample, StoreError> {
        Ok(StagedSample {
            id: row.try_get("id")?,
            sample: RawSample {
                device_id: row.try_get("device_id")?,
                stat: row.try_get("stat")?,
                value: row.try_get("value")?,
                timestamp: from_millis(row.try_get("timestamp")?)?,
            },
        })
    }
}

#[async_trait]
impl SampleSink for SqliteStore {
    #[instrument(skip(self, sample), fields(repo = "store", operation = "append_sample", device_id = %sample.device_id, stat = %sample.stat))]
    async fn append_sample(&self, sample: &RawSample) -> Result<i64, StoreError> {
        let r = sqlx::query(
            "INSERT INTO staged_samples (device_id, stat, value, timestamp) VALUES ($1, $2, $3, $4)",
        )
        .bind(&sample.device_id)
        .bind(&sample.stat)
        .bind(&sample.value)
        .bind(to_millis(sample.timestamp))
        .execute(&self.pool)
        .await?;
        Ok(r.last_insert_rowid())
    }
}

#[async_trait]
impl DeviceRegistry for SqliteStore {
    #[instrument(skip(self, value), fields(repo = "store", operation = "record_stat"))]
    async fn record_stat(
        &self,
        device_id: &str,
        stat: &str,
        value: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        // One statement, no read-then-write: the stat is merged inside SQLite.
        sqlx::query(
            "INSERT INTO devices (device_id, last_seen, stats) VALUES ($1, $4, json_object($2, $3))
             ON CONFLICT(device_id) DO UPDATE SET
                 last_seen = excluded.last_seen,
                 stats = json_set(devices.stats, '$.' || json_quote($2), $3)",
        )
        .bind(device_id)
        .bind(stat)
        .bind(value)
        .bind(to_millis(seen_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "store", operation = "record_firmware"))]
    async fn record_firmware(
        &self,
        device_id: &str,
        fw_version: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO devices (device_id, last_seen, fw_version) VALUES ($1, $2, $3)
             ON CONFLICT(device_id) DO UPDATE SET last_seen = excluded.last_seen, fw_version = excluded.fw_version",
        )
        .bind(device_id)
        .bind(to_millis(seen_at))
        .bind(fw_version)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "store", operation = "get_device"))]
    async fn get_device(&self, device_id: &str) -> Result<Option<Device>, StoreError> {
        let row = sqlx::query(
            "SELECT device_id, last_seen, fw_version, stats FROM devices WHERE device_id = $1",
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let stats: String = row.try_get("stats")?;
        Ok(Some(Device {
            device_id: row.try_get("device_id")?,
            last_seen: from_millis(row.try_get("last_seen")?)?,
            fw_version: row.try_get("fw_version")?,
            stats: serde_json::from_str(&stats)?,
        }))
    }
}

#[async_trait]
impl RollupStore for SqliteStore {
    #[instrument(skip(self), fields(repo = "store", operation = "snapshot_staging"))]
    async fn snapshot_staging(&self) -> Result<Vec<StagedSample>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, device_id, stat, value, timestamp FROM staged_samples ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::parse_staged_row).collect()
    }

    #[instrument(skip(self, record), fields(repo = "store", operation = "insert_consolidated", device_id = %record.device_id, stat = %record.stat))]
    async fn insert_consolidated(&self, record: &ConsolidatedRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO consolidated_history (device_id, stat, timestamp, value, sample_count)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&record.device_id)
        .bind(&record.stat)
        .bind(to_millis(record.timestamp))
        .bind(&record.value)
        .bind(record.sample_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "store", operation = "drain_through"))]
    async fn drain_through(&self, cursor: StagingCursor) -> Result<u64, StoreError> {
        let r = sqlx::query("DELETE FROM staged_samples WHERE id <= $1")
            .bind(cursor.0)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }

    #[instrument(skip(self), fields(repo = "store", operation = "clear_staging"))]
    async fn clear_staging(&self) -> Result<u64, StoreError> {
        let r = sqlx::query("DELETE FROM staged_samples")
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }
}
