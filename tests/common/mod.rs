// Shared test helpers

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;
use tokio::sync::Notify;

use telemetry_rollup::models::{ConsolidatedRecord, RawSample, StagedSample, StagingCursor};
use telemetry_rollup::store::{RollupStore, SampleSink, SqliteStore, StoreError};

/// Fixed pass time: 2026-10-18T12:34:56.789Z.
pub fn pass_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 34, 56).unwrap() + chrono::TimeDelta::milliseconds(789)
}

/// `pass_time()` floored to the minute.
pub fn pass_bucket() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 34, 0).unwrap()
}

/// Sample stamped `offset_secs` after 2026-10-18T12:30:00Z.
pub fn sample(device_id: &str, stat: &str, value: &str, offset_secs: i64) -> RawSample {
    let base = Utc.with_ymd_and_hms(2026, 10, 18, 12, 30, 0).unwrap();
    RawSample::new(
        device_id,
        stat,
        value,
        base + chrono::TimeDelta::seconds(offset_secs),
    )
}

/// Wraps samples as a snapshot with ids 1..=n in the given order.
pub fn staged(samples: Vec<RawSample>) -> Vec<StagedSample> {
    samples
        .into_iter()
        .enumerate()
        .map(|(i, sample)| StagedSample {
            id: i as i64 + 1,
            sample,
        })
        .collect()
}

pub async fn temp_store() -> (TempDir, Arc<SqliteStore>) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("telemetry.db");
    let store = SqliteStore::connect(path.to_str().unwrap(), 4)
        .await
        .unwrap();
    store.init().await.unwrap();
    (dir, Arc::new(store))
}

pub async fn append_all(store: &SqliteStore, samples: &[RawSample]) {
    for s in samples {
        store.append_sample(s).await.unwrap();
    }
}

/// `RollupStore` over a real SQLite store with injectable faults and hooks.
pub struct FaultyStore {
    pub inner: Arc<SqliteStore>,
    /// Fail the insert with this 0-based call index (once).
    pub fail_insert_at: Mutex<Option<usize>>,
    pub fail_snapshot: Mutex<bool>,
    pub fail_drain: Mutex<bool>,
    /// Appended to staging right after the snapshot is read.
    pub append_after_snapshot: Mutex<Option<RawSample>>,
    /// When set, snapshot waits for a notification before reading.
    pub snapshot_gate: Option<Arc<Notify>>,
    pub inserts_seen: AtomicUsize,
    pub snapshots_taken: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: Arc<SqliteStore>) -> Self {
        Self {
            inner,
            fail_insert_at: Mutex::new(None),
            fail_snapshot: Mutex::new(false),
            fail_drain: Mutex::new(false),
            append_after_snapshot: Mutex::new(None),
            snapshot_gate: None,
            inserts_seen: AtomicUsize::new(0),
            snapshots_taken: AtomicUsize::new(0),
        }
    }

    pub fn failing_insert_at(self, index: usize) -> Self {
        *self.fail_insert_at.lock().unwrap() = Some(index);
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.snapshot_gate = Some(gate);
        self
    }
}

#[async_trait]
impl RollupStore for FaultyStore {
    async fn snapshot_staging(&self) -> Result<Vec<StagedSample>, StoreError> {
        self.snapshots_taken.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.snapshot_gate {
            gate.notified().await;
        }
        let fail = *self.fail_snapshot.lock().unwrap();
        if fail {
            return Err(StoreError::Unavailable("snapshot".into()));
        }
        let snapshot = self.inner.snapshot_staging().await?;
        let late = self.append_after_snapshot.lock().unwrap().take();
        if let Some(late) = late {
            self.inner.append_sample(&late).await?;
        }
        Ok(snapshot)
    }

    async fn insert_consolidated(&self, record: &ConsolidatedRecord) -> Result<(), StoreError> {
        let seen = self.inserts_seen.fetch_add(1, Ordering::SeqCst);
        let fail = {
            let mut fail_at = self.fail_insert_at.lock().unwrap();
            fail_at.take_if(|at| *at == seen).is_some()
        };
        if fail {
            return Err(StoreError::Unavailable(format!("insert #{}", seen)));
        }
        self.inner.insert_consolidated(record).await
    }

    async fn drain_through(&self, cursor: StagingCursor) -> Result<u64, StoreError> {
        let fail = *self.fail_drain.lock().unwrap();
        if fail {
            return Err(StoreError::Unavailable("drain".into()));
        }
        self.inner.drain_through(cursor).await
    }

    async fn clear_staging(&self) -> Result<u64, StoreError> {
        let fail = *self.fail_drain.lock().unwrap();
        if fail {
            return Err(StoreError::Unavailable("clear".into()));
        }
        self.inner.clear_staging().await
    }
}
