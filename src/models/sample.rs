// Raw samples as appended by the ingest path and read back by the rollup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw telemetry value pushed by a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSample {
    pub device_id: String,
    pub stat: String,
    pub value: String,
    pub timestamp: DateTime<Utc>,
}

impl RawSample {
    pub fn new(
        device_id: impl Into<String>,
        stat: impl Into<String>,
        value: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            stat: stat.into(),
            value: value.into(),
            timestamp,
        }
    }
}

/// A raw sample read back from staging, with its store-assigned id.
/// Ids grow monotonically in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedSample {
    pub id: i64,
    pub sample: RawSample,
}

/// Highest staged id observed by a snapshot. Draining through a cursor removes
/// exactly the rows that snapshot saw, never rows appended after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StagingCursor(pub i64);

impl StagingCursor {
    /// Cursor for a snapshot; `None` when the snapshot was empty.
    pub fn from_snapshot(snapshot: &[StagedSample]) -> Option<Self> {
        snapshot.iter().map(|s| s.id).max().map(StagingCursor)
    }
}
