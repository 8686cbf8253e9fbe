// One consolidated history row per (device_id, stat) per rollup pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable output of a pass. `timestamp` is the pass start floored to the
/// minute, shared by every record of the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedRecord {
    pub device_id: String,
    pub stat: String,
    pub timestamp: DateTime<Utc>,
    pub value: String,
    pub sample_count: u32,
}
