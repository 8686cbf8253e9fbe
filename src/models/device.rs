// Device registry row: last contact, firmware, and the last raw value per stat.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
    pub last_seen: DateTime<Utc>,
    pub fw_version: Option<String>,
    pub stats: BTreeMap<String, String>,
}
