// EMQX rule-engine webhook body. Only the fields the bridge uses are typed;
// the rest (username, timestamp, qos, ...) are ignored on deserialize.
// Samples are stamped on arrival, not with the broker timestamp.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeMessage {
    pub clientid: String,
    pub topic: String,
    pub payload: String,
}

impl BridgeMessage {
    /// Stat name: the last `/` segment of the topic (`devices/abc/temp` -> `temp`).
    pub fn stat(&self) -> &str {
        self.topic.rsplit('/').next().unwrap_or(&self.topic)
    }

    pub fn device_id(&self) -> &str {
        &self.clientid
    }
}
