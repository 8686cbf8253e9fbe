// EMQX rule-engine webhooks. Thin pass-through writes: no payload validation,
// no dedup, no backpressure.

use axum::{Json, extract::State};
use chrono::Utc;

use super::{ApiError, AppState};
use crate::models::{BridgeMessage, RawSample};

/// POST /emqx/ingest: refresh the device's last value, then stage the sample.
pub(super) async fn ingest_handler(
    State(state): State<AppState>,
    Json(msg): Json<BridgeMessage>,
) -> Result<&'static str, ApiError> {
    let received_at = Utc::now();
    let sample = RawSample::new(msg.device_id(), msg.stat(), msg.payload.as_str(), received_at);

    // Registry first: its upsert is idempotent, the staging append is not.
    state
        .devices
        .record_stat(&sample.device_id, &sample.stat, &sample.value, received_at)
        .await?;
    state.sink.append_sample(&sample).await?;

    tracing::debug!(
        device_id = %sample.device_id,
        stat = %sample.stat,
        value = %sample.value,
        "sample received"
    );
    Ok("OK")
}

/// POST /emqx/firmware: record the firmware version a device reports.
pub(super) async fn firmware_handler(
    State(state): State<AppState>,
    Json(msg): Json<BridgeMessage>,
) -> Result<&'static str, ApiError> {
    state
        .devices
        .record_firmware(msg.device_id(), &msg.payload, Utc::now())
        .await?;
    tracing::info!(device_id = %msg.clientid, fw_version = %msg.payload, "firmware version received");
    Ok("OK")
}
