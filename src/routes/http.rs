// GET handlers: version, health, device registry lookup

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use super::{AppState, ApiError};
use crate::models::Device;

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(super) async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/devices/{device_id}: last-seen time, firmware and last value per stat.
pub(super) async fn device_handler(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<Device>, ApiError> {
    state
        .devices
        .get_device(&device_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("device {}", device_id)))
}
