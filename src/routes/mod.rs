// HTTP routes: EMQX bridge webhooks plus small read-only endpoints.

mod error;
mod http;
mod ingest;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::store::{DeviceRegistry, SampleSink};

pub use error::ApiError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) sink: Arc<dyn SampleSink>,
    pub(crate) devices: Arc<dyn DeviceRegistry>,
}

pub fn app(sink: Arc<dyn SampleSink>, devices: Arc<dyn DeviceRegistry>) -> Router {
    let state = AppState { sink, devices };
    Router::new()
        .route("/", get(|| async { "telemetry-rollup" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/health", get(http::health_handler)) // GET /health
        .route("/emqx/ingest", post(ingest::ingest_handler)) // POST /emqx/ingest
        .route("/emqx/firmware", post(ingest::firmware_handler)) // POST /emqx/firmware
        .route("/api/devices/{device_id}", get(http::device_handler)) // GET /api/devices/:id
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
