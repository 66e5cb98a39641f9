//! Health check handler.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub similarity_threshold: f64,
    pub metric: String,
}

/// Liveness plus the active clustering settings.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let config = state.splitter.config();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        similarity_threshold: config.similarity_threshold,
        metric: config.metric.to_string(),
    })
}
