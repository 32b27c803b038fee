//! Health check endpoint for monitoring

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub open_proposals: usize,
}

/// Health check handler
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "sentinel-orchestrator".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        open_proposals: state.collector.open_count(),
    })
}
