//! # Health Check Handler

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::execution::WorkerPoolStats;
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub environment: String,
    pub uptime_seconds: u64,
    pub worker_pool: WorkerPoolStats,
}

/// Basic health check endpoint: GET /health
///
/// Reports worker pool utilisation alongside liveness.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let pool = state.pool();
    let status = if pool.is_closed() { "degraded" } else { "healthy" };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.environment().to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        worker_pool: pool.stats(),
    })
}
