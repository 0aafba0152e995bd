//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use telemetry::{health, HealthReport};

use crate::response::HealthResponse;
use crate::state::AppState;

/// GET /health - Component report, always 200.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = health();
    let report = registry.report();

    Json(HealthResponse {
        status: report.status.as_str().to_string(),
        redpanda_connected: registry.redpanda.is_healthy(),
        postgres_connected: registry.postgres.is_healthy(),
        version: state.version.to_string(),
        uptime_secs: state.uptime_secs(),
        components: report.components,
    })
}

/// GET /health/ready - 200 once the broker and the database both answer
/// the latest probe, 503 otherwise. The body names the failing component.
pub async fn ready_handler() -> (StatusCode, Json<HealthReport>) {
    let status = match health().is_ready() {
        true => StatusCode::OK,
        false => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(health().report()))
}

/// GET /health/live
pub async fn live_handler() -> StatusCode {
    match health().is_alive() {
        true => StatusCode::OK,
        false => StatusCode::SERVICE_UNAVAILABLE,
    }
}
