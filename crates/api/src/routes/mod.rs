//! API routes.

pub mod health;
pub mod metrics;

use axum::{http::Method, routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Probe routes, mounted under `/health`.
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health_handler))
        .route("/ready", get(health::ready_handler))
        .route("/live", get(health::live_handler))
}

/// Creates the operational router: health probes and the metrics snapshot.
///
/// Read-only; every route answers `GET`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .nest("/health", health_routes())
        .route("/metrics", get(metrics::metrics_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
