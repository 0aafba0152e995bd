//! API response bodies.

use serde::{Deserialize, Serialize};
use telemetry::ComponentHealthReport;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub redpanda_connected: bool,
    pub postgres_connected: bool,
    pub version: String,
    pub uptime_secs: i64,
    pub components: Vec<ComponentHealthReport>,
}
