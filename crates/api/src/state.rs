//! Application state shared across handlers.

use chrono::{DateTime, Utc};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Process start time
    pub started_at: DateTime<Utc>,
    pub version: &'static str,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Seconds since the process started.
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
