//! Telemetry for the enrichment engine.
//!
//! Metrics and health live in process; the metrics snapshot is logged
//! periodically by the worker scheduler and served by the operational API.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
