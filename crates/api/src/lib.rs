//! Operational HTTP surface for the enrichment engine: health probes and
//! the metrics snapshot. The pipeline itself has no HTTP input.

pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
