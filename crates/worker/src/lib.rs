//! Workers for the enrichment engine.
//!
//! - Enricher (three lookups joined, per-dimension degradation)
//! - Cache (best-effort name -> fragment memo)
//! - Consumer (Redpanda -> enrich -> Postgres -> ack, one loop per partition)
//! - Scheduler (ingestion loops plus metrics and health housekeeping)

pub mod cache;
pub mod consumer;
pub mod enrichment;
pub mod scheduler;

pub use cache::*;
pub use consumer::*;
pub use enrichment::Enricher;
pub use scheduler::*;
