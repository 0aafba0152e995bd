//! Redpanda message source for the enrichment engine.
//!
//! One `Consumer` per topic partition; offsets advance only on explicit
//! acknowledgment, which gives at-least-once delivery of person records.

pub mod config;
pub mod consumer;
pub mod health;
pub mod source;

pub use config::*;
pub use consumer::*;
pub use source::*;
