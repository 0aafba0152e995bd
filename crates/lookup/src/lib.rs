//! Demographic lookups for the enrichment engine.
//!
//! One HTTP GET per dimension against a configured endpoint, a typed decode
//! of the JSON body, and the nationality resolver that picks a single country
//! from the nationality candidates.

pub mod client;
pub mod config;
pub mod extract;
pub mod resolver;

pub use client::*;
pub use config::*;
pub use resolver::resolve;
