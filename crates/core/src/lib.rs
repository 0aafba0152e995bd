//! Core types, errors, and validation for the person enrichment engine.

pub mod error;
pub mod lookup;
pub mod person;

pub use error::{Error, ErrorCode, Result};
pub use lookup::*;
pub use person::*;
