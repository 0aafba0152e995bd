//! Unified error types for the enrichment engine.
//!
//! Error codes:
//! - LOOKUP_001-003: Lookup failures (absorbed per dimension, never fatal)
//! - DB_001: Storage failure after retries
//! - INGEST_001: Malformed delivery payload
//! - CONFIG_001: Invalid configuration

use thiserror::Error;

use crate::lookup::LookupFailure;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error codes, logged as a structured field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// LOOKUP_001: Network error, timeout or non-2xx status
    Transport,
    /// LOOKUP_002: Response body does not match the expected shape
    MalformedResponse,
    /// LOOKUP_003: Empty nationality candidate set
    NoCandidate,
    /// DB_001: Failed to store an enriched record
    StoreFailed,
    /// INGEST_001: Delivery payload could not be decoded or validated
    MalformedDelivery,
    /// CONFIG_001: Invalid configuration value
    InvalidConfig,
    /// INTERNAL_001: Anything else
    Internal,
}

impl ErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport => "LOOKUP_001",
            Self::MalformedResponse => "LOOKUP_002",
            Self::NoCandidate => "LOOKUP_003",
            Self::StoreFailed => "DB_001",
            Self::MalformedDelivery => "INGEST_001",
            Self::InvalidConfig => "CONFIG_001",
            Self::Internal => "INTERNAL_001",
        }
    }
}

/// Unified error type for the enrichment engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupFailure),

    /// Storage write failed; `attempts` counts every try including the first.
    #[error("[DB_001] storage failed after {attempts} attempt(s): {message}")]
    Storage { attempts: u32, message: String },

    #[error("[INGEST_001] malformed delivery: {0}")]
    MalformedDelivery(String),

    #[error("[CONFIG_001] invalid configuration: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a storage error.
    pub fn storage(attempts: u32, msg: impl Into<String>) -> Self {
        Self::Storage {
            attempts,
            message: msg.into(),
        }
    }

    pub fn malformed_delivery(msg: impl Into<String>) -> Self {
        Self::MalformedDelivery(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Lookup(failure) => failure.error_code(),
            Self::Storage { .. } => ErrorCode::StoreFailed,
            Self::MalformedDelivery(_) => ErrorCode::MalformedDelivery,
            Self::Config(_) => ErrorCode::InvalidConfig,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Whether a retry of the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Internal(_) | Self::Lookup(LookupFailure::Transport(_))
        )
    }
}
