//! Lookup dimensions and per-dimension outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::error::ErrorCode;

/// One of the three enrichment attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Age,
    Gender,
    Nationality,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Nationality => "nationality",
        }
    }

    /// JSON key holding the value in the lookup service response.
    pub fn response_key(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Nationality => "country",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single lookup produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupFailure {
    /// Connection refused, timeout, or non-2xx status.
    #[error("[LOOKUP_001] transport error: {0}")]
    Transport(String),

    /// Missing key, wrong type, or out-of-range value.
    #[error("[LOOKUP_002] malformed response: {0}")]
    MalformedResponse(String),

    /// Nationality lookup returned no countries.
    #[error("[LOOKUP_003] no nationality candidate")]
    NoCandidate,
}

impl LookupFailure {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Transport(_) => ErrorCode::Transport,
            Self::MalformedResponse(_) => ErrorCode::MalformedResponse,
            Self::NoCandidate => ErrorCode::NoCandidate,
        }
    }
}

/// Tagged result of one lookup: `Ok(value)` or `Err(reason)`.
pub type LookupOutcome<T> = std::result::Result<T, LookupFailure>;

/// One candidate from the nationality service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProbability {
    pub country_id: String,
    pub probability: f64,
}

impl CountryProbability {
    pub fn new(country_id: impl Into<String>, probability: f64) -> Self {
        Self {
            country_id: country_id.into(),
            probability,
        }
    }
}

/// Typed value extracted for one dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionValue {
    Age(u8),
    Gender(String),
    Nationality(Vec<CountryProbability>),
}

impl DimensionValue {
    pub fn dimension(&self) -> Dimension {
        match self {
            Self::Age(_) => Dimension::Age,
            Self::Gender(_) => Dimension::Gender,
            Self::Nationality(_) => Dimension::Nationality,
        }
    }

    pub fn into_age(self) -> LookupOutcome<u8> {
        match self {
            Self::Age(age) => Ok(age),
            other => Err(mismatch(Dimension::Age, other.dimension())),
        }
    }

    pub fn into_gender(self) -> LookupOutcome<String> {
        match self {
            Self::Gender(gender) => Ok(gender),
            other => Err(mismatch(Dimension::Gender, other.dimension())),
        }
    }

    pub fn into_countries(self) -> LookupOutcome<Vec<CountryProbability>> {
        match self {
            Self::Nationality(countries) => Ok(countries),
            other => Err(mismatch(Dimension::Nationality, other.dimension())),
        }
    }
}

fn mismatch(expected: Dimension, got: Dimension) -> LookupFailure {
    LookupFailure::malformed(format!("expected {} value, got {}", expected, got))
}
