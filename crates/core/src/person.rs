//! Person records flowing through the pipeline.
//!
//! A `RawPersonRecord` arrives on the message stream, the enricher turns it
//! into an `EnrichedPersonRecord`, and the store persists that exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result};
use crate::lookup::Dimension;

/// Person identity as delivered by the upstream stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RawPersonRecord {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "surname must not be empty"))]
    pub surname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patronymic: Option<String>,
}

impl RawPersonRecord {
    pub fn new(name: impl Into<String>, surname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            patronymic: None,
        }
    }

    pub fn with_patronymic(mut self, patronymic: impl Into<String>) -> Self {
        self.patronymic = Some(patronymic.into());
        self
    }

    /// Decodes and validates a delivery payload.
    ///
    /// Any failure is `MalformedDelivery`; the payload is never partially accepted.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let record: RawPersonRecord = serde_json::from_slice(payload)
            .map_err(|e| Error::malformed_delivery(format!("invalid JSON: {}", e)))?;

        record
            .validate()
            .map_err(|e| Error::malformed_delivery(e.to_string()))?;

        Ok(record)
    }
}

/// Dimension values for one name, as produced by the lookups or the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentFragment {
    pub age: Option<u8>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
}

impl EnrichmentFragment {
    /// True when every dimension has a value.
    pub fn is_complete(&self) -> bool {
        self.missing_dimensions().is_empty()
    }

    pub fn missing_dimensions(&self) -> Vec<Dimension> {
        let mut missing = Vec::new();
        if self.age.is_none() {
            missing.push(Dimension::Age);
        }
        if self.gender.is_none() {
            missing.push(Dimension::Gender);
        }
        if self.nationality.is_none() {
            missing.push(Dimension::Nationality);
        }
        missing
    }
}

/// A person record augmented with demographic attributes.
///
/// `None` on a dimension means its lookup failed (a degraded record), which is
/// distinct from any value the service itself returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPersonRecord {
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub age: Option<u8>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub enriched_at: DateTime<Utc>,
}

impl EnrichedPersonRecord {
    /// Combines identity fields with the enrichment result.
    pub fn from_parts(
        raw: RawPersonRecord,
        fragment: EnrichmentFragment,
        enriched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: raw.name,
            surname: raw.surname,
            patronymic: raw.patronymic,
            age: fragment.age,
            gender: fragment.gender,
            nationality: fragment.nationality,
            enriched_at,
        }
    }

    pub fn fragment(&self) -> EnrichmentFragment {
        EnrichmentFragment {
            age: self.age,
            gender: self.gender.clone(),
            nationality: self.nationality.clone(),
        }
    }

    /// True when one or more dimensions are absent.
    pub fn is_degraded(&self) -> bool {
        !self.fragment().is_complete()
    }
}
