//! HTTP client for the age, gender and nationality services.
//!
//! One GET per call, no retries at this layer. Transport problems and
//! non-2xx statuses become `Transport`; body shape problems become
//! `MalformedResponse`.

use async_trait::async_trait;
use engine_core::{
    CountryProbability, Dimension, DimensionValue, Error, LookupFailure, LookupOutcome, Result,
};
use serde_json::Value;
use std::time::Instant;
use telemetry::metrics;
use tracing::debug;
use url::Url;

use crate::config::LookupConfig;
use crate::extract::extract;

/// A source of per-dimension values for a name.
///
/// Implemented by `LookupClient` over HTTP; tests substitute stubs.
#[async_trait]
pub trait DimensionLookup: Send + Sync {
    /// Looks up one dimension for `name`. Never panics on bad input.
    async fn lookup(&self, dimension: Dimension, name: &str) -> LookupOutcome<DimensionValue>;
}

/// Resolved endpoints, parsed once at construction.
#[derive(Debug, Clone)]
struct Endpoints {
    age: Url,
    gender: Url,
    nationality: Url,
}

impl Endpoints {
    fn parse(config: &LookupConfig) -> Result<Self> {
        let parse = |dimension: Dimension| {
            let raw = config.url_for(dimension);
            Url::parse(raw).map_err(|e| {
                Error::config(format!("invalid {} lookup url '{}': {}", dimension, raw, e))
            })
        };

        Ok(Self {
            age: parse(Dimension::Age)?,
            gender: parse(Dimension::Gender)?,
            nationality: parse(Dimension::Nationality)?,
        })
    }

    fn get(&self, dimension: Dimension) -> &Url {
        match dimension {
            Dimension::Age => &self.age,
            Dimension::Gender => &self.gender,
            Dimension::Nationality => &self.nationality,
        }
    }
}

/// Lookup client for the three demographic services.
#[derive(Clone)]
pub struct LookupClient {
    http_client: reqwest::Client,
    endpoints: Endpoints,
}

impl LookupClient {
    /// Creates a new lookup client. Fails on an unparsable endpoint URL.
    pub fn new(config: LookupConfig) -> Result<Self> {
        let endpoints = Endpoints::parse(&config)?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoints,
        })
    }

    /// Returns the endpoint used for `dimension`.
    pub fn endpoint(&self, dimension: Dimension) -> &Url {
        self.endpoints.get(dimension)
    }

    pub async fn age(&self, name: &str) -> LookupOutcome<u8> {
        self.lookup(Dimension::Age, name).await?.into_age()
    }

    pub async fn gender(&self, name: &str) -> LookupOutcome<String> {
        self.lookup(Dimension::Gender, name).await?.into_gender()
    }

    pub async fn countries(&self, name: &str) -> LookupOutcome<Vec<CountryProbability>> {
        self.lookup(Dimension::Nationality, name)
            .await?
            .into_countries()
    }

    /// GET `<endpoint>?name=<name>` and decode the body as untyped JSON.
    async fn fetch_json(&self, dimension: Dimension, name: &str) -> LookupOutcome<Value> {
        let url = self.endpoint(dimension);

        debug!(dimension = %dimension, url = %url, name = %name, "Calling lookup service");

        let response = self
            .http_client
            .get(url.clone())
            .query(&[("name", name)])
            .send()
            .await
            .map_err(|e| LookupFailure::transport(format!("{} request failed: {}", dimension, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupFailure::transport(format!(
                "{} service returned {}",
                dimension, status
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                LookupFailure::malformed(format!("{} body is not JSON: {}", dimension, e))
            } else {
                LookupFailure::transport(format!("{} body read failed: {}", dimension, e))
            }
        })
    }
}

#[async_trait]
impl DimensionLookup for LookupClient {
    async fn lookup(&self, dimension: Dimension, name: &str) -> LookupOutcome<DimensionValue> {
        let start = Instant::now();

        let outcome = match self.fetch_json(dimension, name).await {
            Ok(body) => extract(dimension, &body),
            Err(failure) => Err(failure),
        };

        metrics()
            .lookup_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        outcome
    }
}
