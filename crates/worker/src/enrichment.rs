//! Person enrichment.
//!
//! Runs the age, gender and nationality lookups for a name concurrently,
//! each bounded by a timeout, and folds their outcomes into one record.
//! A failed dimension is left absent; enrichment itself never fails.

use chrono::Utc;
use engine_core::{
    Dimension, DimensionValue, EnrichedPersonRecord, EnrichmentFragment, LookupFailure,
    LookupOutcome, RawPersonRecord,
};
use lookup_client::{resolve, DimensionLookup};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tracing::debug;

use crate::cache::EnrichmentCache;

/// Enriches raw person records via the lookup services.
pub struct Enricher {
    lookups: Arc<dyn DimensionLookup>,
    cache: Option<Arc<dyn EnrichmentCache>>,
    timeout: Duration,
}

impl Enricher {
    /// Creates an enricher; `timeout` bounds each individual lookup.
    pub fn new(lookups: Arc<dyn DimensionLookup>, timeout: Duration) -> Self {
        Self {
            lookups,
            cache: None,
            timeout,
        }
    }

    /// Adds a cache consulted before the lookups.
    pub fn with_cache(mut self, cache: Arc<dyn EnrichmentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Enriches one record. Identity fields are carried over unchanged.
    pub async fn enrich(&self, record: RawPersonRecord) -> EnrichedPersonRecord {
        let start = Instant::now();

        let fragment = match self.cached(&record.name).await {
            Some(fragment) => fragment,
            None => {
                let fragment = self.fan_out(&record.name).await;
                // Only complete results are memoized, so a degraded one is retried next time.
                if fragment.is_complete() {
                    if let Some(cache) = &self.cache {
                        cache.set(&record.name, fragment.clone()).await;
                    }
                }
                fragment
            }
        };

        let enriched = EnrichedPersonRecord::from_parts(record, fragment, Utc::now());

        metrics().records_enriched.inc();
        if enriched.is_degraded() {
            metrics().records_degraded.inc();
        }
        metrics()
            .enrich_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        enriched
    }

    async fn cached(&self, name: &str) -> Option<EnrichmentFragment> {
        let cache = self.cache.as_ref()?;
        match cache.get(name).await {
            Some(fragment) => {
                metrics().cache_hits.inc();
                debug!(name = %name, "Enrichment cache hit");
                Some(fragment)
            }
            None => {
                metrics().cache_misses.inc();
                None
            }
        }
    }

    async fn fan_out(&self, name: &str) -> EnrichmentFragment {
        let (age, gender, nationality) = tokio::join!(
            self.bounded(Dimension::Age, name),
            self.bounded(Dimension::Gender, name),
            self.bounded(Dimension::Nationality, name),
        );

        let age = age.and_then(DimensionValue::into_age);
        let gender = gender.and_then(DimensionValue::into_gender);
        let nationality = nationality
            .and_then(DimensionValue::into_countries)
            .and_then(|countries| resolve(&countries));

        EnrichmentFragment {
            age: absorb(Dimension::Age, name, age),
            gender: absorb(Dimension::Gender, name, gender),
            nationality: absorb(Dimension::Nationality, name, nationality),
        }
    }

    async fn bounded(&self, dimension: Dimension, name: &str) -> LookupOutcome<DimensionValue> {
        match tokio::time::timeout(self.timeout, self.lookups.lookup(dimension, name)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(LookupFailure::transport(format!(
                "{} lookup timed out after {}ms",
                dimension,
                self.timeout.as_millis()
            ))),
        }
    }
}

/// Turns a failed outcome into an absent field.
fn absorb<T>(dimension: Dimension, name: &str, outcome: LookupOutcome<T>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(failure) => {
            debug!(
                dimension = %dimension,
                name = %name,
                error_code = failure.error_code().code(),
                error = %failure,
                "Lookup failed, leaving dimension absent"
            );
            let failures = match dimension {
                Dimension::Age => &metrics().age_lookup_failures,
                Dimension::Gender => &metrics().gender_lookup_failures,
                Dimension::Nationality => &metrics().nationality_lookup_failures,
            };
            failures.inc();
            None
        }
    }
}
