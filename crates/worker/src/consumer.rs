//! Ingestion worker: reads person records from a partition, enriches them
//! and persists them to Postgres.
//!
//! Before the first fetch the worker makes sure the table exists and resumes
//! the partition after the last offset already stored.
//!
//! Per delivery:
//! 1. Decode and validate the payload (malformed payloads are logged and acknowledged)
//! 2. Enrich the record
//! 3. Insert it with retries
//! 4. Acknowledge only after the insert succeeded (at-least-once delivery)
//!
//! When the retries run out the delivery stays unacknowledged, the batch
//! stops there and the next fetch delivers it again.

use engine_core::{EnrichedPersonRecord, Error, Result};
use postgres_store::{PersistedPerson, PersonStore};
use redpanda::{Delivery, RecordSource};
use std::sync::Arc;
use std::time::Duration;
use telemetry::metrics;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::enrichment::Enricher;

/// Ingestion worker configuration.
#[derive(Debug, Clone)]
pub struct IngestionWorkerConfig {
    /// Maximum retries for a failed insert
    pub max_retries: u32,
    /// Base backoff between retries, multiplied by the attempt number
    pub retry_backoff: Duration,
    /// Pause after a fetch error or a stalled delivery
    pub error_pause: Duration,
}

impl Default for IngestionWorkerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff: Duration::from_millis(100),
            error_pause: Duration::from_secs(1),
        }
    }
}

/// What happened to a single delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Persisted and acknowledged.
    Acknowledged {
        id: Uuid,
        /// False when the row already existed from an earlier delivery
        inserted: bool,
        degraded: bool,
    },
    /// Payload could not be decoded; acknowledged without a row.
    Rejected,
    /// Storage failed permanently; left for redelivery.
    Unacknowledged,
}

/// Result of one fetch-and-process round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub fetched: usize,
    pub acknowledged: usize,
    pub rejected: usize,
    pub stalled: bool,
}

/// Worker that drives one record source.
pub struct IngestionWorker {
    source: Arc<dyn RecordSource>,
    enricher: Arc<Enricher>,
    store: Arc<dyn PersonStore>,
    config: IngestionWorkerConfig,
}

impl IngestionWorker {
    /// Creates a new ingestion worker.
    pub fn new(
        source: Arc<dyn RecordSource>,
        enricher: Arc<Enricher>,
        store: Arc<dyn PersonStore>,
    ) -> Self {
        Self::with_config(source, enricher, store, IngestionWorkerConfig::default())
    }

    /// Creates a new ingestion worker with custom config.
    pub fn with_config(
        source: Arc<dyn RecordSource>,
        enricher: Arc<Enricher>,
        store: Arc<dyn PersonStore>,
        config: IngestionWorkerConfig,
    ) -> Self {
        Self {
            source,
            enricher,
            store,
            config,
        }
    }

    /// Main run loop - fetch, enrich, persist, acknowledge.
    ///
    /// This runs indefinitely.
    pub async fn run(&self) {
        info!(
            topic = %self.source.topic(),
            partition = self.source.partition(),
            max_retries = self.config.max_retries,
            "Ingestion worker starting"
        );

        while let Err(e) = self.prepare().await {
            error!(
                partition = self.source.partition(),
                error_code = e.error_code().code(),
                "Storage not ready, holding off ingestion: {}",
                e
            );
            tokio::time::sleep(self.config.error_pause).await;
        }

        loop {
            match self.process_batch().await {
                Ok(summary) if summary.stalled => {
                    // already logged at the failing delivery
                    tokio::time::sleep(self.config.error_pause).await;
                }
                Ok(summary) => {
                    if summary.fetched > 0 {
                        debug!(
                            fetched = summary.fetched,
                            acknowledged = summary.acknowledged,
                            rejected = summary.rejected,
                            "Processed batch"
                        );
                    }
                }
                Err(e) => {
                    error!(
                        partition = self.source.partition(),
                        error_code = e.error_code().code(),
                        "Fetch error: {}",
                        e
                    );
                    tokio::time::sleep(self.config.error_pause).await;
                    self.source.reset().await;
                }
            }
        }
    }

    /// Creates the schema if needed and positions the source after the last
    /// stored delivery of its partition. Returns that offset.
    pub async fn prepare(&self) -> Result<Option<i64>> {
        self.store.ensure_schema().await?;

        let last = self
            .store
            .last_offset(self.source.topic(), self.source.partition())
            .await?;
        if let Some(offset) = last {
            self.source.resume_at(offset + 1).await;
        }

        info!(
            topic = %self.source.topic(),
            partition = self.source.partition(),
            last_stored_offset = ?last,
            "Ingestion worker ready"
        );
        Ok(last)
    }

    /// Fetches one batch and processes it in order.
    ///
    /// Stops at the first delivery that could not be persisted.
    pub async fn process_batch(&self) -> Result<BatchSummary> {
        let deliveries = self.source.fetch().await?;

        let mut summary = BatchSummary {
            fetched: deliveries.len(),
            ..Default::default()
        };

        for delivery in &deliveries {
            match self.process_delivery(delivery).await? {
                DeliveryOutcome::Acknowledged { .. } => summary.acknowledged += 1,
                DeliveryOutcome::Rejected => summary.rejected += 1,
                DeliveryOutcome::Unacknowledged => {
                    summary.stalled = true;
                    break;
                }
            }
        }

        Ok(summary)
    }

    /// Processes a single delivery.
    ///
    /// Returns an error only when the acknowledgment itself fails.
    pub async fn process_delivery(&self, delivery: &Delivery) -> Result<DeliveryOutcome> {
        let key = delivery.key();

        let raw = match delivery.decode() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    delivery_key = %key,
                    error_code = e.error_code().code(),
                    "Dropping malformed delivery: {}",
                    e
                );
                metrics().deliveries_malformed.inc();
                self.source.ack(delivery.offset).await?;
                return Ok(DeliveryOutcome::Rejected);
            }
        };

        let enriched = self.enricher.enrich(raw).await;
        let degraded = enriched.is_degraded();

        match self.persist_with_retry(&key, &enriched).await {
            Ok(persisted) => {
                self.source.ack(delivery.offset).await?;
                metrics().records_persisted.inc();
                metrics().deliveries_acknowledged.inc();

                debug!(
                    delivery_key = %key,
                    id = %persisted.id,
                    inserted = persisted.inserted,
                    degraded = degraded,
                    "Delivery persisted"
                );

                Ok(DeliveryOutcome::Acknowledged {
                    id: persisted.id,
                    inserted: persisted.inserted,
                    degraded,
                })
            }
            Err(e) => {
                let attempts = match &e {
                    Error::Storage { attempts, .. } => *attempts,
                    _ => self.config.max_retries + 1,
                };
                error!(
                    delivery_key = %key,
                    partition = delivery.offset.partition,
                    offset = delivery.offset.offset,
                    attempts = attempts,
                    error_code = e.error_code().code(),
                    "Giving up on delivery, leaving it unacknowledged: {}",
                    e
                );
                metrics().storage_failures.inc();
                Ok(DeliveryOutcome::Unacknowledged)
            }
        }
    }

    /// Inserts a record with retry logic.
    async fn persist_with_retry(
        &self,
        key: &str,
        record: &EnrichedPersonRecord,
    ) -> Result<PersistedPerson> {
        let mut last_error = String::from("no insert attempted");
        let max_attempts = self.config.max_retries + 1;
        let mut attempts = 0;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let backoff = self.config.retry_backoff * attempt;
                warn!(
                    delivery_key = %key,
                    attempt = attempt,
                    backoff_ms = %backoff.as_millis(),
                    error = %last_error,
                    "Retrying insert"
                );
                metrics().storage_retries.inc();
                tokio::time::sleep(backoff).await;
            }

            attempts += 1;
            match self.store.insert(key, record).await {
                Ok(persisted) => return Ok(persisted),
                Err(e) => {
                    let retryable = e.is_retryable();
                    last_error = match e {
                        Error::Storage { message, .. } => message,
                        other => other.to_string(),
                    };
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(Error::storage(attempts, last_error))
    }
}
