//! Worker scheduler for the ingestion loops and background tasks.

use postgres_store::{PersonStore, PostgresClient};
use redpanda::{RecordSource, RedpandaConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use telemetry::{health, metrics};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::info;

use crate::consumer::{IngestionWorker, IngestionWorkerConfig};
use crate::enrichment::Enricher;

/// Worker scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_error_pause_ms")]
    pub error_pause_ms: u64,
    /// Metrics summary log interval
    #[serde(default = "default_metrics_log_interval_secs")]
    pub metrics_log_interval_secs: u64,
    /// Dependency probe interval
    #[serde(default = "default_health_probe_interval_secs")]
    pub health_probe_interval_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    100
}

fn default_error_pause_ms() -> u64 {
    1000
}

fn default_metrics_log_interval_secs() -> u64 {
    60
}

fn default_health_probe_interval_secs() -> u64 {
    30
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            error_pause_ms: default_error_pause_ms(),
            metrics_log_interval_secs: default_metrics_log_interval_secs(),
            health_probe_interval_secs: default_health_probe_interval_secs(),
        }
    }
}

impl WorkerConfig {
    /// Settings for each ingestion loop.
    pub fn ingestion(&self) -> IngestionWorkerConfig {
        IngestionWorkerConfig {
            max_retries: self.max_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            error_pause: Duration::from_millis(self.error_pause_ms),
        }
    }

    /// Metrics summary period, at least one second.
    pub fn metrics_log_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_log_interval_secs.max(1))
    }

    /// Dependency probe period, at least one second.
    pub fn health_probe_interval(&self) -> Duration {
        Duration::from_secs(self.health_probe_interval_secs.max(1))
    }
}

/// Dependencies polled by the health probe.
struct Probes {
    postgres: Arc<PostgresClient>,
    redpanda: RedpandaConfig,
}

/// Background worker scheduler.
pub struct WorkerScheduler {
    config: WorkerConfig,
    sources: Vec<Arc<dyn RecordSource>>,
    enricher: Arc<Enricher>,
    store: Arc<dyn PersonStore>,
    probes: Option<Probes>,
}

impl WorkerScheduler {
    pub fn new(
        config: WorkerConfig,
        sources: Vec<Arc<dyn RecordSource>>,
        enricher: Arc<Enricher>,
        store: Arc<dyn PersonStore>,
    ) -> Self {
        Self {
            config,
            sources,
            enricher,
            store,
            probes: None,
        }
    }

    /// Enables periodic dependency probes feeding the health registry.
    pub fn with_health_probes(
        mut self,
        postgres: Arc<PostgresClient>,
        redpanda: RedpandaConfig,
    ) -> Self {
        self.probes = Some(Probes { postgres, redpanda });
        self
    }

    /// Starts all workers.
    pub fn start(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        // One ingestion loop per partition
        for source in &self.sources {
            let worker = IngestionWorker::with_config(
                source.clone(),
                self.enricher.clone(),
                self.store.clone(),
                self.config.ingestion(),
            );
            let partition = source.partition();
            handles.push(tokio::spawn(async move {
                worker.run().await;
            }));
            info!(partition = partition, "Ingestion worker started");
        }
        metrics().active_workers.set(self.sources.len() as u64);

        // Metrics summary
        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_metrics_log().await;
        }));

        // Dependency probes
        if self.probes.is_some() {
            let scheduler = self.clone();
            handles.push(tokio::spawn(async move {
                scheduler.run_health_probes().await;
            }));
        }

        info!("Background workers started");
        handles
    }

    async fn run_metrics_log(&self) {
        let mut ticker = interval(self.config.metrics_log_interval());

        loop {
            ticker.tick().await;

            let snapshot = metrics().snapshot();
            info!(
                received = snapshot.deliveries_received,
                acknowledged = snapshot.deliveries_acknowledged,
                malformed = snapshot.deliveries_malformed,
                enriched = snapshot.records_enriched,
                degraded = snapshot.records_degraded,
                persisted = snapshot.records_persisted,
                storage_failures = snapshot.storage_failures,
                "Pipeline metrics"
            );
        }
    }

    async fn run_health_probes(&self) {
        let Some(probes) = &self.probes else {
            return;
        };
        let mut ticker = interval(self.config.health_probe_interval());

        loop {
            ticker.tick().await;

            let postgres_ok = postgres_store::health::check_connection(&probes.postgres).await;
            health()
                .postgres
                .record(postgres_ok, "Postgres connection failed");

            let redpanda_ok = redpanda::health::check_connection(&probes.redpanda).await;
            health()
                .redpanda
                .record(redpanda_ok, "Redpanda connection failed");
        }
    }
}
