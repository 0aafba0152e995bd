//! Person Enrichment Engine
//!
//! Streaming pipeline that:
//! - Consumes raw person records (name, surname, patronymic) from Redpanda
//! - Enriches each with age, gender and nationality from public lookup services
//! - Persists the enriched record to Postgres, acknowledging only after the write
//! - Serves health and metrics over HTTP

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, AppState};
use lookup_client::{LookupClient, LookupConfig};
use postgres_store::{PersonStore, PostgresClient, PostgresConfig};
use redpanda::{Consumer, RecordSource, RedpandaConfig};
use telemetry::{health, init_tracing_from_env};
use worker::{CacheConfig, Enricher, MokaEnrichmentCache, WorkerConfig, WorkerScheduler};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    redpanda: RedpandaConfig,

    #[serde(default)]
    postgres: PostgresConfig,

    #[serde(default)]
    lookup: LookupConfig,

    #[serde(default)]
    cache: CacheConfig,

    #[serde(default)]
    worker: WorkerConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            redpanda: RedpandaConfig::default(),
            postgres: PostgresConfig::default(),
            lookup: LookupConfig::default(),
            cache: CacheConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // rustls 0.23+ requires explicit crypto provider selection
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Person Enrichment Engine v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    info!(
        brokers = ?config.redpanda.brokers,
        topic = %config.redpanda.consumer.topic,
        partitions = ?config.redpanda.consumer.partitions,
        sasl_username = config.redpanda.sasl_username.as_deref().unwrap_or("none"),
        "Loaded Redpanda config"
    );

    // Postgres
    let postgres = Arc::new(
        PostgresClient::new(config.postgres.clone()).context("Failed to create Postgres client")?,
    );

    // Each ingestion worker creates the schema before its first fetch,
    // retrying until Postgres is reachable.
    check_health(&config, &postgres).await;

    // Enrichment
    let lookups =
        Arc::new(LookupClient::new(config.lookup.clone()).context("Invalid lookup configuration")?);
    let mut enricher = Enricher::new(lookups, config.lookup.timeout());
    if config.cache.enabled {
        enricher = enricher.with_cache(Arc::new(MokaEnrichmentCache::new(&config.cache)));
        info!(
            max_capacity = config.cache.max_capacity,
            ttl_secs = config.cache.ttl_secs,
            "Enrichment cache enabled"
        );
    }
    let enricher = Arc::new(enricher);

    // Ingestion workers, one per partition
    let sources: Vec<Arc<dyn RecordSource>> = Consumer::for_all_partitions(&config.redpanda)
        .into_iter()
        .map(|c| c as Arc<dyn RecordSource>)
        .collect();
    let store: Arc<dyn PersonStore> = postgres.clone();

    let worker_scheduler = Arc::new(
        WorkerScheduler::new(config.worker.clone(), sources, enricher, store)
            .with_health_probes(postgres.clone(), config.redpanda.clone()),
    );
    let worker_handles = worker_scheduler.start();

    // Operational HTTP
    let app = router(AppState::new());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");

    // Unacknowledged deliveries are fetched again on the next start
    for handle in worker_handles {
        handle.abort();
    }
    postgres.pool().close().await;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("ENRICHMENT")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // The config crate's nested parsing doesn't work reliably with underscored field names
    if let Ok(brokers) = std::env::var("ENRICHMENT_REDPANDA_BROKERS") {
        config.redpanda.brokers = brokers.split(',').map(|s| s.trim().to_string()).collect();
    }
    if let Ok(username) = std::env::var("ENRICHMENT_REDPANDA_SASL_USERNAME") {
        config.redpanda.sasl_username = Some(username);
    }
    if let Ok(password) = std::env::var("ENRICHMENT_REDPANDA_SASL_PASSWORD") {
        config.redpanda.sasl_password = Some(password);
    }
    if let Ok(topic) = std::env::var("ENRICHMENT_REDPANDA_TOPIC") {
        config.redpanda.consumer.topic = topic;
    }

    if let Ok(url) = std::env::var("ENRICHMENT_POSTGRES_URL") {
        config.postgres.url = url;
    }

    if let Ok(url) = std::env::var("ENRICHMENT_LOOKUP_AGE_URL") {
        config.lookup.age_url = url;
    }
    if let Ok(url) = std::env::var("ENRICHMENT_LOOKUP_GENDER_URL") {
        config.lookup.gender_url = url;
    }
    if let Ok(url) = std::env::var("ENRICHMENT_LOOKUP_NATIONALITY_URL") {
        config.lookup.nationality_url = url;
    }

    Ok(config)
}

/// Check component health on startup.
async fn check_health(config: &Config, postgres: &PostgresClient) {
    let redpanda_healthy = redpanda::health::check_connection(&config.redpanda).await;
    if redpanda_healthy {
        health().redpanda.set_healthy();
        info!("Redpanda connection: healthy");
    } else {
        health().redpanda.set_unhealthy("Connection failed");
        error!("Redpanda connection: unhealthy");
    }

    let postgres_healthy = postgres_store::health::check_connection(postgres).await;
    if postgres_healthy {
        health().postgres.set_healthy();
        info!("Postgres connection: healthy");
    } else {
        health().postgres.set_unhealthy("Connection failed");
        error!("Postgres connection: unhealthy");
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
