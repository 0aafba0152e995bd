//! Redpanda partition consumer for raw person records.
//!
//! Uses rskafka for Kafka-compatible message consumption with:
//! - Manual offset management: the read position only moves on `ack`
//! - Per-partition clients, so each ingestion loop owns its ordering
//! - Payloads handed out undecoded; decoding is the worker's concern

use crate::config::{RedpandaConfig, StartOffset};
use crate::source::{Delivery, Offset, RecordSource};
use async_trait::async_trait;
use engine_core::{Error, Result};
use rskafka::client::{
    partition::{OffsetAt, PartitionClient, UnknownTopicHandling},
    ClientBuilder, Credentials, SaslConfig,
};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use telemetry::metrics;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Offset value meaning "not positioned yet".
const UNSET: i64 = -1;

/// Creates a TLS configuration for Redpanda Cloud.
fn create_tls_config() -> Arc<rustls::ClientConfig> {
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
}

/// Client builder with TLS and SASL applied when credentials are configured.
pub(crate) fn client_builder(config: &RedpandaConfig) -> ClientBuilder {
    let builder = ClientBuilder::new(vec![config.broker_string()]);

    match config.credentials() {
        Some((username, password)) => builder
            .tls_config(create_tls_config())
            .sasl_config(SaslConfig::ScramSha256(Credentials::new(
                username.to_string(),
                password.to_string(),
            ))),
        None => builder,
    }
}

/// Consumer bound to a single topic partition.
pub struct Consumer {
    config: RedpandaConfig,
    partition: i32,
    partition_client: RwLock<Option<Arc<PartitionClient>>>,
    /// Next offset to read; equals the last acknowledged offset + 1
    next_offset: AtomicI64,
    /// Position handed in by `resume_at`, applied on first connect
    resume_offset: AtomicI64,
}

impl Consumer {
    /// Creates a consumer for `partition` of the configured topic.
    ///
    /// No connection is made until the first fetch.
    pub fn new(config: RedpandaConfig, partition: i32) -> Self {
        info!(
            group_id = %config.consumer.group_id,
            topic = %config.consumer.topic,
            partition = partition,
            "Creating Redpanda consumer"
        );

        Self {
            config,
            partition,
            partition_client: RwLock::new(None),
            next_offset: AtomicI64::new(UNSET),
            resume_offset: AtomicI64::new(UNSET),
        }
    }

    /// One consumer per configured partition.
    pub fn for_all_partitions(config: &RedpandaConfig) -> Vec<Arc<Consumer>> {
        config
            .consumer
            .partitions
            .iter()
            .map(|&p| Arc::new(Consumer::new(config.clone(), p)))
            .collect()
    }

    async fn ensure_connected(&self) -> Result<Arc<PartitionClient>> {
        {
            let client = self.partition_client.read().await;
            if let Some(ref c) = *client {
                return Ok(c.clone());
            }
        }

        let client = client_builder(&self.config)
            .build()
            .await
            .map_err(|e| Error::internal(format!("Failed to connect to Redpanda: {}", e)))?;

        let partition_client = client
            .partition_client(
                self.config.consumer.topic.clone(),
                self.partition,
                UnknownTopicHandling::Error,
            )
            .await
            .map_err(|e| Error::internal(format!("Failed to get partition client: {}", e)))?;

        let partition_client = Arc::new(partition_client);

        if self.next_offset.load(Ordering::SeqCst) == UNSET {
            let resume = self.resume_offset.load(Ordering::SeqCst);
            let at = if resume != UNSET {
                // retention may have removed the resume offset already
                OffsetAt::Earliest
            } else {
                match self.config.consumer.start_offset {
                    StartOffset::Earliest => OffsetAt::Earliest,
                    StartOffset::Latest => OffsetAt::Latest,
                }
            };
            let offset = partition_client
                .get_offset(at)
                .await
                .map_err(|e| Error::internal(format!("Failed to get offset: {}", e)))?
                .max(resume);

            self.next_offset.store(offset, Ordering::SeqCst);

            info!(
                topic = %self.config.consumer.topic,
                partition = self.partition,
                offset = offset,
                resumed = resume != UNSET,
                "Consumer positioned"
            );
        }

        *self.partition_client.write().await = Some(partition_client.clone());

        Ok(partition_client)
    }

    /// Returns the next offset to be read.
    pub fn next_offset(&self) -> i64 {
        self.next_offset.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for Consumer {
    async fn fetch(&self) -> Result<Vec<Delivery>> {
        let client = self.ensure_connected().await?;

        let start = Instant::now();
        let current = self.next_offset.load(Ordering::SeqCst);

        let (records, high_watermark) = client
            .fetch_records(
                current,
                1..self.config.consumer.max_fetch_bytes,
                self.config.consumer.fetch_wait_ms,
            )
            .await
            .map_err(|e| {
                metrics().consumer_errors.inc();
                Error::internal(format!("Failed to fetch records: {}", e))
            })?;

        // Compressed batches may start before the requested offset.
        let mut deliveries: Vec<Delivery> = records
            .into_iter()
            .filter(|r| r.offset >= current)
            .map(|r| Delivery {
                topic: self.config.consumer.topic.clone(),
                offset: Offset {
                    partition: self.partition,
                    offset: r.offset,
                },
                payload: r.record.value,
            })
            .collect();
        deliveries.sort_by_key(|d| d.offset.offset);

        metrics().deliveries_received.inc_by(deliveries.len() as u64);

        if !deliveries.is_empty() {
            debug!(
                partition = self.partition,
                deliveries = deliveries.len(),
                offset_start = current,
                high_watermark = high_watermark,
                latency_ms = %start.elapsed().as_millis(),
                "Fetched deliveries"
            );
        }

        Ok(deliveries)
    }

    async fn ack(&self, offset: Offset) -> Result<()> {
        if offset.partition != self.partition {
            return Err(Error::internal(format!(
                "ack for partition {} sent to consumer of partition {}",
                offset.partition, self.partition
            )));
        }

        let prev = self.next_offset.swap(offset.offset + 1, Ordering::SeqCst);

        debug!(
            partition = offset.partition,
            prev_offset = prev,
            new_offset = offset.offset + 1,
            "Acknowledged delivery"
        );

        Ok(())
    }

    async fn resume_at(&self, next_offset: i64) {
        if self.next_offset.load(Ordering::SeqCst) != UNSET {
            debug!(
                partition = self.partition,
                next_offset = next_offset,
                "Already reading, ignoring resume position"
            );
            return;
        }
        self.resume_offset.store(next_offset, Ordering::SeqCst);
    }

    async fn reset(&self) {
        *self.partition_client.write().await = None;
        info!(partition = self.partition, "Consumer connection reset");
    }

    fn topic(&self) -> &str {
        &self.config.consumer.topic
    }

    fn partition(&self) -> i32 {
        self.partition
    }
}
