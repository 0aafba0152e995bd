//! Best-effort enrichment cache keyed by first name.
//!
//! A miss, an eviction or a stale entry only costs a round of lookups; the
//! enricher never depends on the cache answering.

use async_trait::async_trait;
use engine_core::EnrichmentFragment;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name -> fragment memo.
#[async_trait]
pub trait EnrichmentCache: Send + Sync {
    async fn get(&self, name: &str) -> Option<EnrichmentFragment>;

    async fn set(&self, name: &str, fragment: EnrichmentFragment);
}

/// Cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_max_capacity() -> u64 {
    50_000
}

fn default_ttl_secs() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_capacity: default_max_capacity(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

/// In-process cache backed by moka.
#[derive(Clone)]
pub struct MokaEnrichmentCache {
    inner: Cache<String, EnrichmentFragment>,
}

impl MokaEnrichmentCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(Duration::from_secs(config.ttl_secs))
                .build(),
        }
    }
}

#[async_trait]
impl EnrichmentCache for MokaEnrichmentCache {
    async fn get(&self, name: &str) -> Option<EnrichmentFragment> {
        self.inner.get(name).await
    }

    async fn set(&self, name: &str, fragment: EnrichmentFragment) {
        self.inner.insert(name.to_string(), fragment).await;
    }
}
