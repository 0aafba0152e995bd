//! In-process pipeline metrics.
//!
//! Counters and histograms are lock-free atomics; `snapshot()` copies them
//! into a serializable struct for logging and the `/metrics` endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A point-in-time value.
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Latency histogram in milliseconds.
#[derive(Debug)]
pub struct Histogram {
    /// Upper bounds: 5ms, 25ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s, +inf
    buckets: [AtomicU64; 10],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 10] = [5, 25, 100, 250, 500, 1000, 2500, 5000, 10000, u64::MAX];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let index = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[index].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns `(upper_bound_ms, count)` per bucket.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Pipeline metrics.
#[derive(Debug, Default)]
pub struct Metrics {
    // Message source
    pub deliveries_received: Counter,
    pub deliveries_malformed: Counter,
    pub deliveries_acknowledged: Counter,
    pub consumer_errors: Counter,

    // Enrichment
    pub records_enriched: Counter,
    pub records_degraded: Counter,
    pub age_lookup_failures: Counter,
    pub gender_lookup_failures: Counter,
    pub nationality_lookup_failures: Counter,
    pub cache_hits: Counter,
    pub cache_misses: Counter,

    // Storage
    pub records_persisted: Counter,
    pub storage_retries: Counter,
    pub storage_failures: Counter,

    // Latency histograms
    pub enrich_latency_ms: Histogram,
    pub lookup_latency_ms: Histogram,
    pub storage_latency_ms: Histogram,

    // Gauges
    pub active_workers: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            deliveries_received: self.deliveries_received.get(),
            deliveries_malformed: self.deliveries_malformed.get(),
            deliveries_acknowledged: self.deliveries_acknowledged.get(),
            consumer_errors: self.consumer_errors.get(),
            records_enriched: self.records_enriched.get(),
            records_degraded: self.records_degraded.get(),
            age_lookup_failures: self.age_lookup_failures.get(),
            gender_lookup_failures: self.gender_lookup_failures.get(),
            nationality_lookup_failures: self.nationality_lookup_failures.get(),
            cache_hits: self.cache_hits.get(),
            cache_misses: self.cache_misses.get(),
            records_persisted: self.records_persisted.get(),
            storage_retries: self.storage_retries.get(),
            storage_failures: self.storage_failures.get(),
            enrich_latency_mean_ms: self.enrich_latency_ms.mean(),
            lookup_latency_mean_ms: self.lookup_latency_ms.mean(),
            storage_latency_mean_ms: self.storage_latency_ms.mean(),
            lookup_latency_buckets: self.lookup_latency_ms.buckets(),
            active_workers: self.active_workers.get(),
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub deliveries_received: u64,
    pub deliveries_malformed: u64,
    pub deliveries_acknowledged: u64,
    pub consumer_errors: u64,
    pub records_enriched: u64,
    pub records_degraded: u64,
    pub age_lookup_failures: u64,
    pub gender_lookup_failures: u64,
    pub nationality_lookup_failures: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub records_persisted: u64,
    pub storage_retries: u64,
    pub storage_failures: u64,
    pub enrich_latency_mean_ms: f64,
    pub lookup_latency_mean_ms: f64,
    pub storage_latency_mean_ms: f64,
    /// `(upper_bound_ms, count)` per lookup latency bucket
    pub lookup_latency_buckets: Vec<(u64, u64)>,
    pub active_workers: u64,
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
