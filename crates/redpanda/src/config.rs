//! Redpanda configuration.

use serde::{Deserialize, Serialize};

/// Where a partition consumer starts when it has no acknowledged offset yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartOffset {
    Earliest,
    Latest,
}

/// Redpanda connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedpandaConfig {
    /// Broker addresses
    pub brokers: Vec<String>,
    /// SASL username (Redpanda Cloud)
    #[serde(default)]
    pub sasl_username: Option<String>,
    /// SASL password (Redpanda Cloud)
    #[serde(default)]
    pub sasl_password: Option<String>,
    #[serde(default)]
    pub consumer: ConsumerConfig,
}

impl Default for RedpandaConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            sasl_username: None,
            sasl_password: None,
            consumer: ConsumerConfig::default(),
        }
    }
}

impl RedpandaConfig {
    /// Returns the broker list as a comma-separated string.
    pub fn broker_string(&self) -> String {
        self.brokers.join(",")
    }

    /// SASL credentials, when both halves are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.sasl_username, &self.sasl_password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

/// Consumer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Topic carrying raw person records
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Consumer group name; only reported in logs, offsets are not committed to the broker
    #[serde(default = "default_group_id")]
    pub group_id: String,
    /// Partitions to consume; one ingestion loop runs per partition
    #[serde(default = "default_partitions")]
    pub partitions: Vec<i32>,
    /// Maximum bytes per fetch
    #[serde(default = "default_max_fetch_bytes")]
    pub max_fetch_bytes: i32,
    /// Maximum broker wait per fetch in milliseconds
    #[serde(default = "default_fetch_wait_ms")]
    pub fetch_wait_ms: i32,
    #[serde(default = "default_start_offset")]
    pub start_offset: StartOffset,
}

fn default_topic() -> String {
    "people".to_string()
}

fn default_group_id() -> String {
    "enrichment-engine".to_string()
}

fn default_partitions() -> Vec<i32> {
    vec![0]
}

fn default_max_fetch_bytes() -> i32 {
    1024 * 1024
}

fn default_fetch_wait_ms() -> i32 {
    1000
}

fn default_start_offset() -> StartOffset {
    StartOffset::Earliest
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            group_id: default_group_id(),
            partitions: default_partitions(),
            max_fetch_bytes: default_max_fetch_bytes(),
            fetch_wait_ms: default_fetch_wait_ms(),
            start_offset: default_start_offset(),
        }
    }
}
