//! The message-source seam: deliveries in, acknowledgments out.

use async_trait::async_trait;
use engine_core::{Error, RawPersonRecord, Result};

/// Position of a delivery within its partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    pub partition: i32,
    pub offset: i64,
}

/// One message received from the stream.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub topic: String,
    pub offset: Offset,
    pub payload: Option<Vec<u8>>,
}

impl Delivery {
    pub fn new(topic: impl Into<String>, offset: Offset, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            offset,
            payload: Some(payload),
        }
    }

    /// Stable identity of this delivery: `topic/partition/offset`.
    ///
    /// A redelivery of the same message carries the same key.
    pub fn key(&self) -> String {
        format!(
            "{}/{}/{}",
            self.topic, self.offset.partition, self.offset.offset
        )
    }

    /// Decodes the payload into a validated person record.
    pub fn decode(&self) -> Result<RawPersonRecord> {
        match &self.payload {
            Some(bytes) => RawPersonRecord::from_payload(bytes),
            None => Err(Error::malformed_delivery("empty payload")),
        }
    }
}

/// An ordered, at-least-once source of person records for one partition.
///
/// `ack` marks a delivery and everything before it as processed; anything
/// not acknowledged is fetched again.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetches the next deliveries after the last acknowledged offset.
    async fn fetch(&self) -> Result<Vec<Delivery>>;

    /// Acknowledges a delivery.
    async fn ack(&self, offset: Offset) -> Result<()>;

    /// Starts reading at `next_offset` instead of the configured start position.
    ///
    /// Only honored before the first fetch.
    async fn resume_at(&self, next_offset: i64);

    /// Drops any cached connection after an error.
    async fn reset(&self) {}

    fn topic(&self) -> &str;

    fn partition(&self) -> i32;
}
