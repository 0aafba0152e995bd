//! Mock implementations for testing.

use async_trait::async_trait;
use chrono::Utc;
use engine_core::{EnrichedPersonRecord, Error, Result};
use parking_lot::Mutex;
use postgres_store::{PersistedPerson, PersonStore};
use redpanda::{Delivery, Offset, RecordSource};
use std::sync::Arc;
use uuid::Uuid;

/// Mock partition that replays a fixed log of deliveries.
///
/// Behaves like the real consumer: every fetch returns everything from the
/// last acknowledged offset onwards, so an unacknowledged delivery comes back
/// on the next fetch.
#[derive(Clone)]
pub struct MockSource {
    topic: String,
    partition: i32,
    log: Arc<Mutex<Vec<Delivery>>>,
    next_offset: Arc<Mutex<i64>>,
    acks: Arc<Mutex<Vec<Offset>>>,
}

impl MockSource {
    pub fn new(topic: &str, partition: i32) -> Self {
        Self {
            topic: topic.to_string(),
            partition,
            log: Arc::new(Mutex::new(Vec::new())),
            next_offset: Arc::new(Mutex::new(0)),
            acks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Appends a payload to the partition log and returns its delivery.
    pub fn push(&self, payload: Vec<u8>) -> Delivery {
        let mut log = self.log.lock();
        let delivery = Delivery::new(
            self.topic.clone(),
            Offset {
                partition: self.partition,
                offset: log.len() as i64,
            },
            payload,
        );
        log.push(delivery.clone());
        delivery
    }

    /// Offsets acknowledged so far, in order.
    pub fn acked(&self) -> Vec<i64> {
        self.acks.lock().iter().map(|o| o.offset).collect()
    }
}

#[async_trait]
impl RecordSource for MockSource {
    async fn fetch(&self) -> Result<Vec<Delivery>> {
        let next = *self.next_offset.lock();
        Ok(self
            .log
            .lock()
            .iter()
            .filter(|d| d.offset.offset >= next)
            .cloned()
            .collect())
    }

    async fn ack(&self, offset: Offset) -> Result<()> {
        *self.next_offset.lock() = offset.offset + 1;
        self.acks.lock().push(offset);
        Ok(())
    }

    async fn resume_at(&self, next_offset: i64) {
        if self.acks.lock().is_empty() {
            *self.next_offset.lock() = next_offset;
        }
    }

    fn topic(&self) -> &str {
        &self.topic
    }

    fn partition(&self) -> i32 {
        self.partition
    }
}

/// A row captured by [`MockStore`].
#[derive(Debug, Clone)]
pub struct StoredRow {
    pub delivery_key: String,
    pub persisted: PersistedPerson,
    pub record: EnrichedPersonRecord,
}

/// Mock store that keeps rows in memory, keyed like the real table.
#[derive(Clone, Default)]
pub struct MockStore {
    rows: Arc<Mutex<Vec<StoredRow>>>,
    /// Number of upcoming inserts that should fail.
    failures_remaining: Arc<Mutex<u32>>,
    always_fail: Arc<Mutex<bool>>,
    /// Every insert fails with an error that retrying cannot fix.
    reject_records: Arc<Mutex<bool>>,
    /// Inserts fail until `ensure_schema` succeeds.
    schema_missing: Arc<Mutex<bool>>,
    schema_failures_remaining: Arc<Mutex<u32>>,
    attempts: Arc<Mutex<u32>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next `n` inserts, then succeeds.
    pub fn fail_times(&self, n: u32) {
        *self.failures_remaining.lock() = n;
    }

    /// Fails every insert until switched off.
    pub fn set_always_fail(&self, fail: bool) {
        *self.always_fail.lock() = fail;
    }

    /// Fails every insert with a non-retryable error.
    pub fn set_reject_records(&self, reject: bool) {
        *self.reject_records.lock() = reject;
    }

    /// Starts without the table; `n` schema creations fail before one succeeds.
    pub fn without_schema(&self, n: u32) {
        *self.schema_missing.lock() = true;
        *self.schema_failures_remaining.lock() = n;
    }

    pub fn schema_ready(&self) -> bool {
        !*self.schema_missing.lock()
    }

    /// Stores a row directly, as a previous process run would have.
    pub fn seed(&self, delivery_key: &str, record: EnrichedPersonRecord) {
        self.rows.lock().push(StoredRow {
            delivery_key: delivery_key.to_string(),
            persisted: PersistedPerson {
                id: Uuid::new_v4(),
                created_at: Utc::now(),
                inserted: true,
            },
            record,
        });
    }

    pub fn rows(&self) -> Vec<StoredRow> {
        self.rows.lock().clone()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }

    /// Insert attempts, successful or not.
    pub fn attempts(&self) -> u32 {
        *self.attempts.lock()
    }
}

#[async_trait]
impl PersonStore for MockStore {
    async fn insert(
        &self,
        delivery_key: &str,
        record: &EnrichedPersonRecord,
    ) -> Result<PersistedPerson> {
        *self.attempts.lock() += 1;

        if *self.schema_missing.lock() {
            return Err(Error::storage(1, "relation \"people\" does not exist"));
        }
        if *self.always_fail.lock() {
            return Err(Error::storage(1, "connection refused"));
        }
        if *self.reject_records.lock() {
            return Err(Error::malformed_delivery("value violates check constraint"));
        }
        {
            let mut remaining = self.failures_remaining.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::storage(1, "connection reset by peer"));
            }
        }

        let mut rows = self.rows.lock();
        if let Some(existing) = rows.iter().find(|r| r.delivery_key == delivery_key) {
            return Ok(PersistedPerson {
                inserted: false,
                ..existing.persisted.clone()
            });
        }

        let persisted = PersistedPerson {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            inserted: true,
        };
        rows.push(StoredRow {
            delivery_key: delivery_key.to_string(),
            persisted: persisted.clone(),
            record: record.clone(),
        });
        Ok(persisted)
    }

    async fn ensure_schema(&self) -> Result<()> {
        let mut remaining = self.schema_failures_remaining.lock();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(Error::storage(1, "connection refused"));
        }
        *self.schema_missing.lock() = false;
        Ok(())
    }

    async fn last_offset(&self, topic: &str, partition: i32) -> Result<Option<i64>> {
        if *self.schema_missing.lock() {
            return Err(Error::storage(1, "relation \"people\" does not exist"));
        }
        let prefix = format!("{}/{}/", topic, partition);
        Ok(self
            .rows
            .lock()
            .iter()
            .filter_map(|r| r.delivery_key.strip_prefix(&prefix))
            .filter_map(|offset| offset.parse::<i64>().ok())
            .max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{EnrichmentFragment, RawPersonRecord};

    fn record() -> EnrichedPersonRecord {
        EnrichedPersonRecord::from_parts(
            RawPersonRecord::new("Ivan", "Petrov"),
            EnrichmentFragment::default(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_mock_source_redelivers_until_acked() {
        let source = MockSource::new("people", 0);
        source.push(b"a".to_vec());
        source.push(b"b".to_vec());

        assert_eq!(source.fetch().await.unwrap().len(), 2);
        assert_eq!(source.fetch().await.unwrap().len(), 2);

        source
            .ack(Offset {
                partition: 0,
                offset: 0,
            })
            .await
            .unwrap();
        let remaining = source.fetch().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].offset.offset, 1);
        assert_eq!(source.acked(), vec![0]);
    }

    #[tokio::test]
    async fn test_mock_store_fail_times() {
        let store = MockStore::new();
        store.fail_times(1);

        assert!(store.insert("people/0/0", &record()).await.is_err());
        assert!(store.insert("people/0/0", &record()).await.is_ok());
        assert_eq!(store.attempts(), 2);
        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_store_last_offset_per_partition() {
        let store = MockStore::new();
        assert_eq!(store.last_offset("people", 0).await.unwrap(), None);

        store.insert("people/0/4", &record()).await.unwrap();
        store.insert("people/0/11", &record()).await.unwrap();
        store.insert("people/1/90", &record()).await.unwrap();

        assert_eq!(store.last_offset("people", 0).await.unwrap(), Some(11));
        assert_eq!(store.last_offset("people", 1).await.unwrap(), Some(90));
        assert_eq!(store.last_offset("other", 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mock_store_is_idempotent_per_key() {
        let store = MockStore::new();

        let first = store.insert("people/0/3", &record()).await.unwrap();
        let second = store.insert("people/0/3", &record()).await.unwrap();

        assert!(first.inserted);
        assert!(!second.inserted);
        assert_eq!(first.id, second.id);
        assert_eq!(store.row_count(), 1);
    }
}
