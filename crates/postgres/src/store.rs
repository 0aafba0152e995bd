//! The storage seam used by the ingestion worker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engine_core::{EnrichedPersonRecord, Result};
use uuid::Uuid;

use crate::client::PostgresClient;

/// Row identity returned by a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPerson {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// False when the delivery key already existed and no new row was written.
    pub inserted: bool,
}

/// Write-once store for enriched records.
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Persists `record` under `delivery_key`.
    ///
    /// Idempotent per key: writing the same key twice yields the first row.
    async fn insert(
        &self,
        delivery_key: &str,
        record: &EnrichedPersonRecord,
    ) -> Result<PersistedPerson>;

    /// Creates the backing tables if missing. Safe to call repeatedly.
    async fn ensure_schema(&self) -> Result<()>;

    /// Highest offset stored for `topic`/`partition`, or `None` before the first write.
    async fn last_offset(&self, topic: &str, partition: i32) -> Result<Option<i64>>;
}

#[async_trait]
impl PersonStore for PostgresClient {
    async fn insert(
        &self,
        delivery_key: &str,
        record: &EnrichedPersonRecord,
    ) -> Result<PersistedPerson> {
        crate::insert::insert_person(self, delivery_key, record).await
    }

    async fn ensure_schema(&self) -> Result<()> {
        crate::health::init_schema(self).await
    }

    async fn last_offset(&self, topic: &str, partition: i32) -> Result<Option<i64>> {
        crate::insert::last_offset(self, topic, partition).await
    }
}
