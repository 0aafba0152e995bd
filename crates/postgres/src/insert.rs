//! Insert helpers for enriched person records, and the read of the stored
//! delivery keys used to resume a partition.

use crate::client::PostgresClient;
use crate::store::PersistedPerson;
use chrono::{DateTime, Utc};
use engine_core::{EnrichedPersonRecord, Error, Result};
use std::time::Instant;
use telemetry::metrics;
use tracing::debug;
use uuid::Uuid;

// The no-op update makes RETURNING yield the existing row on conflict;
// xmax = 0 only for a freshly inserted tuple.
const INSERT_PERSON: &str = r#"
INSERT INTO people (id, delivery_key, name, surname, patronymic, age, gender, nationality, enriched_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
ON CONFLICT (delivery_key) DO UPDATE SET delivery_key = EXCLUDED.delivery_key
RETURNING id, created_at, (xmax = 0) AS inserted
"#;

// delivery_key is `topic/partition/offset`; the prefix pins topic and partition.
const LAST_OFFSET: &str = r#"
SELECT MAX(substring(delivery_key FROM char_length($1) + 1)::BIGINT)
FROM people
WHERE starts_with(delivery_key, $1)
"#;

/// Insert one enriched record, or return the row already stored for `delivery_key`.
pub async fn insert_person(
    client: &PostgresClient,
    delivery_key: &str,
    record: &EnrichedPersonRecord,
) -> Result<PersistedPerson> {
    let start = Instant::now();

    let (id, created_at, inserted): (Uuid, DateTime<Utc>, bool) = sqlx::query_as(INSERT_PERSON)
        .bind(Uuid::new_v4())
        .bind(delivery_key)
        .bind(&record.name)
        .bind(&record.surname)
        .bind(record.patronymic.as_deref())
        .bind(record.age.map(i16::from))
        .bind(record.gender.as_deref())
        .bind(record.nationality.as_deref())
        .bind(record.enriched_at)
        .fetch_one(client.pool())
        .await
        .map_err(|e| Error::storage(1, e.to_string()))?;

    let elapsed = start.elapsed();
    metrics()
        .storage_latency_ms
        .observe(elapsed.as_millis() as u64);

    debug!(
        id = %id,
        delivery_key = %delivery_key,
        inserted = inserted,
        latency_ms = %elapsed.as_millis(),
        "Stored enriched person"
    );

    Ok(PersistedPerson {
        id,
        created_at,
        inserted,
    })
}

/// Highest offset stored for a topic partition.
pub async fn last_offset(
    client: &PostgresClient,
    topic: &str,
    partition: i32,
) -> Result<Option<i64>> {
    let prefix = format!("{}/{}/", topic, partition);

    let offset: Option<i64> = sqlx::query_scalar(LAST_OFFSET)
        .bind(&prefix)
        .fetch_one(client.pool())
        .await
        .map_err(|e| Error::storage(1, e.to_string()))?;

    debug!(prefix = %prefix, last_offset = ?offset, "Read last stored offset");
    Ok(offset)
}
