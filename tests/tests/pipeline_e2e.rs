//! End-to-end tests for the enrichment pipeline.
//!
//! Delivery → decode → HTTP lookups (wiremock) → enrich → MockStore → ack.
//!
//! The MockSource and MockStore implement the same traits as the Redpanda
//! consumer and the Postgres client, so every production code path runs
//! except the broker and database network transport.

use chrono::Utc;
use engine_core::{EnrichedPersonRecord, EnrichmentFragment, RawPersonRecord};
use integration_tests::{fixtures, setup::TestPipeline};
use serde_json::json;
use worker::DeliveryOutcome;

/// Full pipeline: all three dimensions populated, nationality resolved to the top country
#[tokio::test]
async fn test_delivery_enriched_persisted_and_acked() {
    let pipeline = TestPipeline::new().await;
    pipeline
        .lookups
        .healthy("Dmitriy", 42, "male", &[("RU", 0.36), ("UA", 0.19), ("BY", 0.08)])
        .await;

    pipeline.source.push(fixtures::dmitriy());

    let summary = pipeline.worker.process_batch().await.unwrap();
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.acknowledged, 1);
    assert!(!summary.stalled);

    let rows = pipeline.store.rows();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.delivery_key, "people/0/0");
    assert_eq!(row.record.name, "Dmitriy");
    assert_eq!(row.record.surname, "Ushakov");
    assert_eq!(row.record.patronymic.as_deref(), Some("Vasilevich"));
    assert_eq!(row.record.age, Some(42));
    assert_eq!(row.record.gender.as_deref(), Some("male"));
    assert_eq!(row.record.nationality.as_deref(), Some("RU"));

    assert_eq!(pipeline.source.acked(), vec![0]);
}

#[tokio::test]
async fn test_nationality_picks_highest_probability() {
    let pipeline = TestPipeline::new().await;
    pipeline.lookups.age("Jean", json!(40)).await;
    pipeline.lookups.gender("Jean", json!("male")).await;
    pipeline
        .lookups
        .nationality("Jean", &[("US", 0.2), ("FR", 0.8)])
        .await;

    pipeline
        .source
        .push(fixtures::person_payload("Jean", "Dupont", None));
    pipeline.worker.process_batch().await.unwrap();

    let rows = pipeline.store.rows();
    assert_eq!(rows[0].record.nationality.as_deref(), Some("FR"));
    assert_eq!(rows[0].record.patronymic, None);
}

/// A fractional age is truncated toward zero before storage
#[tokio::test]
async fn test_float_age_is_truncated() {
    let pipeline = TestPipeline::new().await;
    pipeline.lookups.age("Anna", json!(57.9)).await;
    pipeline.lookups.gender("Anna", json!("female")).await;
    pipeline.lookups.nationality("Anna", &[("PL", 0.4)]).await;

    pipeline
        .source
        .push(fixtures::person_payload("Anna", "Kowalska", None));
    pipeline.worker.process_batch().await.unwrap();

    assert_eq!(pipeline.store.rows()[0].record.age, Some(57));
}

/// Two transient storage failures, then success: one row, one ack
#[tokio::test]
async fn test_transient_storage_failure_recovers() {
    let pipeline = TestPipeline::new().await;
    pipeline
        .lookups
        .healthy("Dmitriy", 42, "male", &[("RU", 0.5)])
        .await;
    pipeline.store.fail_times(2);

    let delivery = pipeline.source.push(fixtures::dmitriy());

    let outcome = pipeline.worker.process_delivery(&delivery).await.unwrap();
    assert!(matches!(
        outcome,
        DeliveryOutcome::Acknowledged { inserted: true, .. }
    ));

    assert_eq!(pipeline.store.attempts(), 3);
    assert_eq!(pipeline.store.row_count(), 1);
    assert_eq!(pipeline.source.acked(), vec![0]);
}

/// A redelivered, already-stored delivery does not create a second row
#[tokio::test]
async fn test_redelivery_is_deduplicated() {
    let pipeline = TestPipeline::new().await;
    pipeline
        .lookups
        .healthy("Dmitriy", 42, "male", &[("RU", 0.5)])
        .await;

    let delivery = pipeline.source.push(fixtures::dmitriy());

    let first = pipeline.worker.process_delivery(&delivery).await.unwrap();
    let second = pipeline.worker.process_delivery(&delivery).await.unwrap();

    match (first, second) {
        (
            DeliveryOutcome::Acknowledged {
                id: first_id,
                inserted: true,
                ..
            },
            DeliveryOutcome::Acknowledged {
                id: second_id,
                inserted: false,
                ..
            },
        ) => assert_eq!(first_id, second_id),
        other => panic!("unexpected outcomes: {:?}", other),
    }
    assert_eq!(pipeline.store.row_count(), 1);
}

/// Deliveries in a batch are processed and acknowledged in offset order
#[tokio::test]
async fn test_batch_is_processed_in_order() {
    let pipeline = TestPipeline::new().await;
    for (name, country) in [("Ivan", "RU"), ("Olena", "UA"), ("Jan", "PL")] {
        pipeline
            .lookups
            .healthy(name, 30, "male", &[(country, 0.6)])
            .await;
        pipeline
            .source
            .push(fixtures::person_payload(name, "Test", None));
    }

    let summary = pipeline.worker.process_batch().await.unwrap();
    assert_eq!(summary.acknowledged, 3);
    assert_eq!(pipeline.source.acked(), vec![0, 1, 2]);

    let names: Vec<String> = pipeline
        .store
        .rows()
        .into_iter()
        .map(|r| r.record.name)
        .collect();
    assert_eq!(names, vec!["Ivan", "Olena", "Jan"]);

    // Nothing left to deliver
    let summary = pipeline.worker.process_batch().await.unwrap();
    assert_eq!(summary.fetched, 0);
}

/// After a restart the worker resumes after the last stored offset, so
/// deliveries stored by the previous run are neither fetched nor looked up again
#[tokio::test]
async fn test_restart_resumes_after_last_stored_offset() {
    let pipeline = TestPipeline::new().await;
    pipeline
        .lookups
        .healthy("Jan", 30, "male", &[("PL", 0.6)])
        .await;

    for name in ["Ivan", "Olena", "Jan"] {
        pipeline
            .source
            .push(fixtures::person_payload(name, "Test", None));
    }
    // stored by an earlier process that crashed before reading on
    for (offset, name) in [(0, "Ivan"), (1, "Olena")] {
        pipeline.store.seed(
            &format!("people/0/{}", offset),
            EnrichedPersonRecord::from_parts(
                RawPersonRecord::new(name, "Test"),
                EnrichmentFragment::default(),
                Utc::now(),
            ),
        );
    }

    assert_eq!(pipeline.worker.prepare().await.unwrap(), Some(1));

    let summary = pipeline.worker.process_batch().await.unwrap();
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.acknowledged, 1);
    assert_eq!(pipeline.source.acked(), vec![2]);
    assert_eq!(pipeline.store.row_count(), 3);

    let requests = pipeline
        .lookups
        .server
        .received_requests()
        .await
        .unwrap_or_default();
    assert_eq!(requests.len(), 3, "only the new delivery is enriched");
}

/// Nothing stored yet: the source keeps its configured start position
#[tokio::test]
async fn test_fresh_partition_starts_from_beginning() {
    let pipeline = TestPipeline::new().await;
    pipeline
        .lookups
        .healthy("Dmitriy", 42, "male", &[("RU", 0.5)])
        .await;
    pipeline.source.push(fixtures::dmitriy());

    assert_eq!(pipeline.worker.prepare().await.unwrap(), None);

    let summary = pipeline.worker.process_batch().await.unwrap();
    assert_eq!(summary.acknowledged, 1);
    assert_eq!(pipeline.source.acked(), vec![0]);
}
