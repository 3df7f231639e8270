//! Concurrency tests for the in-memory store behind the aggregation
//! service.
//!
//! These tests pin the linearizability guarantee: after any set of
//! concurrent ingests, every popular-times cell equals the sum of the
//! committed deltas, regardless of arrival order.

use std::sync::Arc;

use chrono::NaiveDate;
use sps_rust::api::Observation;
use sps_rust::db::repositories::LocalStore;
use sps_rust::db::repository::{OccupancyLogRepository, PopularTimesRepository};
use sps_rust::models::{HourBucket, LocationType};
use sps_rust::services::AggregationService;

fn observation(source: &str, count: i64) -> Observation {
    Observation {
        raw_location: "P3 - North Wing".to_string(),
        raw_time: "09:00".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        vehicle_count: count,
        source_image_id: Some(source.to_string()),
    }
}

fn hour(label: &str) -> HourBucket {
    label.parse().unwrap()
}

#[tokio::test]
async fn test_concurrent_ingests_on_one_key_sum_exactly() {
    let store = Arc::new(LocalStore::new());
    let service = Arc::new(AggregationService::new(store.clone()));

    let n = 32u32;
    let mut handles = vec![];
    for i in 0..n {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .ingest(&observation(&format!("img-{i}"), i64::from(i)))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let expected: u64 = (0..u64::from(n)).sum();
    let summary = store.fetch_summary().await.unwrap();
    assert_eq!(
        summary.total_for(
            LocationType::Indoor,
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            hour("9am")
        ),
        expected
    );
    assert_eq!(store.record_count().await.unwrap(), n as usize);
}

#[tokio::test]
async fn test_concurrent_redeliveries_commit_once() {
    let store = Arc::new(LocalStore::new());
    let service = Arc::new(AggregationService::new(store.clone()));

    let mut handles = vec![];
    for _ in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.ingest(&observation("same-image", 5)).await.unwrap()
        }));
    }

    let mut committed = 0;
    let mut duplicates = 0;
    for handle in handles {
        let outcome = handle.await.unwrap();
        if outcome.duplicate {
            duplicates += 1;
        } else {
            committed += 1;
        }
        assert_eq!(outcome.record.vehicle_count, 5);
    }

    assert_eq!(committed, 1);
    assert_eq!(duplicates, 15);
    assert_eq!(store.record_count().await.unwrap(), 1);

    let summary = store.fetch_summary().await.unwrap();
    assert_eq!(
        summary.total_for(
            LocationType::Indoor,
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            hour("9am")
        ),
        5
    );
}

#[tokio::test]
async fn test_concurrent_ingests_across_types_stay_separate() {
    let store = Arc::new(LocalStore::new());
    let service = Arc::new(AggregationService::new(store.clone()));

    let mut handles = vec![];
    for i in 0..10 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let mut obs = observation(&format!("indoor-{i}"), 2);
            obs.raw_location = "P1 - Block A".to_string();
            service.ingest(&obs).await.unwrap();

            let mut obs = observation(&format!("outdoor-{i}"), 3);
            obs.raw_location = "Level 2 - Outdoor Lot".to_string();
            service.ingest(&obs).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let summary = store.fetch_summary().await.unwrap();
    assert_eq!(summary.total_for(LocationType::Indoor, date, hour("9am")), 20);
    assert_eq!(summary.total_for(LocationType::Outdoor, date, hour("9am")), 30);

    // Every outdoor record carries the collapsed canonical zone name.
    let outdoor_names: Vec<String> = store
        .fetch_records()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.location_type == LocationType::Outdoor)
        .map(|r| r.location_name)
        .collect();
    assert_eq!(outdoor_names.len(), 10);
    assert!(outdoor_names.iter().all(|name| name == "Outdoor"));
}

#[tokio::test]
async fn test_sequence_numbers_are_unique_and_dense() {
    let store = Arc::new(LocalStore::new());
    let service = Arc::new(AggregationService::new(store.clone()));

    let mut handles = vec![];
    for i in 0..20 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.ingest(&observation(&format!("img-{i}"), 1)).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut sequences: Vec<u64> = store
        .fetch_records()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.ingested_at)
        .collect();
    sequences.sort_unstable();
    let expected: Vec<u64> = (1..=20).collect();
    assert_eq!(sequences, expected);
}
