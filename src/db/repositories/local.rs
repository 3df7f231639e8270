//! In-memory statistics store implementation.
//!
//! This module provides a local implementation of all store traits suitable
//! for unit testing and local development. All data is stored in memory,
//! providing fast, deterministic, and isolated execution with the same
//! locking discipline as the durable backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};

use crate::api::{ApplyOutcome, NewOccupancyRecord, OccupancyRecord, PopularTimes, PopularTimesSummary};
use crate::db::repository::{
    ErrorContext, MaintenanceRepository, OccupancyLogRepository, PopularTimesRepository,
    StoreError, StoreResult,
};
use crate::models::LocationType;

/// Default bound on lock acquisition before failing fast with `Busy`.
pub(crate) const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// In-memory statistics store.
///
/// Stores the occupancy log and the popular-times summary behind a single
/// timed mutex, making it ideal for unit tests and local development that
/// need isolation and speed.
///
/// # Example
/// ```ignore
/// let store = LocalStore::new();
/// let outcome = store.apply_observation(new_record).await?;
/// assert!(!outcome.duplicate);
/// ```
#[derive(Clone)]
pub struct LocalStore {
    data: Arc<Mutex<LocalData>>,
    lock_timeout: Duration,
}

struct LocalData {
    records: Vec<OccupancyRecord>,
    summary: PopularTimesSummary,
    // source_image_id -> index into records
    by_source: HashMap<String, usize>,
    next_sequence: u64,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            summary: PopularTimesSummary::new(),
            by_source: HashMap::new(),
            next_sequence: 1,
            is_healthy: true,
        }
    }
}

impl LocalStore {
    /// Create a new empty local store.
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Create a local store with a custom lock-acquisition bound.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            data: Arc::new(Mutex::new(LocalData::default())),
            lock_timeout,
        }
    }

    /// Set the health status for testing store outages.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.lock().is_healthy = healthy;
    }

    /// Clear all data, keeping the health flag.
    pub fn clear(&self) {
        let mut data = self.data.lock();
        let is_healthy = data.is_healthy;
        *data = LocalData {
            is_healthy,
            ..Default::default()
        };
    }

    /// Acquire the state lock within the configured bound.
    fn lock(&self, operation: &str) -> StoreResult<MutexGuard<'_, LocalData>> {
        self.data.try_lock_for(self.lock_timeout).ok_or_else(|| {
            StoreError::busy_with_context(
                format!("lock not acquired within {:?}", self.lock_timeout),
                ErrorContext::new(operation),
            )
        })
    }

    fn check_health(data: &LocalData, operation: &str) -> StoreResult<()> {
        if !data.is_healthy {
            return Err(StoreError::unavailable_with_context(
                "store is not healthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OccupancyLogRepository for LocalStore {
    async fn health_check(&self) -> StoreResult<bool> {
        Ok(self.lock("health_check")?.is_healthy)
    }

    async fn apply_observation(&self, new: NewOccupancyRecord) -> StoreResult<ApplyOutcome> {
        let mut data = self.lock("apply_observation")?;
        Self::check_health(&data, "apply_observation")?;

        // Duplicate check inside the critical section: concurrent
        // re-deliveries of the same image resolve to exactly one commit.
        if let Some(id) = new.source_image_id.as_deref() {
            if let Some(&idx) = data.by_source.get(id) {
                return Ok(ApplyOutcome {
                    record: data.records[idx].clone(),
                    duplicate: true,
                });
            }
        }

        let sequence = data.next_sequence;
        data.next_sequence += 1;

        let record = OccupancyRecord::from_new(new, sequence);
        data.summary.increment(
            record.location_type,
            record.date,
            record.hour_bucket,
            u64::from(record.vehicle_count),
        );
        if let Some(id) = record.source_image_id.clone() {
            let idx = data.records.len();
            data.by_source.insert(id, idx);
        }
        data.records.push(record.clone());

        Ok(ApplyOutcome {
            record,
            duplicate: false,
        })
    }

    async fn find_by_source_image(
        &self,
        source_image_id: &str,
    ) -> StoreResult<Option<OccupancyRecord>> {
        let data = self.lock("find_by_source_image")?;
        Ok(data
            .by_source
            .get(source_image_id)
            .map(|&idx| data.records[idx].clone()))
    }

    async fn fetch_records(&self) -> StoreResult<Vec<OccupancyRecord>> {
        Ok(self.lock("fetch_records")?.records.clone())
    }

    async fn record_count(&self) -> StoreResult<usize> {
        Ok(self.lock("record_count")?.records.len())
    }
}

#[async_trait]
impl PopularTimesRepository for LocalStore {
    async fn fetch_popular_times(
        &self,
        location_type: LocationType,
    ) -> StoreResult<PopularTimes> {
        Ok(self.lock("fetch_popular_times")?.summary.for_type(location_type))
    }

    async fn fetch_summary(&self) -> StoreResult<PopularTimesSummary> {
        Ok(self.lock("fetch_summary")?.summary.clone())
    }
}

#[async_trait]
impl MaintenanceRepository for LocalStore {
    async fn reset(&self, location_type: Option<LocationType>) -> StoreResult<usize> {
        let mut data = self.lock("reset")?;
        Self::check_health(&data, "reset")?;

        let removed = match location_type {
            Some(ty) => {
                let before = data.records.len();
                data.records.retain(|r| r.location_type != ty);
                data.summary.clear_type(ty);
                before - data.records.len()
            }
            None => {
                let before = data.records.len();
                data.records.clear();
                data.summary = PopularTimesSummary::new();
                before
            }
        };

        // Indices shift after a partial retain; rebuild the dedup index.
        data.by_source = data
            .records
            .iter()
            .enumerate()
            .filter_map(|(idx, r)| r.source_image_id.clone().map(|id| (id, idx)))
            .collect();

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_record(source: Option<&str>, count: u32) -> NewOccupancyRecord {
        NewOccupancyRecord {
            location_type: LocationType::Indoor,
            location_name: "North Wing".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            hour_bucket: "9am".parse().unwrap(),
            vehicle_count: count,
            source_image_id: source.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_apply_assigns_monotonic_sequence() {
        let store = LocalStore::new();

        let first = store.apply_observation(new_record(None, 3)).await.unwrap();
        let second = store.apply_observation(new_record(None, 5)).await.unwrap();

        assert!(second.record.ingested_at > first.record.ingested_at);
        assert_eq!(store.record_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_source_image_is_noop() {
        let store = LocalStore::new();

        let first = store
            .apply_observation(new_record(Some("img-1"), 4))
            .await
            .unwrap();
        let replay = store
            .apply_observation(new_record(Some("img-1"), 4))
            .await
            .unwrap();

        assert!(!first.duplicate);
        assert!(replay.duplicate);
        assert_eq!(replay.record, first.record);
        assert_eq!(store.record_count().await.unwrap(), 1);

        let summary = store.fetch_summary().await.unwrap();
        assert_eq!(
            summary.total_for(
                LocationType::Indoor,
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                "9am".parse().unwrap()
            ),
            4
        );
    }

    #[tokio::test]
    async fn test_unhealthy_store_rejects_writes() {
        let store = LocalStore::new();
        store.set_healthy(false);

        let result = store.apply_observation(new_record(None, 1)).await;
        assert!(matches!(result, Err(StoreError::Unavailable { .. })));
        assert!(!store.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_single_type_rebuilds_dedup_index() {
        let store = LocalStore::new();

        store
            .apply_observation(new_record(Some("img-1"), 2))
            .await
            .unwrap();
        let mut outdoor = new_record(Some("img-2"), 7);
        outdoor.location_type = LocationType::Outdoor;
        outdoor.location_name = "Outdoor".to_string();
        store.apply_observation(outdoor.clone()).await.unwrap();

        let removed = store.reset(Some(LocationType::Indoor)).await.unwrap();
        assert_eq!(removed, 1);

        // Outdoor record survives and its dedup entry still resolves.
        assert!(store
            .find_by_source_image("img-2")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_by_source_image("img-1")
            .await
            .unwrap()
            .is_none());

        // The indoor record can be ingested again after the reset.
        let again = store
            .apply_observation(new_record(Some("img-1"), 2))
            .await
            .unwrap();
        assert!(!again.duplicate);
    }

    #[tokio::test]
    async fn test_reset_all_clears_both_views() {
        let store = LocalStore::new();
        store.apply_observation(new_record(None, 3)).await.unwrap();

        let removed = store.reset(None).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.record_count().await.unwrap(), 0);
        assert_eq!(store.fetch_summary().await.unwrap(), PopularTimesSummary::new());
    }
}
