//! Durable JSON-document statistics store.
//!
//! Persists the occupancy views as JSON documents under a data directory:
//!
//! - `combined_occupancy.json`: the append-only log plus the merged
//!   popular-times summary (the authoritative transactional unit)
//! - `popular_times_indoor.json` / `popular_times_outdoor.json`: per-type
//!   projections (`date -> hour -> total`) consumed by the frontend
//!
//! Every commit serializes the updated state and replaces the documents
//! with a write-to-temp-then-rename, so the log append and the summary
//! increment become durable together or not at all. In-memory state is
//! rolled back when the persist fails, which keeps "nothing partial is
//! committed" true for callers. On open, the summary is replayed from the
//! log and any stale document is rewritten; that replay is the
//! crash-recovery path.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use log::{info, warn};
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;

use crate::api::{
    ApplyOutcome, NewOccupancyRecord, OccupancyRecord, PopularTimes, PopularTimesSummary,
};
use crate::db::models::{CombinedDocument, COMBINED_DOCUMENT};
use crate::db::repository::{
    ErrorContext, MaintenanceRepository, OccupancyLogRepository, PopularTimesRepository,
    StoreError, StoreResult,
};
use crate::models::LocationType;

use super::local::DEFAULT_LOCK_TIMEOUT;

/// Configuration for the JSON-document store.
#[derive(Debug, Clone)]
pub struct JsonStoreConfig {
    /// Directory holding the occupancy documents.
    pub data_dir: PathBuf,
    /// Bound on lock acquisition before failing fast with `Busy`.
    pub lock_timeout: Duration,
}

impl JsonStoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }
}

/// Durable JSON-document statistics store.
pub struct JsonStore {
    data_dir: PathBuf,
    lock_timeout: Duration,
    state: Mutex<State>,
}

struct State {
    records: Vec<OccupancyRecord>,
    summary: PopularTimesSummary,
    // source_image_id -> index into records
    by_source: HashMap<String, usize>,
    next_sequence: u64,
}

impl State {
    fn from_records(records: Vec<OccupancyRecord>) -> Self {
        let summary = PopularTimesSummary::from_records(&records);
        let by_source = records
            .iter()
            .enumerate()
            .filter_map(|(idx, r)| r.source_image_id.clone().map(|id| (id, idx)))
            .collect();
        let next_sequence = records
            .iter()
            .map(|r| r.ingested_at)
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            records,
            summary,
            by_source,
            next_sequence,
        }
    }
}

impl JsonStore {
    /// Open (or initialize) a store at the configured data directory.
    ///
    /// Loads the combined document when present, replays the log into a
    /// fresh summary, and rewrites any document that disagrees with the
    /// replay, which heals a crash that interrupted a previous commit.
    ///
    /// # Errors
    /// * `StoreError::Unavailable` - the directory or document cannot be read
    /// * `StoreError::Corrupted` - the combined document does not decode
    pub fn open(config: JsonStoreConfig) -> StoreResult<Self> {
        fs::create_dir_all(&config.data_dir).map_err(|e| {
            StoreError::unavailable_with_context(
                e.to_string(),
                ErrorContext::new("open").with_details("create data directory"),
            )
        })?;

        let combined_path = config.data_dir.join(COMBINED_DOCUMENT);
        let document = if combined_path.exists() {
            let content = fs::read_to_string(&combined_path).map_err(|e| {
                StoreError::unavailable_with_context(
                    e.to_string(),
                    ErrorContext::new("open").with_document(COMBINED_DOCUMENT),
                )
            })?;
            serde_json::from_str::<CombinedDocument>(&content).map_err(|e| {
                StoreError::corrupted_with_context(
                    e.to_string(),
                    ErrorContext::new("open").with_document(COMBINED_DOCUMENT),
                )
            })?
        } else {
            CombinedDocument::default()
        };

        let persisted_summary = document.popular_times;
        let state = State::from_records(document.occupancy_data);

        let store = Self {
            data_dir: config.data_dir,
            lock_timeout: config.lock_timeout,
            state: Mutex::new(state),
        };

        {
            let state = store.state.lock();
            if persisted_summary != state.summary {
                warn!(
                    "popular-times summary disagrees with the occupancy log ({} records); rebuilding from the log",
                    state.records.len()
                );
            }
            // Rewrite unconditionally: also repairs missing or stale
            // per-type projections left behind by an interrupted commit.
            store.persist_all(&state)?;
            info!(
                "opened occupancy store at {} ({} records)",
                store.data_dir.display(),
                state.records.len()
            );
        }

        Ok(store)
    }

    /// Acquire the state lock within the configured bound.
    fn lock(&self, operation: &str) -> StoreResult<MutexGuard<'_, State>> {
        self.state.try_lock_for(self.lock_timeout).ok_or_else(|| {
            StoreError::busy_with_context(
                format!("lock not acquired within {:?}", self.lock_timeout),
                ErrorContext::new(operation),
            )
        })
    }

    /// Replace one document atomically (write temp file, then rename).
    fn write_document<T: Serialize>(&self, name: &str, value: &T) -> StoreResult<()> {
        let path = self.data_dir.join(name);
        let tmp = self.data_dir.join(format!("{name}.tmp"));
        let ctx = || ErrorContext::new("persist").with_document(name);

        let content = serde_json::to_string_pretty(value)
            .map_err(|e| StoreError::internal(format!("serialize {name}: {e}")))?;
        fs::write(&tmp, content)
            .map_err(|e| StoreError::unavailable_with_context(e.to_string(), ctx()))?;
        fs::rename(&tmp, &path)
            .map_err(|e| StoreError::unavailable_with_context(e.to_string(), ctx()))?;
        Ok(())
    }

    /// Persist the combined document first (the commit point), then the
    /// per-type projections.
    fn persist_all(&self, state: &State) -> StoreResult<()> {
        let combined = CombinedDocument {
            occupancy_data: state.records.clone(),
            popular_times: state.summary.clone(),
        };
        self.write_document(COMBINED_DOCUMENT, &combined)?;

        for location_type in LocationType::ALL {
            let view = state.summary.for_type(location_type);
            self.write_document(location_type.document_name(), &view)?;
        }
        Ok(())
    }

    /// Path of the combined document (exposed for integration tests).
    pub fn combined_document_path(&self) -> PathBuf {
        self.data_dir.join(COMBINED_DOCUMENT)
    }
}

#[async_trait]
impl OccupancyLogRepository for JsonStore {
    async fn health_check(&self) -> StoreResult<bool> {
        Ok(self.data_dir.is_dir())
    }

    async fn apply_observation(&self, new: NewOccupancyRecord) -> StoreResult<ApplyOutcome> {
        let mut state = self.lock("apply_observation")?;

        if let Some(id) = new.source_image_id.as_deref() {
            if let Some(&idx) = state.by_source.get(id) {
                return Ok(ApplyOutcome {
                    record: state.records[idx].clone(),
                    duplicate: true,
                });
            }
        }

        let record = OccupancyRecord::from_new(new, state.next_sequence);

        // Mutate, persist, and roll back on failure so a failed persist
        // commits nothing.
        let summary_snapshot = state.summary.clone();
        state.summary.increment(
            record.location_type,
            record.date,
            record.hour_bucket,
            u64::from(record.vehicle_count),
        );
        state.records.push(record.clone());

        if let Err(e) = self.persist_all(&state) {
            state.records.pop();
            state.summary = summary_snapshot;
            return Err(e.with_operation("apply_observation"));
        }

        state.next_sequence += 1;
        if let Some(id) = record.source_image_id.clone() {
            let idx = state.records.len() - 1;
            state.by_source.insert(id, idx);
        }

        Ok(ApplyOutcome {
            record,
            duplicate: false,
        })
    }

    async fn find_by_source_image(
        &self,
        source_image_id: &str,
    ) -> StoreResult<Option<OccupancyRecord>> {
        let state = self.lock("find_by_source_image")?;
        Ok(state
            .by_source
            .get(source_image_id)
            .map(|&idx| state.records[idx].clone()))
    }

    async fn fetch_records(&self) -> StoreResult<Vec<OccupancyRecord>> {
        Ok(self.lock("fetch_records")?.records.clone())
    }

    async fn record_count(&self) -> StoreResult<usize> {
        Ok(self.lock("record_count")?.records.len())
    }
}

#[async_trait]
impl PopularTimesRepository for JsonStore {
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
impl MaintenanceRepository for JsonStore {
    async fn reset(&self, location_type: Option<LocationType>) -> StoreResult<usize> {
        let mut state = self.lock("reset")?;

        let records_snapshot = state.records.clone();
        let summary_snapshot = state.summary.clone();

        let removed = match location_type {
            Some(ty) => {
                let before = state.records.len();
                state.records.retain(|r| r.location_type != ty);
                state.summary.clear_type(ty);
                before - state.records.len()
            }
            None => {
                let before = state.records.len();
                state.records.clear();
                state.summary = PopularTimesSummary::new();
                before
            }
        };

        if let Err(e) = self.persist_all(&state) {
            state.records = records_snapshot;
            state.summary = summary_snapshot;
            return Err(e.with_operation("reset"));
        }

        state.by_source = state
            .records
            .iter()
            .enumerate()
            .filter_map(|(idx, r)| r.source_image_id.clone().map(|id| (id, idx)))
            .collect();

        Ok(removed)
    }
}
