//! Occupancy-log repository trait: the ingest commit path.
//!
//! The occupancy log is the authoritative, append-only view. Committing an
//! observation appends a log record and increments the matching
//! popular-times cell as one transactional unit.

use async_trait::async_trait;

use super::error::StoreResult;
use crate::api::{ApplyOutcome, NewOccupancyRecord, OccupancyRecord};

/// Repository trait for the append-only occupancy log.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
///
/// # Consistency
/// `apply_observation` is the only mutating entry point of the ingest path.
/// Implementations must guarantee that the log append and the summary
/// increment commit together or not at all, and that increments to the same
/// `(location_type, date, hour_bucket)` key are linearizable: after any set
/// of successful applies, the summary cell equals the sum of the committed
/// deltas regardless of arrival order.
#[async_trait]
pub trait OccupancyLogRepository: Send + Sync {
    /// Check if the store backing is healthy.
    ///
    /// # Returns
    /// - `Ok(true)` if the store is usable
    /// - `Ok(false)` if unhealthy but no error occurred
    /// - `Err(StoreError)` if an error occurred during the check
    async fn health_check(&self) -> StoreResult<bool>;

    /// Commit one observation: append to the log and increment the summary
    /// as a single unit, assigning the `ingested_at` sequence number.
    ///
    /// When `new.source_image_id` matches an already committed record, the
    /// call is an idempotent no-op returning that record with
    /// `duplicate == true`. The duplicate check happens inside the same
    /// critical section as the commit, so concurrent re-deliveries cannot
    /// double-count.
    ///
    /// # Arguments
    /// * `new` - The validated, canonicalized record to commit
    ///
    /// # Returns
    /// * `Ok(ApplyOutcome)` - The committed (or previously committed) record
    /// * `Err(StoreError::Busy)` - Lock acquisition timed out; retriable
    /// * `Err(StoreError::Unavailable)` - Persist failed; nothing committed
    async fn apply_observation(&self, new: NewOccupancyRecord) -> StoreResult<ApplyOutcome>;

    /// Look up a committed record by its source image id.
    ///
    /// # Returns
    /// * `Ok(Some(record))` - A record with that id was committed
    /// * `Ok(None)` - No such record
    async fn find_by_source_image(&self, source_image_id: &str)
        -> StoreResult<Option<OccupancyRecord>>;

    /// Fetch the full occupancy log in append order.
    async fn fetch_records(&self) -> StoreResult<Vec<OccupancyRecord>>;

    /// Number of committed records.
    async fn record_count(&self) -> StoreResult<usize>;
}
