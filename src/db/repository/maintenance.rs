//! Maintenance repository trait: explicit reset of the persisted views.

use async_trait::async_trait;

use super::error::StoreResult;
use crate::models::LocationType;

/// Repository trait for maintenance operations.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    /// Clear the occupancy log and the popular-times summary together.
    ///
    /// With `Some(location_type)` only that type's records and summary
    /// cells are removed; with `None` everything is cleared. Both views
    /// are cleared as one unit so the summary invariant holds afterwards.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of log records removed
    async fn reset(&self, location_type: Option<LocationType>) -> StoreResult<usize>;
}
