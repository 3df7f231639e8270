//! Popular-times repository trait for the derived summary views.

use async_trait::async_trait;

use super::error::StoreResult;
use crate::api::{PopularTimes, PopularTimesSummary};
use crate::models::LocationType;

/// Repository trait for reading the popular-times summary.
///
/// The summary is derived state: every cell equals the sum of
/// `vehicle_count` over all occupancy-log records with the same
/// `(location_type, date, hour_bucket)` key. Implementations keep it in
/// lockstep with the log (see
/// [`OccupancyLogRepository::apply_observation`](super::log::OccupancyLogRepository::apply_observation)).
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait PopularTimesRepository: Send + Sync {
    /// Fetch the per-type popular-times view (`date -> hour -> total`).
    ///
    /// # Arguments
    /// * `location_type` - Which per-type document to read
    ///
    /// # Returns
    /// * `Ok(PopularTimes)` - The view; empty when nothing was ingested
    async fn fetch_popular_times(&self, location_type: LocationType)
        -> StoreResult<PopularTimes>;

    /// Fetch the full merged summary across both location types.
    async fn fetch_summary(&self) -> StoreResult<PopularTimesSummary>;
}
