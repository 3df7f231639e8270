//! Shared data models re-exported for store-layer consumers, plus the
//! shapes of the persisted documents.

pub use crate::api::{
    ApplyOutcome, NewOccupancyRecord, Observation, OccupancyRecord, PopularTimes,
    PopularTimesSummary,
};
pub use crate::models::{HourBucket, LocationType};

use serde::{Deserialize, Serialize};

/// File name of the combined occupancy document.
pub const COMBINED_DOCUMENT: &str = "combined_occupancy.json";

/// The combined occupancy document: the full append-only log plus the
/// merged popular-times summary.
///
/// This is the authoritative persisted unit. The per-type
/// `popular_times_<type>.json` documents are projections of it and are
/// rebuilt from `occupancy_data` whenever they disagree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedDocument {
    #[serde(default)]
    pub occupancy_data: Vec<OccupancyRecord>,
    #[serde(default)]
    pub popular_times: PopularTimesSummary,
}
