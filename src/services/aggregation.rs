//! Aggregation service: the single ingest path.
//!
//! One ingestion event is: validate the observation, derive its canonical
//! key (hour bucket + location classification), and commit the occupancy
//! record and summary increment through the store as one unit. Steps before
//! the store call are pure; the store call is the only persisted side
//! effect.

use std::sync::Arc;

use log::{debug, info};

use crate::api::{ApplyOutcome, NewOccupancyRecord, Observation};
use crate::db::repository::{FullStore, StoreError};
use crate::models::{classify, HourBucket, HourParseError};

/// Error type for one ingestion event.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The observation failed validation before any persistence attempt.
    #[error("invalid observation: {0}")]
    InvalidObservation(String),

    /// The raw time string has no parseable hour in `0..=23`.
    #[error(transparent)]
    InvalidTimeFormat(#[from] HourParseError),

    /// The store rejected the commit; nothing was persisted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates one ingestion event against an injected store.
pub struct AggregationService {
    store: Arc<dyn FullStore>,
}

impl AggregationService {
    pub fn new(store: Arc<dyn FullStore>) -> Self {
        Self { store }
    }

    /// The store this service commits to.
    pub fn store(&self) -> &Arc<dyn FullStore> {
        &self.store
    }

    /// Ingest one observation.
    ///
    /// Validation errors are returned before any persistence attempt. A
    /// re-delivered `source_image_id` resolves to an idempotent no-op
    /// (`duplicate == true`) carrying the previously committed record.
    pub async fn ingest(&self, observation: &Observation) -> Result<ApplyOutcome, IngestError> {
        if observation.vehicle_count < 0 {
            return Err(IngestError::InvalidObservation(format!(
                "vehicle_count must be non-negative, got {}",
                observation.vehicle_count
            )));
        }
        let vehicle_count = u32::try_from(observation.vehicle_count).map_err(|_| {
            IngestError::InvalidObservation(format!(
                "vehicle_count out of range: {}",
                observation.vehicle_count
            ))
        })?;

        let hour_bucket = HourBucket::bucket(&observation.raw_time)?;
        let (location_type, location_name) = classify(&observation.raw_location);

        let new = NewOccupancyRecord {
            location_type,
            location_name,
            date: observation.date,
            hour_bucket,
            vehicle_count,
            source_image_id: observation.source_image_id.clone(),
        };

        let outcome = self.store.apply_observation(new).await?;

        if outcome.duplicate {
            // Informational, not an error: re-delivery resolved as a no-op.
            info!(
                "duplicate observation for source image {:?} resolved as no-op",
                outcome.record.source_image_id
            );
        } else {
            debug!(
                "committed {} vehicles for {}/{} {} {}",
                outcome.record.vehicle_count,
                outcome.record.location_type,
                outcome.record.location_name,
                outcome.record.date,
                outcome.record.hour_bucket,
            );
        }

        Ok(outcome)
    }
}
