//! Batch replay of detection datasets.
//!
//! Replays an ordered collection of pre-counted detection results through
//! the aggregation service, e.g. to recompute statistics offline from an
//! archived dataset. Replay uses the exact same ingest path as the online
//! endpoint, so both agree on the persisted state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::api::Observation;

use super::aggregation::AggregationService;

/// One dataset entry: an image reference plus the detector's count and the
/// capture metadata derived from the dataset layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    /// Reference to the source image (path or object key). Doubles as the
    /// `source_image_id`, so replaying the same dataset twice is a no-op.
    pub image_ref: String,
    /// Vehicle count produced by the detector for this image.
    pub vehicle_count: i64,
    /// Folder-derived raw location string.
    pub raw_location: String,
    /// Raw time string (hour folder name or `"HH:MM"`).
    pub raw_time: String,
    /// Capture date.
    pub date: NaiveDate,
}

impl BatchItem {
    fn to_observation(&self) -> Observation {
        Observation {
            raw_location: self.raw_location.clone(),
            raw_time: self.raw_time.clone(),
            date: self.date,
            vehicle_count: self.vehicle_count,
            source_image_id: Some(self.image_ref.clone()),
        }
    }
}

/// One item that failed to ingest, with the error it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub image_ref: String,
    pub error: String,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Items committed as new records.
    pub ingested: usize,
    /// Items skipped as idempotent re-deliveries.
    pub skipped_duplicates: usize,
    /// Items that failed, in dataset order.
    pub failures: Vec<BatchFailure>,
    /// True when the run stopped early on a cancellation request.
    pub cancelled: bool,
}

/// Shared cancellation flag checked between batch items.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Replays datasets through the aggregation service.
pub struct BatchIngestor {
    service: Arc<AggregationService>,
}

impl BatchIngestor {
    pub fn new(service: Arc<AggregationService>) -> Self {
        Self { service }
    }

    /// Run a batch to completion, collecting per-item outcomes.
    ///
    /// Partial-failure semantics, not fail-fast: a failing item is recorded
    /// and the run continues with the next one. The cancel flag is checked
    /// between items; a single in-flight ingest is never interrupted.
    pub async fn run(&self, items: &[BatchItem], cancel: &CancelFlag) -> BatchReport {
        let mut report = BatchReport::default();

        for item in items {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            match self.service.ingest(&item.to_observation()).await {
                Ok(outcome) if outcome.duplicate => report.skipped_duplicates += 1,
                Ok(_) => report.ingested += 1,
                Err(e) => {
                    warn!("batch item {} failed: {}", item.image_ref, e);
                    report.failures.push(BatchFailure {
                        image_ref: item.image_ref.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }
}
