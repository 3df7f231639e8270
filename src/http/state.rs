//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullStore;
use crate::detector::DetectorRegistry;
use crate::services::job_tracker::JobTracker;
use crate::services::AggregationService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Store instance backing the occupancy documents
    pub store: Arc<dyn FullStore>,
    /// The single ingest path shared with batch replay
    pub aggregator: Arc<AggregationService>,
    /// Named detector models available to the upload endpoint
    pub detectors: Arc<DetectorRegistry>,
    /// Tracker for background replay jobs
    pub job_tracker: JobTracker,
}

impl AppState {
    /// Create a new application state with the given store and detectors.
    pub fn new(store: Arc<dyn FullStore>, detectors: Arc<DetectorRegistry>) -> Self {
        let aggregator = Arc::new(AggregationService::new(store.clone()));
        Self {
            store,
            aggregator,
            detectors,
            job_tracker: JobTracker::new(),
        }
    }
}
