//! Data Transfer Objects for the HTTP API.
//!
//! These DTOs are used for request/response serialization in the REST API.
//! The persisted-view DTOs are re-exported from the core modules since they
//! already derive Serialize/Deserialize.

use serde::{Deserialize, Serialize};

// Re-export existing DTOs that are already serializable
pub use crate::api::{ApplyOutcome, Observation, OccupancyRecord, PopularTimes, PopularTimesSummary};
pub use crate::db::models::CombinedDocument;
pub use crate::services::{BatchFailure, BatchItem, BatchReport};

/// Response for a successfully ingested observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Always true for a committed (or idempotently re-delivered) upload
    pub success: bool,
    /// Vehicle count of the committed record
    pub count: u32,
}

/// Request body for starting a batch replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayRequest {
    /// Dataset entries in replay order
    pub items: Vec<BatchItem>,
}

/// Response for replay start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayResponse {
    /// Job ID for tracking the async processing
    pub job_id: String,
    /// Message about the operation
    pub message: String,
}

/// Job status response for async processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    /// Job ID
    pub job_id: String,
    /// Job status
    pub status: String,
    /// Log entries
    pub logs: Vec<crate::services::job_tracker::LogEntry>,
    /// Result if completed
    pub result: Option<serde_json::Value>,
}

/// Query parameters for the reset endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResetQuery {
    /// Restrict the reset to one location type (optional)
    #[serde(default)]
    pub location_type: Option<String>,
}

/// Response for the reset endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub success: bool,
    /// Number of log records removed
    pub records_removed: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Store connection status
    pub store: String,
}
