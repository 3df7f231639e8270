//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::StoreError;
use crate::detector::DetectorError;
use crate::services::IngestError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// The detector collaborator failed
    Detector(DetectorError),
    /// Ingest pipeline error
    Ingest(IngestError),
    /// Store error outside the ingest path
    Store(StoreError),
    /// Internal server error
    Internal(String),
}

fn store_response(e: StoreError) -> (StatusCode, ApiError) {
    match e {
        StoreError::Busy { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            ApiError::new("STORE_BUSY", e.to_string()),
        ),
        StoreError::Unavailable { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            ApiError::new("STORE_UNAVAILABLE", e.to_string()),
        ),
        StoreError::NotFound { .. } => {
            (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", e.to_string()))
        }
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("STORE_ERROR", e.to_string()),
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Detector(e) => (
                StatusCode::BAD_GATEWAY,
                ApiError::new("DETECTOR_ERROR", e.to_string()),
            ),
            AppError::Ingest(e) => match e {
                IngestError::InvalidObservation(msg) => (
                    StatusCode::BAD_REQUEST,
                    ApiError::new("INVALID_OBSERVATION", msg),
                ),
                IngestError::InvalidTimeFormat(e) => (
                    StatusCode::BAD_REQUEST,
                    ApiError::new("INVALID_TIME_FORMAT", e.to_string()),
                ),
                IngestError::Store(e) => store_response(e),
            },
            AppError::Store(e) => store_response(e),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        AppError::Ingest(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<DetectorError> for AppError {
    fn from(err: DetectorError) -> Self {
        AppError::Detector(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
