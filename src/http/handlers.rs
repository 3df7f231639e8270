//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! aggregation service, the store traits, or the job tracker for business
//! logic.

use axum::{
    extract::{Multipart, Path, Query, State},
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;

use super::dto::{
    CombinedDocument, HealthResponse, IngestResponse, JobStatusResponse, PopularTimes,
    ReplayRequest, ReplayResponse, ResetQuery, ResetResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::Observation;
use crate::db::image_checksum;
use crate::db::repository::{MaintenanceRepository, OccupancyLogRepository, PopularTimesRepository};
use crate::models::LocationType;
use crate::services::job_tracker::{JobStatus, LogLevel};
use crate::services::BatchIngestor;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is
/// accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let store_status = match state.store.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        store: store_status,
    }))
}

// =============================================================================
// Observation Ingest
// =============================================================================

/// POST /v1/observations
///
/// Ingest one uploaded image: run the selected detector, classify and
/// bucket the metadata, and commit the observation. Multipart fields:
/// `image` (binary), `location`, `date`, `time`, optional `model`,
/// optional `source_image_id`.
pub async fn ingest_observation(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> HandlerResult<IngestResponse> {
    let mut image: Option<Vec<u8>> = None;
    let mut location: Option<String> = None;
    let mut date: Option<String> = None;
    let mut time: Option<String> = None;
    let mut model: Option<String> = None;
    let mut source_image_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("unreadable image field: {}", e)))?;
                image = Some(bytes.to_vec());
            }
            "location" | "date" | "time" | "model" | "source_image_id" => {
                let value = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("unreadable field '{}': {}", name, e))
                })?;
                match name.as_str() {
                    "location" => location = Some(value),
                    "date" => date = Some(value),
                    "time" => time = Some(value),
                    "model" => model = Some(value),
                    _ => source_image_id = Some(value),
                }
            }
            // Unknown fields are ignored so older frontends keep working.
            _ => {}
        }
    }

    let image = image.ok_or_else(|| AppError::BadRequest("missing field: image".to_string()))?;
    let location =
        location.ok_or_else(|| AppError::BadRequest("missing field: location".to_string()))?;
    let date = date.ok_or_else(|| AppError::BadRequest("missing field: date".to_string()))?;
    let time = time.ok_or_else(|| AppError::BadRequest("missing field: time".to_string()))?;

    let date = date
        .parse()
        .map_err(|_| AppError::BadRequest(format!("date must be ISO 8601 (YYYY-MM-DD): {}", date)))?;

    let detector = state.detectors.select(model.as_deref()).ok_or_else(|| {
        AppError::BadRequest(format!(
            "unknown model: {}",
            model.as_deref().unwrap_or_default()
        ))
    })?;
    let detection = detector.detect(&image).await?;

    // Derive a stable identity from the image content when the uploader
    // supplied none, so transparent upload retries stay idempotent.
    let source_image_id = source_image_id.unwrap_or_else(|| image_checksum(&image));

    let observation = Observation {
        raw_location: location,
        raw_time: time,
        date,
        vehicle_count: i64::from(detection.vehicle_count),
        source_image_id: Some(source_image_id),
    };

    let outcome = state.aggregator.ingest(&observation).await?;

    Ok(Json(IngestResponse {
        success: true,
        count: outcome.record.vehicle_count,
    }))
}

// =============================================================================
// Statistics Views
// =============================================================================

/// GET /v1/popular-times/{location_type}
///
/// The per-type popular-times view (`date -> hour -> total`).
pub async fn get_popular_times(
    State(state): State<AppState>,
    Path(location_type): Path<String>,
) -> HandlerResult<PopularTimes> {
    let location_type: LocationType = location_type
        .parse()
        .map_err(AppError::BadRequest)?;

    let view = state.store.fetch_popular_times(location_type).await?;
    Ok(Json(view))
}

/// GET /v1/occupancy
///
/// The combined occupancy view: the full log plus the merged summary.
pub async fn get_occupancy(State(state): State<AppState>) -> HandlerResult<CombinedDocument> {
    let occupancy_data = state.store.fetch_records().await?;
    let popular_times = state.store.fetch_summary().await?;

    Ok(Json(CombinedDocument {
        occupancy_data,
        popular_times,
    }))
}

// =============================================================================
// Batch Replay Jobs
// =============================================================================

/// POST /v1/replay
///
/// Start an asynchronous batch replay. Returns a job ID for tracking
/// progress.
pub async fn start_replay(
    State(state): State<AppState>,
    Json(request): Json<ReplayRequest>,
) -> Result<(axum::http::StatusCode, Json<ReplayResponse>), AppError> {
    let job_id = state.job_tracker.create_job();
    let response_job_id = job_id.clone();

    let tracker = state.job_tracker.clone();
    let cancel = tracker
        .cancel_flag(&job_id)
        .ok_or_else(|| AppError::Internal("job vanished before start".to_string()))?;
    let ingestor = BatchIngestor::new(state.aggregator.clone());
    let items = request.items;

    tokio::spawn(async move {
        tracker.log(
            &job_id,
            LogLevel::Info,
            format!("Replaying {} dataset items...", items.len()),
        );

        let report = ingestor.run(&items, &cancel).await;

        tracker.log(
            &job_id,
            if report.failures.is_empty() {
                LogLevel::Success
            } else {
                LogLevel::Warning
            },
            format!(
                "Replay finished: {} ingested, {} duplicates skipped, {} failures",
                report.ingested,
                report.skipped_duplicates,
                report.failures.len()
            ),
        );

        let cancelled = report.cancelled;
        let result = serde_json::to_value(report).ok();
        if cancelled {
            tracker.mark_cancelled(&job_id, result);
        } else {
            tracker.complete_job(&job_id, result);
        }
    });

    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(ReplayResponse {
            job_id: response_job_id.clone(),
            message: format!(
                "Replay started. Track progress at /v1/jobs/{}/logs",
                response_job_id
            ),
        }),
    ))
}

/// GET /v1/jobs/{job_id}
///
/// Get the current status and logs of a background job.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> HandlerResult<JobStatusResponse> {
    let job = state
        .job_tracker
        .get_job(&job_id)
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))?;

    Ok(Json(JobStatusResponse {
        job_id: job.job_id,
        status: format!("{:?}", job.status).to_lowercase(),
        logs: job.logs,
        result: job.result,
    }))
}

/// POST /v1/jobs/{job_id}/cancel
///
/// Request cooperative cancellation of a running replay job.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> HandlerResult<JobStatusResponse> {
    if state.job_tracker.get_job(&job_id).is_none() {
        return Err(AppError::NotFound(format!("Job {} not found", job_id)));
    }

    if !state.job_tracker.request_cancel(&job_id) {
        return Err(AppError::BadRequest(format!(
            "Job {} is not running",
            job_id
        )));
    }

    get_job_status(State(state), Path(job_id)).await
}

/// GET /v1/jobs/{job_id}/logs
///
/// Stream job logs via Server-Sent Events (SSE).
pub async fn stream_job_logs(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    // Verify job exists
    if state.job_tracker.get_job(&job_id).is_none() {
        return Err(AppError::NotFound(format!("Job {} not found", job_id)));
    }

    let tracker = state.job_tracker.clone();
    let stream = async_stream::stream! {
        let mut last_log_count = 0;
        loop {
            // Get current logs
            let logs = tracker.get_logs(&job_id);

            // Send new logs since last check
            for log in logs.iter().skip(last_log_count) {
                let event_data = serde_json::to_string(log).unwrap_or_default();
                yield Ok(Event::default().data(event_data));
            }
            last_log_count = logs.len();

            // Check if job is complete
            if let Some(job) = tracker.get_job(&job_id) {
                if job.status != JobStatus::Running {
                    // Send final status event with serde's lowercase status
                    // values ("completed", "failed", "cancelled")
                    let final_event = serde_json::json!({
                        "status": job.status,
                        "result": job.result,
                    });
                    yield Ok(Event::default()
                        .event("complete")
                        .data(serde_json::to_string(&final_event).unwrap_or_default()));
                    break;
                }
            } else {
                break;
            }

            // Wait before checking again
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    };

    Ok(Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    ))
}

// =============================================================================
// Maintenance
// =============================================================================

/// POST /v1/reset
///
/// Clear the occupancy log and popular-times summary, optionally for one
/// location type only.
pub async fn reset(
    State(state): State<AppState>,
    Query(query): Query<ResetQuery>,
) -> HandlerResult<ResetResponse> {
    let location_type = match query.location_type.as_deref() {
        Some(raw) => Some(raw.parse::<LocationType>().map_err(AppError::BadRequest)?),
        None => None,
    };

    let records_removed = state.store.reset(location_type).await?;

    Ok(Json(ResetResponse {
        success: true,
        records_removed,
    }))
}
