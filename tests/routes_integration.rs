//! Router-level integration tests exercising the HTTP API end to end
//! against the in-memory store.

#![cfg(feature = "http-server")]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sps_rust::db::repositories::LocalStore;
use sps_rust::db::repository::FullStore;
use sps_rust::detector::{DetectorRegistry, FixedCountDetector};
use sps_rust::http::{create_router, AppState};
use tower::ServiceExt;

const BOUNDARY: &str = "sps-test-boundary";

fn test_router() -> Router {
    let store = Arc::new(LocalStore::new()) as Arc<dyn FullStore>;
    let detectors = Arc::new(
        DetectorRegistry::new("fixed", Arc::new(FixedCountDetector::new(4)))
            .register("empty-lot", Arc::new(FixedCountDetector::new(0))),
    );
    create_router(AppState::new(store, detectors))
}

fn multipart_body(fields: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        if *name == "image" {
            body.extend_from_slice(
                b"Content-Disposition: form-data; name=\"image\"; filename=\"frame.jpg\"\r\n\
                  Content-Type: application/octet-stream\r\n\r\n",
            );
        } else {
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            );
        }
        body.extend_from_slice(value);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(fields: &[(&str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/observations")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields)))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let router = test_router();

    let response = router.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"], "connected");
}

#[tokio::test]
async fn test_upload_commits_and_redelivery_is_noop() {
    let router = test_router();
    let fields: Vec<(&str, &[u8])> = vec![
        ("image", b"fake-jpeg-bytes"),
        ("location", b"P3 - North Wing"),
        ("date", b"2025-03-01"),
        ("time", b"09:15"),
    ];

    let response = router.clone().oneshot(upload_request(&fields)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["count"], 4);

    // Same image bytes again: the derived source id makes the retry a no-op.
    let response = router.clone().oneshot(upload_request(&fields)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["count"], 4);

    let response = router.oneshot(get_request("/v1/occupancy")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["occupancy_data"].as_array().unwrap().len(), 1);
    assert_eq!(json["occupancy_data"][0]["location"], "North Wing");
    assert_eq!(json["occupancy_data"][0]["time"], "9am");
    assert_eq!(json["popular_times"]["Indoor"]["2025-03-01"]["9am"], 4);
}

#[tokio::test]
async fn test_upload_with_named_model() {
    let router = test_router();
    let fields: Vec<(&str, &[u8])> = vec![
        ("image", b"fake-jpeg-bytes"),
        ("location", b"P3 - North Wing"),
        ("date", b"2025-03-01"),
        ("time", b"09:15"),
        ("model", b"empty-lot"),
    ];

    let response = router.oneshot(upload_request(&fields)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_upload_error_responses() {
    let router = test_router();

    // Unparseable hour
    let fields: Vec<(&str, &[u8])> = vec![
        ("image", b"fake-jpeg-bytes"),
        ("location", b"P3 - North Wing"),
        ("date", b"2025-03-01"),
        ("time", b"25:00"),
    ];
    let response = router.clone().oneshot(upload_request(&fields)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_TIME_FORMAT");

    // Unknown detector model
    let fields: Vec<(&str, &[u8])> = vec![
        ("image", b"fake-jpeg-bytes"),
        ("location", b"P3 - North Wing"),
        ("date", b"2025-03-01"),
        ("time", b"09:15"),
        ("model", b"yolo-99"),
    ];
    let response = router.clone().oneshot(upload_request(&fields)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");

    // Missing image field
    let fields: Vec<(&str, &[u8])> = vec![
        ("location", b"P3 - North Wing"),
        ("date", b"2025-03-01"),
        ("time", b"09:15"),
    ];
    let response = router.oneshot(upload_request(&fields)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_popular_times_endpoint_validates_type() {
    let router = test_router();

    let response = router
        .clone()
        .oneshot(get_request("/v1/popular-times/indoor"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(get_request("/v1/popular-times/garage"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reset_clears_views() {
    let router = test_router();
    let fields: Vec<(&str, &[u8])> = vec![
        ("image", b"fake-jpeg-bytes"),
        ("location", b"P3 - North Wing"),
        ("date", b"2025-03-01"),
        ("time", b"09:15"),
    ];
    router.clone().oneshot(upload_request(&fields)).await.unwrap();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/reset")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["records_removed"], 1);

    let response = router.oneshot(get_request("/v1/occupancy")).await.unwrap();
    let json = body_json(response).await;
    assert!(json["occupancy_data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_replay_job_runs_to_completion() {
    let router = test_router();

    let items = serde_json::json!({
        "items": [
            {
                "image_ref": "archive/cam1/0800.jpg",
                "vehicle_count": 3,
                "raw_location": "P1 - Block A",
                "raw_time": "8am",
                "date": "2025-03-01"
            },
            {
                "image_ref": "archive/cam1/0900.jpg",
                "vehicle_count": -1,
                "raw_location": "P1 - Block A",
                "raw_time": "9am",
                "date": "2025-03-01"
            }
        ]
    });

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/replay")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(items.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    let job_id = json["job_id"].as_str().unwrap().to_string();

    // Poll the job until the background task finishes.
    let mut status = String::new();
    let mut result = Value::Null;
    for _ in 0..100 {
        let response = router
            .clone()
            .oneshot(get_request(&format!("/v1/jobs/{job_id}")))
            .await
            .unwrap();
        let json = body_json(response).await;
        status = json["status"].as_str().unwrap().to_string();
        result = json["result"].clone();
        if status != "running" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(status, "completed");
    assert_eq!(result["ingested"], 1);
    assert_eq!(result["failures"].as_array().unwrap().len(), 1);

    // The unknown job id path still 404s.
    let response = router
        .oneshot(get_request("/v1/jobs/not-a-job"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
