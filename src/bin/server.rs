//! SPS HTTP Server Binary
//!
//! This is the main entry point for the parking-occupancy REST API server.
//! It initializes the statistics store, sets up the HTTP router, and starts
//! serving requests.
//!
//! # Usage
//!
//! ```bash
//! # Run with the in-memory store (default)
//! cargo run --bin sps-server --features "local-repo,http-server"
//!
//! # Run with the durable JSON-document store
//! SPS_DATA_DIR=./data \
//!   cargo run --bin sps-server --features "json-repo,http-server"
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `STORE_TYPE`: Store backend, "json" or "local" (default: json when
//!   `SPS_DATA_DIR` is set, local otherwise)
//! - `SPS_DATA_DIR`: Data directory for the JSON store
//! - `SPS_LOCK_TIMEOUT_MS`: Bound on store lock acquisition
//! - `SPS_FIXED_COUNT`: Count returned by the built-in fixed detector
//!   (default: 0; deployments register their real model integration)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sps_rust::db;
use sps_rust::detector::{DetectorRegistry, FixedCountDetector};
use sps_rust::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting SPS HTTP Server");

    // Initialize global store once and reuse it across the app
    db::init_store().map_err(|e| anyhow::anyhow!(e))?;
    let store = std::sync::Arc::clone(db::get_store()?);
    info!("Store initialized successfully");

    // The deterministic detector stands in until a model runtime is wired
    // in; deployments register theirs under its model name.
    let fixed_count: u32 = env::var("SPS_FIXED_COUNT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let detectors = Arc::new(DetectorRegistry::new(
        "fixed",
        Arc::new(FixedCountDetector::new(fixed_count)),
    ));

    // Create application state
    let state = AppState::new(store, detectors);

    // Create router with all endpoints
    let app = create_router(state);

    // Determine bind address
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);
    info!("API documentation: http://{}/health", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// Store initialization is handled by `db::init_store()`.
