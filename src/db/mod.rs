//! Statistics-store module for occupancy data.
//!
//! This module provides abstractions for the persisted occupancy views via
//! the Repository pattern, allowing different storage backends to be
//! swapped easily.
//!
//! # Architecture
//!
//! The store module follows a layered architecture:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (REST API, batch replay)             │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services/) - Business Logic             │
//! │  - Observation validation and canonicalization           │
//! │  - Batch replay orchestration                            │
//! └───────────────────┬─────────────────────────────────────┘
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Store Traits (repository/) - Abstract Interface        │
//! │  - OccupancyLogRepository (ingest commit path)           │
//! │  - PopularTimesRepository (summary reads)                │
//! │  - MaintenanceRepository (reset)                         │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴────────────────┐
//!     │                                 │
//! ┌───▼──────────────┐     ┌──────────▼──────────────┐
//! │ Json Store       │     │ Local Store             │
//! │ (JSON documents) │     │ (in-memory)             │
//! └──────────────────┘     └─────────────────────────┘
//! ```
//!
//! # Consistency
//!
//! The combined occupancy document is the transactional unit: one ingest
//! appends a log record and increments the popular-times summary together
//! or not at all. Every read-modify-write cycle runs under a bounded
//! exclusive lock (`StoreError::Busy` on timeout) so a stalled writer
//! cannot wedge the service, and increments to the same key are
//! linearizable.

// Feature flag guard: at least one backend must be enabled.
#[cfg(not(any(feature = "json-repo", feature = "local-repo")))]
compile_error!("Enable at least one store backend feature.");

pub mod checksum;
pub mod factory;
pub mod models;
pub mod repositories;
pub mod repository;
pub mod store_config;

// JSON backend config is colocated with the store implementation.
#[cfg(feature = "json-repo")]
pub use repositories::{JsonStore, JsonStoreConfig};
#[cfg(not(feature = "json-repo"))]
#[derive(Debug, Clone)]
pub struct JsonStoreConfig {
    _private: (),
}

pub use checksum::image_checksum;
pub use store_config::StoreConfig;

// Store trait and implementations
pub use factory::{StoreBuilder, StoreFactory, StoreType};
pub use repositories::LocalStore;
pub use repository::{
    ErrorContext, FullStore, MaintenanceRepository, OccupancyLogRepository,
    PopularTimesRepository, StoreError, StoreResult,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global store instance initialized once per process.
static STORE: OnceLock<Arc<dyn FullStore>> = OnceLock::new();

fn create_selected_store() -> StoreResult<Arc<dyn FullStore>> {
    StoreFactory::from_env()
}

/// Initialize the global store singleton for the selected backend.
pub fn init_store() -> Result<()> {
    if STORE.get().is_some() {
        return Ok(());
    }

    let store = create_selected_store().map_err(|e| anyhow::Error::msg(e.to_string()))?;
    let _ = STORE.set(store);
    Ok(())
}

/// Get a reference to the global store instance.
pub fn get_store() -> Result<&'static Arc<dyn FullStore>> {
    if STORE.get().is_none() {
        let _ = init_store();
    }

    STORE
        .get()
        .context("Store not initialized. Call init_store() first.")
}
