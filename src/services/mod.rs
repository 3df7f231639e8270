//! Service layer for business logic and orchestration.
//!
//! This module contains the services that sit between the statistics store
//! and the transport layer. The aggregation service is the single ingest
//! path shared by the online upload endpoint and offline batch replay, so
//! both produce identical persisted state for identical inputs.

pub mod aggregation;

pub mod batch;

#[cfg(feature = "http-server")]
pub mod job_tracker;

pub use aggregation::{AggregationService, IngestError};
pub use batch::{BatchFailure, BatchIngestor, BatchItem, BatchReport, CancelFlag};
