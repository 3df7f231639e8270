//! # Smart Parking System Backend
//!
//! Vehicle-occupancy aggregation engine for a multi-level parking facility.
//!
//! This crate ingests per-image vehicle-count observations (produced by an
//! external object-detection model) and folds them into durable occupancy
//! statistics, bucketed by location type (indoor/outdoor), named zone,
//! calendar date, and hour-of-day. The REST API is exposed via Axum for the
//! React frontend.
//!
//! ## Features
//!
//! - **Ingestion**: a single aggregation path shared by the online upload
//!   endpoint and offline batch replay
//! - **Canonical Keys**: total, deterministic hour bucketing and location
//!   classification
//! - **Persistence**: append-only occupancy log plus a derived "popular
//!   times" summary, committed together
//! - **Idempotency**: duplicate deliveries resolved by `source_image_id`
//! - **HTTP API**: RESTful endpoints for uploads, statistics, and batch
//!   replay jobs
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: shared domain and Data Transfer Object (DTO) types
//! - [`models`]: canonical-key types (hour buckets, location classification)
//! - [`db`]: statistics store, repository pattern, and persistence layer
//! - [`detector`]: the vehicle-detector capability the ingest path depends on
//! - [`services`]: aggregation, batch replay, and job tracking
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - StoreError carries rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;
pub mod detector;
pub mod models;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
