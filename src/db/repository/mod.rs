//! Repository trait definitions for the statistics store.
//!
//! This module provides a collection of focused traits that abstract the
//! persisted occupancy views. By splitting responsibilities across multiple
//! traits, implementations can be more focused and testable.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for store operations
//! - [`log`]: The append-only occupancy log and the ingest commit path
//! - [`summary`]: Read access to the derived popular-times summary
//! - [`maintenance`]: Explicit reset of the persisted views
//!
//! # Trait Composition
//!
//! A complete store implementation implements all traits:
//!
//! ```ignore
//! impl OccupancyLogRepository for MyStore { ... }
//! impl PopularTimesRepository for MyStore { ... }
//! impl MaintenanceRepository for MyStore { ... }
//! ```
//!
//! For functions that need all store capabilities, use the [`FullStore`]
//! trait bound:
//!
//! ```ignore
//! async fn my_service<S: FullStore>(store: &S) -> StoreResult<()> {
//!     store.apply_observation(new_record).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod log;
pub mod maintenance;
pub mod summary;

// Re-export error types
pub use error::{ErrorContext, StoreError, StoreResult};

// Re-export all traits
pub use log::OccupancyLogRepository;
pub use maintenance::MaintenanceRepository;
pub use summary::PopularTimesRepository;

/// Composite trait bound for a complete statistics store.
///
/// Automatically implemented for any type that implements all three store
/// traits. Use this as a convenient bound when you need access to the log,
/// the summary, and maintenance operations together.
pub trait FullStore:
    OccupancyLogRepository + PopularTimesRepository + MaintenanceRepository
{
}

// Blanket implementation: any type implementing all three traits automatically implements FullStore
impl<T> FullStore for T where
    T: OccupancyLogRepository + PopularTimesRepository + MaintenanceRepository
{
}
