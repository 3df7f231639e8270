//! Canonical-key types for occupancy aggregation.
//!
//! Every observation is reduced to a canonical key before it touches the
//! store: an [`HourBucket`] derived from the raw time string and a
//! `(LocationType, name)` pair derived from the raw location string. Both
//! mappings are total and deterministic so that online ingestion and batch
//! replay agree bit-for-bit.

pub mod hour;
pub mod location;

pub use hour::{HourBucket, HourParseError};
pub use location::{classify, LocationType, OUTDOOR_ZONE};
