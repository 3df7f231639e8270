//! Public API surface for the Rust backend.
//!
//! This file consolidates the domain types shared between the store, the
//! service layer, and the HTTP API. All types derive Serialize/Deserialize
//! for JSON serialization, and the wire field names of persisted records
//! (`location`, `time`) match the occupancy documents consumed by the
//! frontend.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{HourBucket, LocationType};

/// One raw detection result awaiting classification and bucketing.
///
/// Observations are ephemeral: they are produced by the detector integration
/// per image and consumed immediately by
/// [`AggregationService::ingest`](crate::services::AggregationService::ingest),
/// never persisted as-is.
///
/// `vehicle_count` is signed on purpose: a misbehaving detector integration
/// is rejected by validation (`InvalidObservation`) instead of being made
/// unrepresentable at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Free-form location string, e.g. `"P3 - North Wing"`.
    pub raw_location: String,
    /// 24-hour `"HH:MM"` time string, or an already-bucketed label.
    pub raw_time: String,
    /// Calendar date the image was captured on.
    pub date: NaiveDate,
    /// Vehicle count reported by the detector.
    pub vehicle_count: i64,
    /// Stable identity of the source image, used for duplicate suppression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image_id: Option<String>,
}

/// A validated, canonicalized observation ready to be committed.
///
/// Built by the aggregation service from an [`Observation`]; the store
/// assigns the `ingested_at` sequence number when it commits the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOccupancyRecord {
    pub location_type: LocationType,
    pub location_name: String,
    pub date: NaiveDate,
    pub hour_bucket: HourBucket,
    pub vehicle_count: u32,
    pub source_image_id: Option<String>,
}

/// One committed entry of the append-only occupancy log.
///
/// Owned exclusively by the statistics store: never mutated after append,
/// only appended. `location` and `time` are the historical wire names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyRecord {
    pub location_type: LocationType,
    #[serde(rename = "location")]
    pub location_name: String,
    pub date: NaiveDate,
    #[serde(rename = "time")]
    pub hour_bucket: HourBucket,
    pub vehicle_count: u32,
    /// Monotonic per-store commit sequence number.
    pub ingested_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image_id: Option<String>,
}

impl OccupancyRecord {
    /// Attach the commit sequence number to a pending record.
    pub fn from_new(new: NewOccupancyRecord, ingested_at: u64) -> Self {
        Self {
            location_type: new.location_type,
            location_name: new.location_name,
            date: new.date,
            hour_bucket: new.hour_bucket,
            vehicle_count: new.vehicle_count,
            ingested_at,
            source_image_id: new.source_image_id,
        }
    }
}

/// Result of applying one observation to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// The committed record, or the previously committed record when
    /// `duplicate` is true.
    pub record: OccupancyRecord,
    /// True when the observation was a re-delivery resolved as a no-op.
    pub duplicate: bool,
}

/// Per-type popular-times view: `date -> hour bucket -> running total`.
pub type PopularTimes = BTreeMap<NaiveDate, BTreeMap<HourBucket, u64>>;

/// Derived aggregate of total vehicle counts per location type, date, and
/// hour bucket.
///
/// Invariant: for any `(location_type, date, hour_bucket)`, the running
/// total equals the sum of `vehicle_count` over all occupancy records with
/// that exact key. The summary is fully rebuildable from the log via
/// [`PopularTimesSummary::from_records`], which is also the crash-recovery
/// path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PopularTimesSummary(BTreeMap<LocationType, PopularTimes>);

impl PopularTimesSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to a key, creating the nested path (default 0) if absent.
    pub fn increment(
        &mut self,
        location_type: LocationType,
        date: NaiveDate,
        hour_bucket: HourBucket,
        delta: u64,
    ) {
        let cell = self
            .0
            .entry(location_type)
            .or_default()
            .entry(date)
            .or_default()
            .entry(hour_bucket)
            .or_default();
        *cell += delta;
    }

    /// Running total for a key, 0 when the path does not exist.
    pub fn total_for(
        &self,
        location_type: LocationType,
        date: NaiveDate,
        hour_bucket: HourBucket,
    ) -> u64 {
        self.0
            .get(&location_type)
            .and_then(|by_date| by_date.get(&date))
            .and_then(|by_hour| by_hour.get(&hour_bucket))
            .copied()
            .unwrap_or(0)
    }

    /// The per-type view, empty when no record of that type was ingested.
    pub fn for_type(&self, location_type: LocationType) -> PopularTimes {
        self.0.get(&location_type).cloned().unwrap_or_default()
    }

    /// Drop every total of one location type.
    pub fn clear_type(&mut self, location_type: LocationType) {
        self.0.remove(&location_type);
    }

    /// Rebuild the summary from scratch out of the occupancy log.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a OccupancyRecord>) -> Self {
        let mut summary = Self::new();
        for record in records {
            summary.increment(
                record.location_type,
                record.date,
                record.hour_bucket,
                u64::from(record.vehicle_count),
            );
        }
        summary
    }
}
