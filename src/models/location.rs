use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The canonical name every outdoor zone collapses to.
///
/// Outdoor zones are not first-class: any raw location containing
/// "outdoor" maps to this single label, while indoor zones keep their
/// individual names. The asymmetry is inherited behavior and is kept on
/// purpose; see `classify`.
pub const OUTDOOR_ZONE: &str = "Outdoor";

/// Coarse location classification of a parking zone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum LocationType {
    Indoor,
    Outdoor,
}

impl LocationType {
    /// Both variants, in document order.
    pub const ALL: [LocationType; 2] = [LocationType::Indoor, LocationType::Outdoor];

    /// File name of the per-type popular-times document.
    pub fn document_name(&self) -> &'static str {
        match self {
            LocationType::Indoor => "popular_times_indoor.json",
            LocationType::Outdoor => "popular_times_outdoor.json",
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationType::Indoor => f.write_str("Indoor"),
            LocationType::Outdoor => f.write_str("Outdoor"),
        }
    }
}

impl FromStr for LocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "indoor" => Ok(LocationType::Indoor),
            "outdoor" => Ok(LocationType::Outdoor),
            _ => Err(format!("Unknown location type: {}", s)),
        }
    }
}

/// Classify a free-form location string into a `(type, zone name)` pair.
///
/// Total function: it never fails. A string containing `"outdoor"`
/// (case-insensitive) classifies as [`LocationType::Outdoor`] with the
/// fixed [`OUTDOOR_ZONE`] name. Everything else is indoor, named by the
/// trailing segment after the last `'-'` separator (trimmed), or by the
/// raw string unchanged when no separator is present. Unrecognized input
/// therefore degrades to `(Indoor, raw)`, a documented default rather than
/// an error.
pub fn classify(raw_location: &str) -> (LocationType, String) {
    if raw_location.to_lowercase().contains("outdoor") {
        return (LocationType::Outdoor, OUTDOOR_ZONE.to_string());
    }

    let name = match raw_location.rsplit_once('-') {
        Some((_, trailing)) => trailing.trim().to_string(),
        None => raw_location.to_string(),
    };
    (LocationType::Indoor, name)
}
