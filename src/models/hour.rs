use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical hour-of-day labels, midnight first.
const LABELS: [&str; 24] = [
    "12am", "1am", "2am", "3am", "4am", "5am", "6am", "7am", "8am", "9am", "10am", "11am", "12pm",
    "1pm", "2pm", "3pm", "4pm", "5pm", "6pm", "7pm", "8pm", "9pm", "10pm", "11pm",
];

/// Hour-of-day aggregation bucket.
///
/// Wraps an hour in `0..=23` and serializes as one of exactly 24 canonical
/// labels (`"12am"`, `"1am"`, …, `"11pm"`). The mapping from any 24-hour
/// `"HH:MM"` input is total and deterministic: the same input produces the
/// same bucket on every call, which is what makes replay idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct HourBucket(u8);

/// Raised when the hour component of a raw time string is not an integer in
/// `0..=23` and the string is not a canonical bucket label either.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time format '{input}': expected 24-hour \"HH:MM\" or an hour label like \"9am\"")]
pub struct HourParseError {
    pub input: String,
}

impl HourBucket {
    /// Bucket a raw time string.
    ///
    /// Accepts a 24-hour `"HH:MM"` string (a bare hour like `"9:15"` works
    /// too) or an already-canonical label such as `"10am"`. Pure: no side
    /// effects, identical output for identical input.
    ///
    /// # Errors
    /// [`HourParseError`] when the hour component does not parse as an
    /// integer in `0..=23`.
    pub fn bucket(raw_time: &str) -> Result<Self, HourParseError> {
        let trimmed = raw_time.trim();
        let hour_part = trimmed.split(':').next().unwrap_or_default();

        if let Ok(hour) = hour_part.parse::<u8>() {
            if hour <= 23 {
                return Ok(Self(hour));
            }
            return Err(HourParseError {
                input: raw_time.to_string(),
            });
        }

        // Not numeric: the input may already be a canonical label.
        LABELS
            .iter()
            .position(|label| label.eq_ignore_ascii_case(trimmed))
            .map(|hour| Self(hour as u8))
            .ok_or_else(|| HourParseError {
                input: raw_time.to_string(),
            })
    }

    /// Construct from an hour in `0..=23`.
    pub fn from_hour(hour: u8) -> Option<Self> {
        (hour <= 23).then_some(Self(hour))
    }

    /// The underlying hour in `0..=23`.
    pub fn hour(&self) -> u8 {
        self.0
    }

    /// The canonical label, e.g. `"12am"` for hour 0.
    pub fn label(&self) -> &'static str {
        LABELS[usize::from(self.0)]
    }

    /// All 24 buckets in chronological order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..24).map(Self)
    }
}

impl fmt::Display for HourBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HourBucket {
    type Err = HourParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::bucket(s)
    }
}

impl From<HourBucket> for String {
    fn from(bucket: HourBucket) -> Self {
        bucket.label().to_string()
    }
}

impl TryFrom<String> for HourBucket {
    type Error = HourParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midnight_is_12am() {
        assert_eq!(HourBucket::bucket("00:00").unwrap().label(), "12am");
    }

    #[test]
    fn test_noon_is_12pm() {
        assert_eq!(HourBucket::bucket("12:30").unwrap().label(), "12pm");
    }

    #[test]
    fn test_late_evening() {
        assert_eq!(HourBucket::bucket("23:59").unwrap().label(), "11pm");
    }

    #[test]
    fn test_single_digit_hour() {
        assert_eq!(HourBucket::bucket("9:15").unwrap().label(), "9am");
    }

    #[test]
    fn test_afternoon_wraps_to_pm() {
        assert_eq!(HourBucket::bucket("13:00").unwrap().label(), "1pm");
        assert_eq!(HourBucket::bucket("17:45").unwrap().label(), "5pm");
    }

    #[test]
    fn test_already_bucketed_label_passes_through() {
        assert_eq!(HourBucket::bucket("10am").unwrap().label(), "10am");
        assert_eq!(HourBucket::bucket("12PM").unwrap().label(), "12pm");
    }

    #[test]
    fn test_out_of_range_hour_rejected() {
        assert!(HourBucket::bucket("24:00").is_err());
        assert!(HourBucket::bucket("99:15").is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(HourBucket::bucket("noonish").is_err());
        assert!(HourBucket::bucket("").is_err());
    }

    #[test]
    fn test_every_hour_maps_to_one_of_24_labels() {
        let mut seen = std::collections::HashSet::new();
        for h in 0..24 {
            let bucket = HourBucket::bucket(&format!("{h}:00")).unwrap();
            seen.insert(bucket.label());
        }
        assert_eq!(seen.len(), 24);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            HourBucket::bucket("07:12").unwrap(),
            HourBucket::bucket("07:12").unwrap()
        );
    }

    #[test]
    fn test_serde_round_trip_as_label() {
        let bucket = HourBucket::bucket("15:00").unwrap();
        let json = serde_json::to_string(&bucket).unwrap();
        assert_eq!(json, "\"3pm\"");

        let back: HourBucket = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bucket);
    }

    #[test]
    fn test_chronological_ordering() {
        let morning = HourBucket::bucket("08:00").unwrap();
        let evening = HourBucket::bucket("20:00").unwrap();
        assert!(morning < evening);
    }
}
