//! Vehicle-detector capability.
//!
//! The detection model is an external collaborator: it takes image bytes
//! and returns an integer vehicle count (plus bounding boxes the core
//! ignores). The ingest path depends on the [`VehicleDetector`] trait, not
//! on any concrete model, so deployments wire in their model integration
//! and tests substitute a deterministic fake.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One detection result for an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Number of vehicles detected in the image.
    pub vehicle_count: u32,
    /// Confidence boxes reported by the model. Opaque to the core.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boxes: Vec<BoundingBox>,
}

/// Axis-aligned detection box with model confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
}

/// Error type for detector integrations.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("image could not be decoded: {0}")]
    InvalidImage(String),
    #[error("detector backend failed: {0}")]
    Backend(String),
}

/// The object-detection capability the ingest path depends on.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait VehicleDetector: Send + Sync {
    /// Run detection on raw image bytes.
    async fn detect(&self, image: &[u8]) -> Result<Detection, DetectorError>;
}

/// Deterministic detector returning a fixed count for every image.
///
/// The test double mandated by the design: aggregation semantics are
/// exercised against known counts, and the dev server runs without a model
/// runtime attached.
#[derive(Debug, Clone, Copy)]
pub struct FixedCountDetector {
    count: u32,
}

impl FixedCountDetector {
    pub fn new(count: u32) -> Self {
        Self { count }
    }
}

#[async_trait]
impl VehicleDetector for FixedCountDetector {
    async fn detect(&self, image: &[u8]) -> Result<Detection, DetectorError> {
        if image.is_empty() {
            return Err(DetectorError::InvalidImage("empty image payload".to_string()));
        }
        Ok(Detection {
            vehicle_count: self.count,
            boxes: Vec::new(),
        })
    }
}

/// Named detector registry with a default model.
///
/// The upload form may carry a `model` field selecting which detector runs
/// (the facility historically served two model generations side by side);
/// requests without one use the default. Aggregation semantics are
/// identical regardless of the detector chosen.
#[derive(Clone)]
pub struct DetectorRegistry {
    detectors: HashMap<String, Arc<dyn VehicleDetector>>,
    default_model: String,
}

impl DetectorRegistry {
    /// Create a registry with its default model.
    pub fn new(default_model: impl Into<String>, detector: Arc<dyn VehicleDetector>) -> Self {
        let default_model = default_model.into();
        let mut detectors = HashMap::new();
        detectors.insert(default_model.clone(), detector);
        Self {
            detectors,
            default_model,
        }
    }

    /// Register an additional named detector.
    pub fn register(
        mut self,
        model: impl Into<String>,
        detector: Arc<dyn VehicleDetector>,
    ) -> Self {
        self.detectors.insert(model.into(), detector);
        self
    }

    /// Look up a detector by model name; `None` selects the default.
    pub fn select(&self, model: Option<&str>) -> Option<Arc<dyn VehicleDetector>> {
        let name = model.unwrap_or(&self.default_model);
        self.detectors.get(name).cloned()
    }

    /// Name of the default model.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Registered model names, sorted.
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.detectors.keys().cloned().collect();
        names.sort();
        names
    }
}
