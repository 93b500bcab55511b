use crate::geometry::{FreeSpaceReport, OccupiedInterval, RestrictedZone};
use crate::interface::DetectedObject;
use serde::{Deserialize, Serialize};

/// Shared configuration for each processing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Detector class kept by the filter (2 is "car" in COCO).
    pub target_class_id: u32,
    pub min_confidence: f32,
    /// Pixel margin under which two boxes are still one obstruction.
    pub merge_tolerance_px: f64,
    /// Real-world length of the calibration line.
    pub reference_length: f64,
    /// Shortest gap, in real units, that counts as usable free space.
    pub min_free_length: f64,
    pub dwell_secs: f64,
    pub default_zone: RestrictedZone,
    pub min_zone_extent_px: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_class_id: 2,
            min_confidence: 0.5,
            merge_tolerance_px: 10.0,
            reference_length: 20.0,
            min_free_length: 4.0,
            dwell_secs: 3.0,
            default_zone: RestrictedZone::DEFAULT,
            min_zone_extent_px: 20.0,
        }
    }
}

/// Input payload for a processing stage.
#[derive(Debug, Clone)]
pub struct StageInput {
    pub objects: Vec<DetectedObject>,
    pub frame_width: f64,
    pub timestamp: Option<f64>,
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub objects: Vec<DetectedObject>,
    pub metadata: StageMetadata,
}

/// Metadata used for chaining stages and telemetry.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    pub occupied_intervals: Option<Vec<OccupiedInterval>>,
    pub occupied_length: Option<f64>,
    pub free_space: Option<FreeSpaceReport>,
    pub zone_count: Option<usize>,
    pub notes: Vec<String>,
}

/// Common error type for the monitoring core.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    #[error("calibration incomplete: two reference points are required")]
    CalibrationIncomplete,
    #[error("invalid zone geometry: {0}")]
    InvalidZoneGeometry(String),
    #[error("delivery failure: {0}")]
    DeliveryFailure(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type MonitorResult<T> = Result<T, MonitorError>;

/// Trait describing per-frame processing stages.
pub trait ProcessingStage {
    fn initialize(&mut self, config: &EngineConfig) -> MonitorResult<()>;
    fn execute(&mut self, input: StageInput) -> MonitorResult<StageOutput>;
    fn cleanup(&mut self);
}
