//! One monitoring session: the only owner of calibration, zone and
//! debouncer state.
//!
//! Each frame runs filter → curb measurement and zone classification →
//! debouncer → emitter. Calibration and zone edits arrive as explicit calls
//! (or [`SessionCommand`]s) between frames, so a reset never overlaps a frame.

use crate::geometry::{
    FreeSpaceReport, OccupiedInterval, PixelScale, PointOutcome, RestrictedZone,
};
use crate::interface::{DetectedObject, PixelPoint};
use crate::prelude::{EngineConfig, MonitorError, MonitorResult, ProcessingStage, StageInput};
use crate::processing::{
    CurbStage, DetectionFilterStage, StabilityDebouncer, StabilityState, StableEvent, ZoneStage,
};
use crate::reporting::{EmitOutcome, EventEmitter};
use crate::telemetry::{LogManager, MetricsRecorder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Detector output for one captured frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameInput {
    pub timestamp: f64,
    pub frame_width: f64,
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
    /// Captured frame image, used as evidence if an event fires on this frame.
    #[serde(default, alias = "image", skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
}

/// Curb measurement, or the reason there is none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CurbStatus {
    Uncalibrated,
    Measured {
        intervals: Vec<OccupiedInterval>,
        occupied_length: f64,
        free_space: FreeSpaceReport,
    },
}

impl CurbStatus {
    pub fn free_length(&self) -> Option<f64> {
        match self {
            CurbStatus::Uncalibrated => None,
            CurbStatus::Measured { free_space, .. } => Some(free_space.total_free),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub timestamp: f64,
    pub vehicles: Vec<DetectedObject>,
    pub zone_occupants: Vec<DetectedObject>,
    pub zone_count: usize,
    pub curb: CurbStatus,
    pub stability: StabilityState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<StableEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emit: Option<EmitOutcome>,
}

/// Calibration and zone edits, as sent by an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SessionCommand {
    CalibrationPoint { x: f64, y: f64 },
    SetZone { x1: f64, y1: f64, x2: f64, y2: f64 },
    ResetZone,
    ResetCalibration,
    Reset,
}

pub struct MonitorSession {
    config: EngineConfig,
    filter: DetectionFilterStage,
    curb: CurbStage,
    zone: ZoneStage,
    debouncer: StabilityDebouncer,
    emitter: EventEmitter,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl MonitorSession {
    pub fn new(
        config: EngineConfig,
        emitter: EventEmitter,
        metrics: Arc<MetricsRecorder>,
    ) -> MonitorResult<Self> {
        let mut filter = DetectionFilterStage::new();
        filter.initialize(&config)?;
        let mut curb = CurbStage::new();
        curb.initialize(&config)?;
        let mut zone = ZoneStage::new();
        zone.initialize(&config)?;

        Ok(Self {
            debouncer: StabilityDebouncer::new(config.dwell_secs),
            config,
            filter,
            curb,
            zone,
            emitter,
            metrics,
            logger: LogManager::new("session"),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    pub fn zone(&self) -> RestrictedZone {
        self.zone.zone()
    }

    pub fn calibration_points(&self) -> &[PixelPoint] {
        self.curb.calibrator().points()
    }

    pub fn scale(&self) -> MonitorResult<PixelScale> {
        self.curb.calibrator().scale()
    }

    pub fn stability_state(&self) -> StabilityState {
        self.debouncer.state()
    }

    pub fn process_frame(&mut self, frame: FrameInput) -> MonitorResult<FrameReport> {
        if !frame.timestamp.is_finite() {
            return Err(MonitorError::InvalidInput(format!(
                "frame timestamp {} is not finite",
                frame.timestamp
            )));
        }
        self.metrics.record_frame();

        let filtered = self.filter.execute(StageInput {
            objects: frame.objects,
            frame_width: frame.frame_width,
            timestamp: Some(frame.timestamp),
        })?;
        let vehicles = filtered.objects;

        let curb = match self.curb.execute(StageInput {
            objects: vehicles.clone(),
            frame_width: frame.frame_width,
            timestamp: Some(frame.timestamp),
        }) {
            Ok(output) => CurbStatus::Measured {
                intervals: output.metadata.occupied_intervals.unwrap_or_default(),
                occupied_length: output.metadata.occupied_length.unwrap_or(0.0),
                free_space: output
                    .metadata
                    .free_space
                    .ok_or_else(|| MonitorError::Internal("curb stage omitted free space".into()))?,
            },
            Err(MonitorError::CalibrationIncomplete) => CurbStatus::Uncalibrated,
            Err(err) => return Err(err),
        };

        let zoned = self.zone.execute(StageInput {
            objects: vehicles.clone(),
            frame_width: frame.frame_width,
            timestamp: Some(frame.timestamp),
        })?;
        let zone_count = zoned.metadata.zone_count.unwrap_or(0);

        let event = self.debouncer.observe(zone_count, frame.timestamp);
        let emit = event
            .as_ref()
            .map(|event| self.emitter.emit(event, frame.snapshot.clone()));

        Ok(FrameReport {
            timestamp: frame.timestamp,
            vehicles,
            zone_occupants: zoned.objects,
            zone_count,
            curb,
            stability: self.debouncer.state(),
            event,
            emit,
        })
    }

    pub fn record_calibration_point(&mut self, point: PixelPoint) -> MonitorResult<PointOutcome> {
        let outcome = self.curb.calibrator_mut().record_point(point);
        if outcome == PointOutcome::Completed {
            let reference_length = self.config.reference_length;
            let scale = self.curb.calibrator_mut().compute_scale(reference_length);
            match scale {
                Ok(scale) => self.logger.record(&format!(
                    "calibration line of {} units defined, {:.2} px per unit",
                    reference_length,
                    scale.pixels_per_unit()
                )),
                Err(err) => {
                    self.curb.calibrator_mut().reset();
                    return Err(err);
                }
            }
        }
        Ok(outcome)
    }

    /// Sets the zone from two opposite corners. Resets the debouncer.
    pub fn set_zone(&mut self, a: PixelPoint, b: PixelPoint) -> MonitorResult<()> {
        let zone = RestrictedZone::from_corners(a, b, self.config.min_zone_extent_px)?;
        self.zone.set_zone(zone)?;
        self.debouncer.reset();
        Ok(())
    }

    pub fn reset_zone(&mut self) {
        self.zone.reset_zone();
        self.debouncer.reset();
    }

    /// Clears the calibration line. Resets the debouncer.
    pub fn reset_calibration(&mut self) {
        self.curb.calibrator_mut().reset();
        self.debouncer.reset();
        self.logger.record("calibration cleared");
    }

    /// Clears calibration, restores the default zone and resets the debouncer.
    pub fn reset(&mut self) {
        self.reset_calibration();
        self.reset_zone();
    }

    pub fn apply(&mut self, command: SessionCommand) -> MonitorResult<()> {
        match command {
            SessionCommand::CalibrationPoint { x, y } => {
                self.record_calibration_point(PixelPoint::new(x, y))?;
            }
            SessionCommand::SetZone { x1, y1, x2, y2 } => {
                self.set_zone(PixelPoint::new(x1, y1), PixelPoint::new(x2, y2))?;
            }
            SessionCommand::ResetZone => self.reset_zone(),
            SessionCommand::ResetCalibration => self.reset_calibration(),
            SessionCommand::Reset => self.reset(),
        }
        Ok(())
    }
}
