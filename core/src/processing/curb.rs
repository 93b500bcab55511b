use crate::geometry::{free_segments, merge_intervals, occupied_length, ZoneCalibrator};
use crate::prelude::{
    EngineConfig, MonitorError, MonitorResult, ProcessingStage, StageInput, StageMetadata,
    StageOutput,
};
use crate::telemetry::log::LogManager;

/// Curb stage: merges vehicle spans along the x axis and measures the
/// usable gaps between them in calibrated units.
pub struct CurbStage {
    calibrator: ZoneCalibrator,
    config: Option<EngineConfig>,
    logger: LogManager,
}

impl CurbStage {
    pub fn new() -> Self {
        Self {
            calibrator: ZoneCalibrator::new(),
            config: None,
            logger: LogManager::new("curb"),
        }
    }

    pub fn calibrator(&self) -> &ZoneCalibrator {
        &self.calibrator
    }

    pub fn calibrator_mut(&mut self) -> &mut ZoneCalibrator {
        &mut self.calibrator
    }
}

impl Default for CurbStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for CurbStage {
    fn initialize(&mut self, config: &EngineConfig) -> MonitorResult<()> {
        if config.merge_tolerance_px < 0.0 || config.min_free_length < 0.0 {
            return Err(MonitorError::InvalidInput(
                "tolerance and minimum free length must be non-negative".into(),
            ));
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> MonitorResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| MonitorError::Internal("stage not initialized".into()))?;

        let scale = self.calibrator.compute_scale(config.reference_length)?;
        let intervals = merge_intervals(
            input.objects.iter().map(|object| object.bbox.x_range()),
            config.merge_tolerance_px,
        );
        let free_space = free_segments(
            &intervals,
            input.frame_width,
            Some(scale),
            config.min_free_length,
        )?;
        let occupied = occupied_length(&intervals, scale, free_space.span_length);

        self.logger.trace(&format!(
            "{} intervals, occupied {:.2}, free {:.2} in {} segments",
            intervals.len(),
            occupied,
            free_space.total_free,
            free_space.segments.len()
        ));

        let metadata = StageMetadata {
            notes: vec![format!("pixels per unit {:.2}", scale.pixels_per_unit())],
            occupied_intervals: Some(intervals),
            occupied_length: Some(occupied),
            free_space: Some(free_space),
            ..Default::default()
        };

        Ok(StageOutput {
            objects: input.objects,
            metadata,
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{BoundingBox, DetectedObject, PixelPoint};

    fn car(x1: f64, x2: f64) -> DetectedObject {
        DetectedObject::new(BoundingBox::new(x1, 200.0, x2, 260.0), 2, 0.8)
    }

    #[test]
    fn curb_stage_measures_free_space() {
        let mut stage = CurbStage::new();
        stage.initialize(&EngineConfig::default()).unwrap();
        stage.calibrator_mut().record_point(PixelPoint::new(0.0, 400.0));
        stage.calibrator_mut().record_point(PixelPoint::new(200.0, 400.0));

        // 10 px per unit; cars cover [0, 105] and [300, 360] after merging.
        let input = StageInput {
            objects: vec![car(0.0, 50.0), car(55.0, 105.0), car(300.0, 360.0)],
            frame_width: 640.0,
            timestamp: Some(1.0),
        };

        let output = stage.execute(input).unwrap();
        let intervals = output.metadata.occupied_intervals.unwrap();
        assert_eq!(intervals.len(), 2);
        let free = output.metadata.free_space.unwrap();
        assert_eq!(free.segments.len(), 2);
        assert!((free.total_free - (19.5 + 28.0)).abs() < 1e-9);
        assert!((output.metadata.occupied_length.unwrap() - 16.5).abs() < 1e-9);
        stage.cleanup();
    }

    #[test]
    fn curb_stage_refuses_without_calibration() {
        let mut stage = CurbStage::new();
        stage.initialize(&EngineConfig::default()).unwrap();
        let input = StageInput {
            objects: vec![car(0.0, 50.0)],
            frame_width: 640.0,
            timestamp: None,
        };
        assert!(matches!(
            stage.execute(input),
            Err(MonitorError::CalibrationIncomplete)
        ));
    }
}
