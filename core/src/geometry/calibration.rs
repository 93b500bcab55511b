use crate::interface::PixelPoint;
use crate::prelude::{MonitorError, MonitorResult};
use log::debug;
use serde::{Deserialize, Serialize};

/// Pixels per real-world unit, derived from one reference line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelScale {
    pixels_per_unit: f64,
}

impl PixelScale {
    pub fn new(pixels_per_unit: f64) -> MonitorResult<Self> {
        if !pixels_per_unit.is_finite() || pixels_per_unit <= 0.0 {
            return Err(MonitorError::InvalidInput(format!(
                "scale must be positive, got {}",
                pixels_per_unit
            )));
        }
        Ok(Self { pixels_per_unit })
    }

    pub fn pixels_per_unit(&self) -> f64 {
        self.pixels_per_unit
    }

    pub fn to_units(&self, pixels: f64) -> f64 {
        pixels / self.pixels_per_unit
    }
}

/// Result of offering a point to the calibrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointOutcome {
    /// Point stored; the line still needs more points.
    Recorded(usize),
    /// Second point stored; the line is defined.
    Completed,
    /// Line already defined; the point was dropped.
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct CachedScale {
    reference_length: f64,
    scale: PixelScale,
}

/// Two-point reference line that turns pixel lengths into real lengths.
#[derive(Debug, Clone, Default)]
pub struct ZoneCalibrator {
    points: Vec<PixelPoint>,
    cached: Option<CachedScale>,
}

impl ZoneCalibrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_point(&mut self, point: PixelPoint) -> PointOutcome {
        if self.is_complete() {
            debug!("calibration line already defined, ignoring ({}, {})", point.x, point.y);
            return PointOutcome::Ignored;
        }
        self.points.push(point);
        if self.is_complete() {
            PointOutcome::Completed
        } else {
            PointOutcome::Recorded(self.points.len())
        }
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() == 2
    }

    pub fn points(&self) -> &[PixelPoint] {
        &self.points
    }

    /// Computes and caches the scale for a line of `reference_length` units.
    pub fn compute_scale(&mut self, reference_length: f64) -> MonitorResult<PixelScale> {
        if !self.is_complete() {
            return Err(MonitorError::CalibrationIncomplete);
        }
        if let Some(cached) = self.cached {
            if cached.reference_length == reference_length {
                return Ok(cached.scale);
            }
        }
        if !reference_length.is_finite() || reference_length <= 0.0 {
            return Err(MonitorError::InvalidInput(format!(
                "reference length must be positive, got {}",
                reference_length
            )));
        }

        let distance = self.points[0].distance_to(&self.points[1]);
        let scale = PixelScale::new(distance / reference_length).map_err(|_| {
            MonitorError::InvalidInput("calibration points coincide".to_string())
        })?;
        self.cached = Some(CachedScale {
            reference_length,
            scale,
        });
        Ok(scale)
    }

    /// Last computed scale, if the line is still defined.
    pub fn scale(&self) -> MonitorResult<PixelScale> {
        self.cached
            .map(|cached| cached.scale)
            .ok_or(MonitorError::CalibrationIncomplete)
    }

    pub fn reset(&mut self) {
        self.points.clear();
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_line_yields_exact_scale() {
        let mut calibrator = ZoneCalibrator::new();
        assert_eq!(
            calibrator.record_point(PixelPoint::new(0.0, 0.0)),
            PointOutcome::Recorded(1)
        );
        assert_eq!(
            calibrator.record_point(PixelPoint::new(100.0, 0.0)),
            PointOutcome::Completed
        );
        let scale = calibrator.compute_scale(20.0).unwrap();
        assert_eq!(scale.pixels_per_unit(), 5.0);
        assert_eq!(scale.to_units(50.0), 10.0);
    }

    #[test]
    fn third_point_is_ignored() {
        let mut calibrator = ZoneCalibrator::new();
        calibrator.record_point(PixelPoint::new(0.0, 0.0));
        calibrator.record_point(PixelPoint::new(30.0, 40.0));
        assert_eq!(
            calibrator.record_point(PixelPoint::new(500.0, 500.0)),
            PointOutcome::Ignored
        );
        assert_eq!(calibrator.compute_scale(10.0).unwrap().pixels_per_unit(), 5.0);
    }

    #[test]
    fn scale_requires_two_points() {
        let mut calibrator = ZoneCalibrator::new();
        calibrator.record_point(PixelPoint::new(0.0, 0.0));
        assert_eq!(
            calibrator.compute_scale(20.0),
            Err(MonitorError::CalibrationIncomplete)
        );
        assert_eq!(calibrator.scale(), Err(MonitorError::CalibrationIncomplete));
    }

    #[test]
    fn reset_invalidates_cached_scale() {
        let mut calibrator = ZoneCalibrator::new();
        calibrator.record_point(PixelPoint::new(0.0, 0.0));
        calibrator.record_point(PixelPoint::new(100.0, 0.0));
        calibrator.compute_scale(20.0).unwrap();
        calibrator.reset();
        assert!(calibrator.points().is_empty());
        assert_eq!(calibrator.scale(), Err(MonitorError::CalibrationIncomplete));
    }

    #[test]
    fn coincident_points_are_rejected() {
        let mut calibrator = ZoneCalibrator::new();
        calibrator.record_point(PixelPoint::new(7.0, 7.0));
        calibrator.record_point(PixelPoint::new(7.0, 7.0));
        assert!(matches!(
            calibrator.compute_scale(20.0),
            Err(MonitorError::InvalidInput(_))
        ));
    }
}
