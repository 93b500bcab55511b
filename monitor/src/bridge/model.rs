use curbcore::geometry::{FreeSegment, PixelScale, RestrictedZone};
use curbcore::processing::StabilityState;
use curbcore::session::{CurbStatus, FrameReport, MonitorSession};
use curbcore::telemetry::Metrics;
use serde::Serialize;

/// Latest frame state exposed on `GET /status`.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct StatusModel {
    pub timestamp: f64,
    pub vehicle_count: usize,
    pub zone_count: usize,
    pub zone: RestrictedZone,
    pub calibrated: bool,
    pub pixels_per_unit: Option<f64>,
    pub occupied_length: Option<f64>,
    pub free_length: Option<f64>,
    pub free_segments: Vec<FreeSegment>,
    pub stability: StabilityState,
    pub metrics: Metrics,
}

impl StatusModel {
    pub fn from_report(report: &FrameReport, session: &MonitorSession) -> Self {
        let (occupied_length, free_length, free_segments) = match &report.curb {
            CurbStatus::Uncalibrated => (None, None, Vec::new()),
            CurbStatus::Measured {
                occupied_length,
                free_space,
                ..
            } => (
                Some(*occupied_length),
                Some(free_space.total_free),
                free_space.segments.clone(),
            ),
        };
        let scale = session.scale().ok();

        Self {
            timestamp: report.timestamp,
            vehicle_count: report.vehicles.len(),
            zone_count: report.zone_count,
            zone: session.zone(),
            calibrated: scale.is_some(),
            pixels_per_unit: scale.as_ref().map(PixelScale::pixels_per_unit),
            occupied_length,
            free_length,
            free_segments,
            stability: report.stability,
            metrics: session.metrics().snapshot(),
        }
    }
}
