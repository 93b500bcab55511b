use anyhow::Context;
use curbcore::geometry::RestrictedZone;
use curbcore::interface::PixelPoint;
use curbcore::prelude::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub target_class_id: u32,
    pub min_confidence: f32,
    pub merge_tolerance_px: f64,
    pub reference_length: f64,
    pub min_free_length: f64,
    pub dwell_secs: f64,
    pub zone: RestrictedZone,
    pub min_zone_extent_px: f64,
    /// Reference line endpoints; the curb stays uncalibrated when absent.
    pub calibration_points: Option<[PixelPoint; 2]>,
    pub report_url: String,
    pub report_timeout_secs: u64,
    pub queue_capacity: usize,
    /// Where evidence frames are archived before upload.
    pub evidence_dir: Option<PathBuf>,
    pub bridge_addr: SocketAddr,
    /// Log a status line every this many frames.
    pub status_every: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            target_class_id: engine.target_class_id,
            min_confidence: engine.min_confidence,
            merge_tolerance_px: engine.merge_tolerance_px,
            reference_length: engine.reference_length,
            min_free_length: engine.min_free_length,
            dwell_secs: engine.dwell_secs,
            zone: engine.default_zone,
            min_zone_extent_px: engine.min_zone_extent_px,
            calibration_points: None,
            report_url: "http://127.0.0.1:8001/api/infractions/".to_string(),
            report_timeout_secs: 5,
            queue_capacity: 16,
            evidence_dir: Some(PathBuf::from("evidence")),
            bridge_addr: SocketAddr::from(([127, 0, 0, 1], 9000)),
            status_every: 20,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            target_class_id: self.target_class_id,
            min_confidence: self.min_confidence,
            merge_tolerance_px: self.merge_tolerance_px,
            reference_length: self.reference_length,
            min_free_length: self.min_free_length,
            dwell_secs: self.dwell_secs,
            default_zone: self.zone,
            min_zone_extent_px: self.min_zone_extent_px,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_matches_engine_defaults() {
        let cfg = WorkflowConfig::default();
        let engine = cfg.to_engine_config();
        assert_eq!(engine.dwell_secs, 3.0);
        assert_eq!(engine.default_zone, RestrictedZone::DEFAULT);
        assert_eq!(cfg.report_timeout_secs, 5);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"dwell_secs: 5.0\nmin_free_length: 2.5\nzone: {x1: 0, y1: 0, x2: 300, y2: 120}\n\
              calibration_points:\n  - {x: 0, y: 400}\n  - {x: 640, y: 400}\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.dwell_secs, 5.0);
        assert_eq!(cfg.to_engine_config().default_zone.x2, 300.0);
        assert_eq!(cfg.calibration_points.unwrap()[1].x, 640.0);
        assert_eq!(cfg.merge_tolerance_px, 10.0);
    }
}
