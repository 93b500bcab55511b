use crate::bridge::bridge::Bridge;
use crate::bridge::model::StatusModel;
use crate::workflow::source::FrameRecord;
use anyhow::Context;
use curbcore::session::{FrameReport, MonitorSession, SessionCommand};
use log::{info, warn};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;

/// Aggregate outcome of one pass over a frame stream.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub frames: usize,
    pub events: usize,
    pub rejected_commands: usize,
    pub last_zone_count: usize,
    pub last_free_length: Option<f64>,
}

pub struct Runner {
    session: MonitorSession,
    commands: Option<UnboundedReceiver<SessionCommand>>,
    status_every: usize,
}

impl Runner {
    pub fn new(session: MonitorSession, status_every: usize) -> Self {
        Self {
            session,
            commands: None,
            status_every: status_every.max(1),
        }
    }

    /// Commands from the bridge, applied between frames.
    pub fn with_commands(mut self, commands: UnboundedReceiver<SessionCommand>) -> Self {
        self.commands = Some(commands);
        self
    }

    #[cfg(test)]
    pub fn session(&self) -> &MonitorSession {
        &self.session
    }

    fn apply(&mut self, command: SessionCommand, summary: &mut RunSummary) {
        if let Err(err) = self.session.apply(command.clone()) {
            warn!("rejected {:?}: {}", command, err);
            summary.rejected_commands += 1;
        }
    }

    fn drain_commands(&mut self, summary: &mut RunSummary) {
        let mut pending = Vec::new();
        if let Some(commands) = self.commands.as_mut() {
            while let Ok(command) = commands.try_recv() {
                pending.push(command);
            }
        }
        for command in pending {
            self.apply(command, summary);
        }
    }

    pub fn step(&mut self, record: FrameRecord, summary: &mut RunSummary) -> anyhow::Result<FrameReport> {
        self.drain_commands(summary);
        for command in record.commands {
            self.apply(command, summary);
        }

        let timestamp = record.frame.timestamp;
        let report = self
            .session
            .process_frame(record.frame)
            .with_context(|| format!("processing frame at {:.3}s", timestamp))?;

        summary.frames += 1;
        summary.last_zone_count = report.zone_count;
        summary.last_free_length = report.curb.free_length();
        if report.event.is_some() {
            summary.events += 1;
        }

        if summary.frames % self.status_every == 0 {
            match report.curb.free_length() {
                Some(free) => info!(
                    "frame {} | vehicles {} | in zone {} | free {:.2}",
                    summary.frames,
                    report.vehicles.len(),
                    report.zone_count,
                    free
                ),
                None => info!(
                    "frame {} | vehicles {} | in zone {} | curb uncalibrated",
                    summary.frames,
                    report.vehicles.len(),
                    report.zone_count
                ),
            }
        }
        Ok(report)
    }

    pub fn execute<I>(&mut self, frames: I, bridge: Option<&Bridge>) -> anyhow::Result<RunSummary>
    where
        I: IntoIterator<Item = FrameRecord>,
    {
        let mut summary = RunSummary::default();
        for record in frames {
            let report = self.step(record, &mut summary)?;
            if let Some(bridge) = bridge {
                let model = StatusModel::from_report(&report, &self.session);
                bridge.publish(&model)?;
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::scene::{build_scene, SceneConfig};
    use crate::workflow::config::WorkflowConfig;
    use curbcore::reporting::channel;
    use curbcore::telemetry::MetricsRecorder;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn runner() -> (Runner, mpsc::Receiver<curbcore::interface::InfractionReport>) {
        let cfg = WorkflowConfig::default();
        let metrics = Arc::new(MetricsRecorder::new());
        let (emitter, receiver) = channel(cfg.queue_capacity, metrics.clone());
        let session = MonitorSession::new(cfg.to_engine_config(), emitter, metrics).unwrap();
        (Runner::new(session, cfg.status_every), receiver)
    }

    #[test]
    fn runner_reports_intruder_once() {
        let (mut runner, mut receiver) = runner();
        let scene = build_scene(&SceneConfig::default()).unwrap();
        let frame_count = scene.len();

        let summary = runner.execute(scene, None).unwrap();
        assert_eq!(summary.frames, frame_count);
        assert!(summary.last_free_length.is_some());

        let mut counts = Vec::new();
        while let Ok(report) = receiver.try_recv() {
            counts.push(report.count);
        }
        assert_eq!(summary.events, counts.len());
        assert!(counts.contains(&1));
    }

    #[test]
    fn bridge_commands_apply_before_next_frame() {
        let (runner, _receiver) = runner();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut runner = runner.with_commands(rx);
        tx.send(SessionCommand::CalibrationPoint { x: 0.0, y: 0.0 }).unwrap();
        tx.send(SessionCommand::CalibrationPoint { x: 640.0, y: 0.0 }).unwrap();
        tx.send(SessionCommand::SetZone {
            x1: 0.0,
            y1: 0.0,
            x2: 5.0,
            y2: 5.0,
        })
        .unwrap();

        let mut summary = RunSummary::default();
        let record: FrameRecord = serde_json::from_str(
            r#"{"timestamp": 0.0, "frame_width": 640, "objects": []}"#,
        )
        .unwrap();
        let report = runner.step(record, &mut summary).unwrap();
        assert_eq!(report.curb.free_length(), Some(20.0));
        assert_eq!(summary.rejected_commands, 1);
        assert_eq!(runner.session().calibration_points().len(), 2);
    }
}
