use crate::interface::InfractionReport;
use crate::processing::StableEvent;
use crate::telemetry::{LogManager, MetricsRecorder};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// What happened to a report handed to the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitOutcome {
    Queued,
    QueueFull,
    Closed,
}

/// Producer side of the evidence queue. Never blocks the frame loop.
pub struct EventEmitter {
    sender: mpsc::Sender<InfractionReport>,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

/// Creates an emitter and the receiving end for a [`DeliveryWorker`](super::DeliveryWorker).
pub fn channel(
    capacity: usize,
    metrics: Arc<MetricsRecorder>,
) -> (EventEmitter, mpsc::Receiver<InfractionReport>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        EventEmitter {
            sender,
            metrics,
            logger: LogManager::new("emitter"),
        },
        receiver,
    )
}

impl EventEmitter {
    pub fn emit(&self, event: &StableEvent, evidence: Option<PathBuf>) -> EmitOutcome {
        let report = InfractionReport::new(event.value, event.timestamp, evidence);
        self.metrics.record_event();
        self.logger.record(&format!(
            "stable count {} since {:.2}s: {}",
            event.value, event.since, report.description
        ));

        match self.sender.try_send(report) {
            Ok(()) => EmitOutcome::Queued,
            Err(TrySendError::Full(report)) => {
                self.metrics.record_dropped();
                self.logger.warn(&format!(
                    "delivery queue full, dropping report '{}'",
                    report.description
                ));
                EmitOutcome::QueueFull
            }
            Err(TrySendError::Closed(report)) => {
                self.metrics.record_dropped();
                self.logger.warn(&format!(
                    "delivery worker gone, dropping report '{}'",
                    report.description
                ));
                EmitOutcome::Closed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(value: usize) -> StableEvent {
        StableEvent {
            value,
            since: 0.0,
            timestamp: 3.0,
        }
    }

    #[test]
    fn emit_queues_until_capacity() {
        let metrics = Arc::new(MetricsRecorder::new());
        let (emitter, mut receiver) = channel(1, metrics.clone());

        assert_eq!(emitter.emit(&event(1), None), EmitOutcome::Queued);
        assert_eq!(emitter.emit(&event(2), None), EmitOutcome::QueueFull);

        let report = receiver.try_recv().unwrap();
        assert_eq!(report.count, 1);
        assert_eq!(report.description, "1 vehicle in restricted zone");
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_fired, 2);
        assert_eq!(snapshot.events_dropped, 1);
    }

    #[test]
    fn emit_after_receiver_dropped_reports_closed() {
        let (emitter, receiver) = channel(4, Arc::new(MetricsRecorder::new()));
        drop(receiver);
        assert_eq!(
            emitter.emit(&event(0), Some(PathBuf::from("frame.jpg"))),
            EmitOutcome::Closed
        );
    }
}
