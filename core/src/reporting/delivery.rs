use crate::interface::{DeliveryEvent, InfractionReport};
use crate::prelude::MonitorResult;
use crate::telemetry::{LogManager, MetricsRecorder};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

/// External reporting collaborator.
///
/// `Ok(status)` means the service answered; transport errors and timeouts
/// come back as [`MonitorError::DeliveryFailure`](crate::MonitorError::DeliveryFailure).
pub trait Reporter: Send + Sync + 'static {
    fn deliver(
        &self,
        report: &InfractionReport,
    ) -> impl Future<Output = MonitorResult<u16>> + Send;
}

/// Consumer side of the evidence queue. One attempt per report, no retries.
pub struct DeliveryWorker<R> {
    receiver: mpsc::Receiver<InfractionReport>,
    reporter: R,
    outcomes: Option<mpsc::UnboundedSender<DeliveryEvent>>,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl<R: Reporter> DeliveryWorker<R> {
    pub fn new(
        receiver: mpsc::Receiver<InfractionReport>,
        reporter: R,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            receiver,
            reporter,
            outcomes: None,
            metrics,
            logger: LogManager::new("delivery"),
        }
    }

    /// Publishes every delivery outcome on `outcomes`.
    pub fn with_outcomes(mut self, outcomes: mpsc::UnboundedSender<DeliveryEvent>) -> Self {
        self.outcomes = Some(outcomes);
        self
    }

    /// Runs until every emitter is dropped and the queue is drained.
    /// Returns the number of reports handled.
    pub async fn run(mut self) -> usize {
        let mut handled = 0;
        while let Some(report) = self.receiver.recv().await {
            let event = self.deliver_one(&report).await;
            if let Some(outcomes) = &self.outcomes {
                let _ = outcomes.send(event);
            }
            handled += 1;
        }
        self.logger
            .trace(&format!("queue closed after {} reports", handled));
        handled
    }

    async fn deliver_one(&self, report: &InfractionReport) -> DeliveryEvent {
        match self.reporter.deliver(report).await {
            Ok(status) if (200..300).contains(&status) => {
                self.metrics.record_delivered();
                self.logger.record(&format!(
                    "delivered '{}' ({})",
                    report.description, status
                ));
                DeliveryEvent::Delivered {
                    count: report.count,
                    status,
                }
            }
            Ok(status) => {
                self.metrics.record_delivery_failure();
                self.logger.warn(&format!(
                    "reporting service rejected '{}' with {}",
                    report.description, status
                ));
                DeliveryEvent::Rejected {
                    count: report.count,
                    status,
                }
            }
            Err(err) => {
                self.metrics.record_delivery_failure();
                self.logger
                    .warn(&format!("could not deliver '{}': {}", report.description, err));
                DeliveryEvent::Failed {
                    count: report.count,
                    reason: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::MonitorError;
    use crate::reporting::emitter::channel;
    use crate::processing::StableEvent;
    use std::sync::Mutex;

    struct ScriptedReporter {
        statuses: Mutex<Vec<MonitorResult<u16>>>,
        seen: Arc<Mutex<Vec<InfractionReport>>>,
    }

    impl Reporter for ScriptedReporter {
        fn deliver(
            &self,
            report: &InfractionReport,
        ) -> impl Future<Output = MonitorResult<u16>> + Send {
            self.seen.lock().unwrap().push(report.clone());
            let next = self.statuses.lock().unwrap().remove(0);
            async move { next }
        }
    }

    #[tokio::test]
    async fn worker_reports_each_outcome() {
        let metrics = Arc::new(MetricsRecorder::new());
        let (emitter, receiver) = channel(8, metrics.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let reporter = ScriptedReporter {
            statuses: Mutex::new(vec![
                Ok(201),
                Ok(500),
                Err(MonitorError::DeliveryFailure("timed out".into())),
            ]),
            seen: seen.clone(),
        };
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();

        for value in [1, 2, 0] {
            let event = StableEvent {
                value,
                since: 0.0,
                timestamp: 3.0,
            };
            emitter.emit(&event, None);
        }
        drop(emitter);

        let handled = DeliveryWorker::new(receiver, reporter, metrics.clone())
            .with_outcomes(outcome_tx)
            .run()
            .await;
        assert_eq!(handled, 3);

        assert_eq!(
            outcome_rx.recv().await,
            Some(DeliveryEvent::Delivered {
                count: 1,
                status: 201
            })
        );
        assert_eq!(
            outcome_rx.recv().await,
            Some(DeliveryEvent::Rejected {
                count: 2,
                status: 500
            })
        );
        assert!(matches!(
            outcome_rx.recv().await,
            Some(DeliveryEvent::Failed { count: 0, .. })
        ));
        assert_eq!(seen.lock().unwrap().len(), 3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.delivered, 1);
        assert_eq!(snapshot.delivery_failures, 2);
    }
}
