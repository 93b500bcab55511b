use serde::Serialize;
use std::sync::Mutex;

/// Counters shared between the frame loop and the delivery worker.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub frames: usize,
    pub events_fired: usize,
    pub events_dropped: usize,
    pub delivered: usize,
    pub delivery_failures: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut Metrics)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_frame(&self) {
        self.update(|metrics| metrics.frames += 1);
    }

    pub fn record_event(&self) {
        self.update(|metrics| metrics.events_fired += 1);
    }

    pub fn record_dropped(&self) {
        self.update(|metrics| metrics.events_dropped += 1);
    }

    pub fn record_delivered(&self) {
        self.update(|metrics| metrics.delivered += 1);
    }

    pub fn record_delivery_failure(&self) {
        self.update(|metrics| metrics.delivery_failures += 1);
    }

    pub fn snapshot(&self) -> Metrics {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
