use serde::{Deserialize, Serialize};

/// Where the debouncer is within the current run of identical values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilityState {
    /// Value just changed (or nothing observed yet); timer restarted.
    #[default]
    Unstable,
    /// Same value as before, dwell not reached.
    StablePending,
    /// Dwell reached and the event for this run was emitted.
    StableFired,
}

/// Emitted once per stable run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StableEvent {
    pub value: usize,
    pub since: f64,
    pub timestamp: f64,
}

/// Fires once a value has held for `dwell` seconds, and only once per run.
#[derive(Debug, Clone)]
pub struct StabilityDebouncer {
    dwell: f64,
    last_value: Option<usize>,
    since: f64,
    fired: bool,
    state: StabilityState,
}

impl StabilityDebouncer {
    pub fn new(dwell: f64) -> Self {
        Self {
            dwell: dwell.max(0.0),
            last_value: None,
            since: 0.0,
            fired: false,
            state: StabilityState::Unstable,
        }
    }

    pub fn dwell(&self) -> f64 {
        self.dwell
    }

    pub fn state(&self) -> StabilityState {
        self.state
    }

    pub fn last_value(&self) -> Option<usize> {
        self.last_value
    }

    /// Feeds one observation taken at `timestamp` seconds.
    pub fn observe(&mut self, value: usize, timestamp: f64) -> Option<StableEvent> {
        if self.last_value != Some(value) {
            self.last_value = Some(value);
            self.since = timestamp;
            self.fired = false;
            self.state = StabilityState::Unstable;
            return None;
        }

        if !self.fired && timestamp - self.since >= self.dwell {
            self.fired = true;
            self.state = StabilityState::StableFired;
            return Some(StableEvent {
                value,
                since: self.since,
                timestamp,
            });
        }

        if !self.fired {
            self.state = StabilityState::StablePending;
        }
        None
    }

    pub fn reset(&mut self) {
        self.last_value = None;
        self.since = 0.0;
        self.fired = false;
        self.state = StabilityState::Unstable;
    }
}

impl Default for StabilityDebouncer {
    fn default() -> Self {
        Self::new(3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(debouncer: &mut StabilityDebouncer, samples: &[(usize, f64)]) -> Vec<StableEvent> {
        samples
            .iter()
            .filter_map(|&(value, t)| debouncer.observe(value, t))
            .collect()
    }

    #[test]
    fn short_run_never_fires() {
        let mut debouncer = StabilityDebouncer::new(3.0);
        let events = feed(&mut debouncer, &[(1, 0.0), (1, 1.0), (1, 2.0)]);
        assert!(events.is_empty());
        assert_eq!(debouncer.state(), StabilityState::StablePending);
    }

    #[test]
    fn fires_once_at_dwell_then_restarts_on_change() {
        let mut debouncer = StabilityDebouncer::new(3.0);
        let events = feed(&mut debouncer, &[(1, 0.0), (1, 1.0), (1, 2.0), (1, 3.0)]);
        assert_eq!(
            events,
            vec![StableEvent {
                value: 1,
                since: 0.0,
                timestamp: 3.0
            }]
        );
        assert_eq!(debouncer.state(), StabilityState::StableFired);

        assert!(debouncer.observe(1, 10.0).is_none());
        assert!(debouncer.observe(2, 4.0).is_none());
        assert_eq!(debouncer.state(), StabilityState::Unstable);
        assert!(debouncer.observe(2, 6.9).is_none());
        assert_eq!(debouncer.observe(2, 7.0).map(|event| event.value), Some(2));
    }

    #[test]
    fn first_observation_never_fires_even_with_zero_dwell() {
        let mut debouncer = StabilityDebouncer::new(0.0);
        assert!(debouncer.observe(0, 0.0).is_none());
        assert!(debouncer.observe(0, 0.0).is_some());
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut debouncer = StabilityDebouncer::new(1.0);
        feed(&mut debouncer, &[(4, 0.0), (4, 2.0)]);
        debouncer.reset();
        assert_eq!(debouncer.last_value(), None);
        assert!(debouncer.observe(4, 3.0).is_none());
        assert!(debouncer.observe(4, 4.0).is_some());
    }
}
