//! Bounded record of recent failure timestamps.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::config::{HEALTH_CLEANUP_INTERVAL, HEALTH_RETENTION_RATIO, MAX_HEALTH_ERRORS};

#[derive(Debug, Default)]
struct HealthState {
    /// Oldest first
    failures: Vec<Instant>,
    /// Failures recorded since the last reset, drives the periodic sweep
    recorded: u64,
}

/// Thread-safe, time-windowed failure log.
///
/// Memory is bounded two ways, since callers can report failures as fast as
/// they like:
/// - a hard cap of `MAX_HEALTH_ERRORS` entries; crossing it keeps only the
///   newest `HEALTH_RETENTION_RATIO` share
/// - every `HEALTH_CLEANUP_INTERVAL`th failure sweeps out entries older than
///   the window
pub(crate) struct HealthTracker {
    window: Duration,
    state: Mutex<HealthState>,
}

impl HealthTracker {
    pub(crate) fn new(window: Duration) -> Self {
        HealthTracker {
            window,
            state: Mutex::new(HealthState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HealthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a failure observed at `now`.
    pub(crate) fn record_failure(&self, now: Instant) {
        let mut state = self.lock();
        state.failures.push(now);
        state.recorded += 1;

        if state.failures.len() > MAX_HEALTH_ERRORS {
            let keep = (MAX_HEALTH_ERRORS as f64 * HEALTH_RETENTION_RATIO) as usize;
            let excess = state.failures.len() - keep;
            state.failures.drain(..excess);
            log::warn!(
                "Health tracker: more than {} failures stored, dropped the oldest {}",
                MAX_HEALTH_ERRORS,
                excess
            );
        }

        if state.recorded % HEALTH_CLEANUP_INTERVAL == 0 {
            let before = state.failures.len();
            let window = self.window;
            // retain() compacts in place with a single forward pass
            state
                .failures
                .retain(|at| now.saturating_duration_since(*at) <= window);
            let removed = before - state.failures.len();
            if removed > 0 {
                log::debug!("Health tracker: expired {} failures outside the window", removed);
            }
        }
    }

    /// Failures recorded within the window ending at `now`.
    pub(crate) fn recent_failure_count(&self, now: Instant) -> usize {
        let window = self.window;
        self.lock()
            .failures
            .iter()
            .filter(|at| now.saturating_duration_since(**at) <= window)
            .count()
    }

    /// Entries currently stored, expired or not.
    pub(crate) fn tracked(&self) -> usize {
        self.lock().failures.len()
    }

    /// Clears all entries and releases the backing storage.
    pub(crate) fn reset(&self) {
        *self.lock() = HealthState::default();
    }

    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.lock().failures.capacity()
    }
}
