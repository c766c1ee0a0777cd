//! Burst reservoir: a secondary pool of tokens consumed before the token bucket.
//!
//! The reservoir refills all at once: on any access, if `refill_rate` has passed
//! since the last refill it jumps back to full capacity. It has its own lock so
//! burst consumption never waits behind adaptation or health bookkeeping.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
struct ReservoirState {
    tokens: usize,
    capacity: usize,
    last_refill: Instant,
}

#[derive(Debug)]
pub(crate) struct BurstReservoir {
    refill_rate: Duration,
    state: Mutex<ReservoirState>,
}

impl BurstReservoir {
    /// Creates a full reservoir.
    pub(crate) fn new(capacity: usize, refill_rate: Duration, now: Instant) -> Self {
        BurstReservoir {
            refill_rate,
            state: Mutex::new(ReservoirState {
                tokens: capacity,
                capacity,
                last_refill: now,
            }),
        }
    }

    /// Locks the state and applies any refill that has come due.
    fn lock_refilled(&self, now: Instant) -> MutexGuard<'_, ReservoirState> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if now.saturating_duration_since(state.last_refill) >= self.refill_rate {
            state.tokens = state.capacity;
            state.last_refill = now;
        }
        state
    }

    /// Consumes `n` tokens if at least `n` are present; otherwise leaves the
    /// reservoir untouched and returns `false`.
    pub(crate) fn try_consume(&self, n: usize) -> bool {
        let mut state = self.lock_refilled(Instant::now());
        if state.tokens >= n {
            state.tokens -= n;
            true
        } else {
            false
        }
    }

    /// Changes the capacity, dropping any tokens above the new limit.
    pub(crate) fn set_capacity(&self, capacity: usize) {
        let mut state = self.lock_refilled(Instant::now());
        state.capacity = capacity;
        state.tokens = state.tokens.min(capacity);
    }

    pub(crate) fn available(&self) -> usize {
        self.lock_refilled(Instant::now()).tokens
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.lock_refilled(Instant::now()).capacity
    }

    pub(crate) fn reset(&self, capacity: usize) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.capacity = capacity;
        state.tokens = capacity;
        state.last_refill = Instant::now();
    }
}
