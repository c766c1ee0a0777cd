//! Token bucket with lazy, timestamp-based refill.
//!
//! One token accrues per `interval`, up to `burst` tokens. No background task
//! replenishes the bucket: every access first credits the tokens earned since
//! the previous access.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::error_handling::ThrottleError;

#[derive(Debug)]
struct BucketState {
    /// May go negative while reservations are outstanding
    tokens: f64,
    last: Instant,
    interval: Duration,
    burst: usize,
}

impl BucketState {
    fn advance(&mut self, now: Instant) {
        if now <= self.last {
            return;
        }
        let elapsed = now.duration_since(self.last);
        let earned = elapsed.as_secs_f64() / self.interval.as_secs_f64();
        self.tokens = (self.tokens + earned).min(self.burst as f64);
        self.last = now;
    }

    fn time_for(&self, deficit: f64) -> Duration {
        Duration::try_from_secs_f64(self.interval.as_secs_f64() * deficit).unwrap_or(Duration::MAX)
    }
}

/// Fixed-rate token bucket.
///
/// Starts full. `interval` and `burst` can be changed while in use; changes
/// credit the tokens earned under the old interval first.
#[derive(Debug)]
pub(crate) struct TokenBucket {
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub(crate) fn new(interval: Duration, burst: usize, now: Instant) -> Self {
        TokenBucket {
            state: Mutex::new(BucketState {
                tokens: burst as f64,
                last: now,
                interval,
                burst,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes `n` tokens if they are available right now.
    pub(crate) fn allow_n(&self, n: usize) -> bool {
        let now = Instant::now();
        let mut state = self.lock();
        if n > state.burst {
            return false;
        }
        state.advance(now);
        let needed = n as f64;
        if state.tokens >= needed {
            state.tokens -= needed;
            true
        } else {
            false
        }
    }

    /// Reserves `n` tokens and returns how long the caller must wait before
    /// using them.
    ///
    /// If the wait would be longer than `max_wait` nothing is reserved and
    /// `DeadlineExceeded` is returned. Requests larger than the burst size can
    /// never be satisfied and fail with `ExceedsBurst`.
    pub(crate) fn reserve_n(
        &self,
        n: usize,
        max_wait: Option<Duration>,
    ) -> Result<Duration, ThrottleError> {
        let now = Instant::now();
        let mut state = self.lock();
        if n > state.burst {
            return Err(ThrottleError::ExceedsBurst {
                requested: n,
                burst: state.burst,
            });
        }
        state.advance(now);

        let remaining = state.tokens - n as f64;
        let wait = if remaining >= 0.0 {
            Duration::ZERO
        } else {
            state.time_for(-remaining)
        };

        if let Some(max_wait) = max_wait {
            if wait > max_wait {
                return Err(ThrottleError::DeadlineExceeded { wait });
            }
        }

        state.tokens = remaining;
        Ok(wait)
    }

    /// Returns `n` reserved tokens after an abandoned wait.
    pub(crate) fn cancel_n(&self, n: usize) {
        let now = Instant::now();
        let mut state = self.lock();
        state.advance(now);
        state.tokens = (state.tokens + n as f64).min(state.burst as f64);
    }

    pub(crate) fn set_interval(&self, interval: Duration) {
        let now = Instant::now();
        let mut state = self.lock();
        state.advance(now);
        state.interval = interval;
    }

    pub(crate) fn set_burst(&self, burst: usize) {
        let now = Instant::now();
        let mut state = self.lock();
        state.advance(now);
        state.burst = burst;
        state.tokens = state.tokens.min(burst as f64);
    }

    /// Refills the bucket and restores the given limits.
    pub(crate) fn reset(&self, interval: Duration, burst: usize) {
        let now = Instant::now();
        let mut state = self.lock();
        state.interval = interval;
        state.burst = burst;
        state.tokens = burst as f64;
        state.last = now;
    }

    /// Tokens available right now (negative while reservations are pending).
    pub(crate) fn available(&self) -> f64 {
        let now = Instant::now();
        let mut state = self.lock();
        state.advance(now);
        state.tokens
    }

    #[cfg(test)]
    pub(crate) fn limits(&self) -> (Duration, usize) {
        let state = self.lock();
        (state.interval, state.burst)
    }
}
