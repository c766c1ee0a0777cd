//! Adaptive rate limiter implementation.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::bucket::TokenBucket;
use super::controller::{self, AdaptiveState};
use super::health::HealthTracker;
use super::reservoir::BurstReservoir;
use super::stats::LimiterStats;
use crate::config::{LimiterConfig, Strategy};
use crate::error_handling::{ErrorCategory, ThrottleError};

/// Rate limiter that throttles request issuance and slows down when the target
/// starts failing.
///
/// One instance per rate-limited resource (target host, proxy, engine); share it
/// behind an `Arc`. Callers acquire admission with [`wait`](Self::wait) or
/// [`allow`](Self::allow) and then report the outcome with
/// [`report_success`](Self::report_success) / [`report_error`](Self::report_error).
///
/// # Locking
///
/// Three disjoint locks, always taken in the order counters → reservoir/health
/// (the token bucket has its own internal lock, taken last):
/// - a read/write lock over counters and adapted interval/burst
/// - the burst reservoir's lock
/// - the health tracker's lock
///
/// No background task is spawned; refills and expiry are computed on access.
pub struct AdaptiveRateLimiter {
    config: LimiterConfig,
    strategy: AtomicU8,
    state: RwLock<AdaptiveState>,
    bucket: TokenBucket,
    reservoir: BurstReservoir,
    health: HealthTracker,
}

impl AdaptiveRateLimiter {
    /// Creates a limiter. Unset or invalid config fields fall back to defaults.
    pub fn new(config: LimiterConfig) -> Self {
        let config = config.normalized();
        let now = Instant::now();

        AdaptiveRateLimiter {
            strategy: AtomicU8::new(config.strategy.as_u8()),
            state: RwLock::new(AdaptiveState::new(&config, now)),
            bucket: TokenBucket::new(config.base_interval, config.base_burst_size, now),
            reservoir: BurstReservoir::new(config.base_burst_size, config.burst_refill_rate, now),
            health: HealthTracker::new(config.health_window),
            config,
        }
    }

    /// The normalized configuration this limiter runs with.
    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    /// The strategy the next call will dispatch on.
    ///
    /// ```
    /// use adaptive_throttle::{AdaptiveRateLimiter, Strategy};
    ///
    /// let limiter = AdaptiveRateLimiter::default();
    /// assert_eq!(limiter.strategy(), Strategy::Adaptive);
    /// limiter.set_strategy(Strategy::Burst);
    /// assert_eq!(limiter.strategy(), Strategy::Burst);
    /// ```
    pub fn strategy(&self) -> Strategy {
        Strategy::from_u8(self.strategy.load(Ordering::Acquire))
    }

    /// Swaps the active strategy. Calls already in progress are unaffected.
    pub fn set_strategy(&self, strategy: Strategy) {
        let previous = Strategy::from_u8(self.strategy.swap(strategy.as_u8(), Ordering::AcqRel));
        if previous != strategy {
            log::debug!("Rate limiter strategy changed: {} → {}", previous, strategy);
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, AdaptiveState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, AdaptiveState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs an adaptation pass if the debounce threshold has elapsed.
    fn maybe_adapt(&self) {
        let now = Instant::now();
        if !controller::is_due(&self.read_state(), &self.config, now) {
            return;
        }

        let mut state = self.write_state();
        // Another caller may have adapted between the two locks
        if !controller::is_due(&state, &self.config, now) {
            return;
        }
        let adjustment = controller::adapt(&mut state, &self.config, now);
        if let Some(interval) = adjustment.interval {
            self.bucket.set_interval(interval);
        }
        if let Some(burst) = adjustment.burst {
            self.reservoir.set_capacity(burst);
            self.bucket.set_burst(burst);
        }
    }

    /// Non-blocking admission of a single request.
    pub fn allow(&self) -> bool {
        self.allow_n(1)
    }

    /// Non-blocking admission of `n` units. Returns `false` immediately when
    /// the applicable token source is short.
    pub fn allow_n(&self, n: usize) -> bool {
        match self.strategy() {
            Strategy::Fixed => self.bucket.allow_n(n),
            Strategy::Adaptive => {
                self.maybe_adapt();
                self.bucket.allow_n(n)
            }
            Strategy::Burst => self.reservoir.try_consume(n),
            Strategy::Hybrid => {
                self.maybe_adapt();
                self.reservoir.try_consume(n) || self.bucket.allow_n(n)
            }
        }
    }

    /// Waits until a single request may proceed or `cancel` fires.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), ThrottleError> {
        self.wait_inner(cancel, 1, None).await
    }

    /// Waits until `n` units may proceed or `cancel` fires.
    pub async fn wait_n(&self, cancel: &CancellationToken, n: usize) -> Result<(), ThrottleError> {
        self.wait_inner(cancel, n, None).await
    }

    /// Like [`wait_n`](Self::wait_n), but gives up with
    /// [`ThrottleError::DeadlineExceeded`] without consuming anything when the
    /// token would only become available after `deadline`.
    pub async fn wait_n_with_deadline(
        &self,
        cancel: &CancellationToken,
        n: usize,
        deadline: Instant,
    ) -> Result<(), ThrottleError> {
        self.wait_inner(cancel, n, Some(deadline)).await
    }

    async fn wait_inner(
        &self,
        cancel: &CancellationToken,
        n: usize,
        deadline: Option<Instant>,
    ) -> Result<(), ThrottleError> {
        if cancel.is_cancelled() {
            return Err(ThrottleError::Cancelled);
        }

        let strategy = self.strategy();
        if strategy.adapts() {
            self.maybe_adapt();
        }
        if strategy.uses_reservoir() && self.reservoir.try_consume(n) {
            return Ok(());
        }

        let max_wait = deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()));
        let wait = self.bucket.reserve_n(n, max_wait)?;
        if wait.is_zero() {
            return Ok(());
        }

        log::trace!("Rate limiter: waiting {:?} for {} token(s)", wait, n);
        tokio::select! {
            _ = tokio::time::sleep(wait) => Ok(()),
            _ = cancel.cancelled() => {
                self.bucket.cancel_n(n);
                Err(ThrottleError::Cancelled)
            }
        }
    }

    /// Records a successful request and ends the consecutive-error streak.
    pub fn report_success(&self) {
        let mut state = self.write_state();
        state.success_count += 1;
        state.consecutive_errs = 0;
    }

    /// Records a failed request with no particular category.
    pub fn report_error(&self) {
        self.report_error_with(ErrorCategory::Other);
    }

    /// Records a failed request under `category`.
    pub fn report_error_with(&self, category: ErrorCategory) {
        let streak = {
            let mut state = self.write_state();
            state.error_count += 1;
            state.consecutive_errs += 1;
            state.errors.record(category);
            // Under the state lock so a concurrent reset() clears both or neither
            self.health.record_failure(Instant::now());
            state.consecutive_errs
        };

        if streak == u64::from(self.config.consecutive_err_limit) + 1 {
            log::warn!(
                "Rate limiter: {} consecutive errors (latest: {}), applying streak penalty",
                streak,
                category
            );
        }
    }

    /// Consistent snapshot of counters and limits.
    pub fn stats(&self) -> LimiterStats {
        let state = self.read_state();
        let now = Instant::now();

        LimiterStats {
            strategy: self.strategy(),
            base_interval: self.config.base_interval,
            current_interval: state.current_interval,
            base_burst_size: self.config.base_burst_size,
            current_burst_size: state.current_burst,
            success_count: state.success_count,
            error_count: state.error_count,
            consecutive_errs: state.consecutive_errs,
            recent_error_count: self.health.recent_failure_count(now),
            error_rate: state.error_rate(),
            burst_tokens: self.reservoir.available(),
            errors_by_category: state.errors.by_label(),
        }
    }

    /// Number of failure timestamps currently held by the health tracker.
    pub fn tracked_failures(&self) -> usize {
        self.health.tracked()
    }

    /// Tokens currently available in the token bucket (negative while waits
    /// are pending).
    pub fn bucket_tokens(&self) -> f64 {
        self.bucket.available()
    }

    /// Returns all mutable state to its initial values.
    ///
    /// The configuration is kept; the health tracker's storage is released.
    pub fn reset(&self) {
        let mut state = self.write_state();
        *state = AdaptiveState::new(&self.config, Instant::now());
        self.reservoir.reset(self.config.base_burst_size);
        self.health.reset();
        self.bucket
            .reset(self.config.base_interval, self.config.base_burst_size);
        log::debug!("Rate limiter reset to base interval {:?}", self.config.base_interval);
    }
}

impl Default for AdaptiveRateLimiter {
    fn default() -> Self {
        Self::new(LimiterConfig::default())
    }
}
