//! Adaptation control loop.
//!
//! Recomputes the effective interval and burst size from the cumulative
//! success/error counters and the consecutive-failure streak. The interval
//! governs sustained throughput, the burst size governs tolerance for short
//! spikes; the two are adjusted independently.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::{
    LimiterConfig, BURST_DECREASE_THRESHOLD, BURST_GROWTH_FACTOR, BURST_INCREASE_THRESHOLD,
    BURST_SHRINK_FACTOR, ERROR_RATE_MULTIPLIER, MAX_CONSECUTIVE_MULTIPLIER,
};
use crate::error_handling::ErrorStats;

/// Counters and adapted limits, guarded by the limiter's read/write lock.
#[derive(Debug)]
pub(crate) struct AdaptiveState {
    pub(crate) current_interval: Duration,
    pub(crate) current_burst: usize,
    pub(crate) success_count: u64,
    pub(crate) error_count: u64,
    pub(crate) consecutive_errs: u64,
    pub(crate) last_adaptation: Instant,
    pub(crate) errors: ErrorStats,
}

impl AdaptiveState {
    pub(crate) fn new(config: &LimiterConfig, now: Instant) -> Self {
        AdaptiveState {
            current_interval: config.base_interval,
            current_burst: config.base_burst_size,
            success_count: 0,
            error_count: 0,
            consecutive_errs: 0,
            last_adaptation: now,
            errors: ErrorStats::new(),
        }
    }

    /// Lifetime error rate (0.0 when nothing has been reported).
    pub(crate) fn error_rate(&self) -> f64 {
        let total = self.success_count + self.error_count;
        if total == 0 {
            0.0
        } else {
            self.error_count as f64 / total as f64
        }
    }
}

/// Limits changed by an adaptation pass; `None` means unchanged.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Adjustment {
    pub(crate) interval: Option<Duration>,
    pub(crate) burst: Option<usize>,
}

/// Whether enough time has passed since the last pass.
pub(crate) fn is_due(state: &AdaptiveState, config: &LimiterConfig, now: Instant) -> bool {
    now.saturating_duration_since(state.last_adaptation) >= config.adaptation_threshold
}

/// Slowdown multiplier for the given error rate and failure streak.
pub(crate) fn slowdown_multiplier(
    error_rate: f64,
    consecutive_errs: u64,
    config: &LimiterConfig,
) -> f64 {
    let mut multiplier = 1.0;
    if error_rate > config.error_rate_threshold {
        multiplier = 1.0 + error_rate * ERROR_RATE_MULTIPLIER;
    }

    // A run of consecutive failures (host just started blocking) is a stronger
    // signal than the averaged rate, so it stacks on top.
    let limit = u64::from(config.consecutive_err_limit);
    if consecutive_errs > limit {
        let ratio = (consecutive_errs as f64 / limit as f64).min(MAX_CONSECUTIVE_MULTIPLIER);
        multiplier *= ratio;
    }
    multiplier
}

/// Interval for the given multiplier, clamped to `[base_interval, max_interval]`.
pub(crate) fn target_interval(multiplier: f64, config: &LimiterConfig) -> Duration {
    let scaled = Duration::try_from_secs_f64(config.base_interval.as_secs_f64() * multiplier)
        .unwrap_or(config.max_interval);
    scaled.clamp(config.base_interval, config.max_interval)
}

/// Burst size for the given error rate, always relative to the base burst.
pub(crate) fn target_burst(error_rate: f64, config: &LimiterConfig) -> usize {
    let base = config.base_burst_size as f64;
    let burst = if error_rate < BURST_INCREASE_THRESHOLD {
        base * BURST_GROWTH_FACTOR
    } else if error_rate > BURST_DECREASE_THRESHOLD {
        base * BURST_SHRINK_FACTOR
    } else {
        base
    };
    (burst as usize).max(1)
}

/// Runs one adaptation pass at `now`, updating `state` in place.
///
/// The caller checks [`is_due`] first and propagates the returned adjustment
/// to the token bucket and burst reservoir.
pub(crate) fn adapt(state: &mut AdaptiveState, config: &LimiterConfig, now: Instant) -> Adjustment {
    // Debounce from the last pass even when there is nothing to learn from yet
    state.last_adaptation = now;

    let total = state.success_count + state.error_count;
    if total == 0 {
        return Adjustment::default();
    }

    let error_rate = state.error_rate();
    let multiplier = slowdown_multiplier(error_rate, state.consecutive_errs, config);
    let new_interval = target_interval(multiplier, config);

    let mut adjustment = Adjustment::default();

    let current = state.current_interval.as_secs_f64();
    let relative_change = (new_interval.as_secs_f64() - current).abs() / current;
    if relative_change >= config.min_change_threshold {
        log::info!(
            "Adaptive rate limiter: error rate {:.1}% ({} consecutive), interval {:?} → {:?}",
            error_rate * 100.0,
            state.consecutive_errs,
            state.current_interval,
            new_interval
        );
        state.current_interval = new_interval;
        adjustment.interval = Some(new_interval);
    }

    let new_burst = target_burst(error_rate, config);
    if new_burst != state.current_burst {
        log::info!(
            "Adaptive rate limiter: error rate {:.1}%, burst {} → {}",
            error_rate * 100.0,
            state.current_burst,
            new_burst
        );
        state.current_burst = new_burst;
        adjustment.burst = Some(new_burst);
    }

    adjustment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LimiterConfig {
        LimiterConfig::default()
            .with_base_interval(Duration::from_millis(100))
            .with_max_interval(Duration::from_secs(100))
            .with_burst_size(4)
            .with_error_rate_threshold(0.1)
            .with_consecutive_err_limit(5)
            .with_min_change_threshold(0.1)
            .normalized()
    }

    fn state_with(config: &LimiterConfig, successes: u64, errors: u64, streak: u64) -> AdaptiveState {
        let mut state = AdaptiveState::new(config, Instant::now());
        state.success_count = successes;
        state.error_count = errors;
        state.consecutive_errs = streak;
        state
    }

    #[test]
    fn test_multiplier_below_threshold_is_one() {
        let config = config();
        assert_eq!(slowdown_multiplier(0.05, 0, &config), 1.0);
        assert_eq!(slowdown_multiplier(0.1, 5, &config), 1.0);
    }

    #[test]
    fn test_multiplier_full_error_rate_is_four() {
        let config = config();
        assert!((slowdown_multiplier(1.0, 0, &config) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiplier_consecutive_penalty_stacks() {
        let config = config();
        // 10 consecutive / limit 5 = 2x on top of 4x
        assert!((slowdown_multiplier(1.0, 10, &config) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiplier_consecutive_penalty_capped() {
        let config = config();
        let multiplier = slowdown_multiplier(0.0, 1_000, &config);
        assert!((multiplier - MAX_CONSECUTIVE_MULTIPLIER).abs() < 1e-9);
    }

    #[test]
    fn test_target_interval_clamped() {
        let config = config();
        assert_eq!(target_interval(0.5, &config), config.base_interval);
        assert_eq!(target_interval(1e12, &config), config.max_interval);
        assert_eq!(target_interval(f64::INFINITY, &config), config.max_interval);
        assert_eq!(target_interval(3.0, &config), Duration::from_millis(300));
    }

    #[test]
    fn test_target_burst_relative_to_base() {
        let config = config();
        assert_eq!(target_burst(0.0, &config), 6);
        assert_eq!(target_burst(0.1, &config), 4);
        assert_eq!(target_burst(0.5, &config), 2);
    }

    #[test]
    fn test_target_burst_never_below_one() {
        let config = config().with_burst_size(1).normalized();
        assert_eq!(target_burst(0.9, &config), 1);
    }

    #[tokio::test]
    async fn test_adapt_without_traffic_is_noop() {
        let config = config();
        let mut state = state_with(&config, 0, 0, 0);
        let now = Instant::now();
        assert_eq!(adapt(&mut state, &config, now), Adjustment::default());
        assert_eq!(state.current_interval, config.base_interval);
        assert_eq!(state.last_adaptation, now);
    }

    #[tokio::test]
    async fn test_adapt_slows_down_on_errors() {
        let config = config();
        let mut state = state_with(&config, 0, 5, 5);
        let adjustment = adapt(&mut state, &config, Instant::now());

        assert_eq!(adjustment.interval, Some(Duration::from_millis(400)));
        assert_eq!(adjustment.burst, Some(2));
        assert_eq!(state.current_interval, Duration::from_millis(400));
        assert_eq!(state.current_burst, 2);
    }

    #[tokio::test]
    async fn test_adapt_grows_burst_when_healthy() {
        let config = config();
        let mut state = state_with(&config, 100, 0, 0);
        let adjustment = adapt(&mut state, &config, Instant::now());

        assert_eq!(adjustment.interval, None);
        assert_eq!(adjustment.burst, Some(6));
    }

    #[tokio::test]
    async fn test_adapt_burst_does_not_compound() {
        let config = config();
        let mut state = state_with(&config, 100, 0, 0);
        for _ in 0..10 {
            adapt(&mut state, &config, Instant::now());
        }
        assert_eq!(state.current_burst, 6);
    }

    #[tokio::test]
    async fn test_adapt_hysteresis_skips_small_changes() {
        let config = config().with_min_change_threshold(0.5).normalized();
        // 12% errors: multiplier 1.36, a 36% change which is below the 50% threshold
        let mut state = state_with(&config, 88, 12, 0);
        let adjustment = adapt(&mut state, &config, Instant::now());
        assert_eq!(adjustment.interval, None);
        assert_eq!(state.current_interval, config.base_interval);
    }

    #[tokio::test]
    async fn test_adapt_recovers_to_base() {
        let config = config();
        let mut state = state_with(&config, 0, 10, 10);
        adapt(&mut state, &config, Instant::now());
        assert!(state.current_interval > config.base_interval);

        state.success_count = 1_000;
        state.consecutive_errs = 0;
        adapt(&mut state, &config, Instant::now());
        assert_eq!(state.current_interval, config.base_interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_due_respects_threshold() {
        let config = config()
            .with_adaptation_threshold(Duration::from_millis(500))
            .normalized();
        let state = AdaptiveState::new(&config, Instant::now());
        assert!(!is_due(&state, &config, Instant::now()));

        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(!is_due(&state, &config, Instant::now()));
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(is_due(&state, &config, Instant::now()));
    }
}
