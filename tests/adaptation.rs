//! Adaptation behaviour through the public API.
//!
//! Runs on Tokio's paused clock so intervals and debounce thresholds can be
//! stepped through deterministically.

use std::time::Duration;

use adaptive_throttle::{AdaptiveRateLimiter, ErrorCategory, LimiterConfig, Strategy, ThrottleError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{advance, Instant};
use tokio_util::sync::CancellationToken;

const BASE: Duration = Duration::from_millis(100);
const MAX: Duration = Duration::from_secs(10);
const THRESHOLD: Duration = Duration::from_secs(1);

fn limiter(strategy: Strategy) -> AdaptiveRateLimiter {
    AdaptiveRateLimiter::new(
        LimiterConfig::default()
            .with_strategy(strategy)
            .with_base_interval(BASE)
            .with_max_interval(MAX)
            .with_burst_size(4)
            .with_adaptation_threshold(THRESHOLD)
            .with_error_rate_threshold(0.1)
            .with_consecutive_err_limit(5)
            .with_burst_refill_rate(Duration::from_millis(500)),
    )
}

#[tokio::test(start_paused = true)]
async fn test_error_streak_slows_down() {
    let limiter = limiter(Strategy::Adaptive);
    for _ in 0..10 {
        limiter.report_error_with(ErrorCategory::RateLimited);
    }

    advance(THRESHOLD).await;
    let _ = limiter.allow();

    let stats = limiter.stats();
    // 100% errors gives 4x, a streak of twice the limit doubles that
    assert_eq!(stats.current_interval, Duration::from_millis(800));
    assert_eq!(stats.current_burst_size, 2);
    assert_eq!(stats.consecutive_errs, 10);
    assert_eq!(stats.recent_error_count, 10);
}

#[tokio::test(start_paused = true)]
async fn test_adaptation_is_debounced() {
    let limiter = limiter(Strategy::Adaptive);
    for _ in 0..10 {
        limiter.report_error();
    }

    // Not due yet: nothing changes no matter how often we ask
    for _ in 0..5 {
        let _ = limiter.allow();
    }
    assert_eq!(limiter.stats().current_interval, BASE);

    advance(THRESHOLD).await;
    let _ = limiter.allow();
    assert!(limiter.stats().current_interval > BASE);
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_errors_stop() {
    let limiter = limiter(Strategy::Adaptive);
    for _ in 0..10 {
        limiter.report_error();
    }
    advance(THRESHOLD).await;
    let _ = limiter.allow();
    assert!(limiter.stats().current_interval > BASE);

    for _ in 0..1_000 {
        limiter.report_success();
    }
    advance(THRESHOLD).await;
    let _ = limiter.allow();

    let stats = limiter.stats();
    assert_eq!(stats.current_interval, BASE);
    assert_eq!(stats.consecutive_errs, 0);
    // Healthy again: burst grows to 1.5x base
    assert_eq!(stats.current_burst_size, 6);
}

#[tokio::test(start_paused = true)]
async fn test_interval_never_exceeds_max() {
    let limiter = limiter(Strategy::Hybrid);
    for _ in 0..500 {
        limiter.report_error_with(ErrorCategory::Timeout);
    }
    advance(THRESHOLD).await;
    let _ = limiter.allow();
    // 4x rate penalty times the capped 10x streak penalty
    assert_eq!(limiter.stats().current_interval, Duration::from_secs(4));

    let capped = AdaptiveRateLimiter::new(
        limiter.config().clone().with_max_interval(Duration::from_millis(300)),
    );
    for _ in 0..500 {
        capped.report_error();
    }
    advance(THRESHOLD).await;
    let _ = capped.allow();
    assert_eq!(capped.stats().current_interval, Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_fixed_strategy_ignores_errors() {
    let limiter = limiter(Strategy::Fixed);
    for _ in 0..50 {
        limiter.report_error();
    }
    advance(THRESHOLD * 3).await;
    let _ = limiter.allow();

    let stats = limiter.stats();
    assert_eq!(stats.current_interval, BASE);
    assert_eq!(stats.current_burst_size, 4);
    assert_eq!(stats.error_count, 50);
}

#[tokio::test(start_paused = true)]
async fn test_adapted_interval_paces_waits() {
    let limiter = limiter(Strategy::Adaptive);
    let cancel = CancellationToken::new();
    for _ in 0..10 {
        limiter.report_error();
    }
    advance(THRESHOLD).await;

    // The first wait adapts, which shrinks the burst to 2
    limiter.wait(&cancel).await.unwrap();
    limiter.wait(&cancel).await.unwrap();

    let start = Instant::now();
    limiter.wait(&cancel).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(700));
}

#[tokio::test(start_paused = true)]
async fn test_health_memory_stays_bounded() {
    let limiter = limiter(Strategy::Adaptive);
    for i in 0..5_000 {
        limiter.report_error_with(if i % 2 == 0 {
            ErrorCategory::ServerError(503)
        } else {
            ErrorCategory::RateLimited
        });
        assert!(limiter.tracked_failures() <= 1_000);
    }

    let stats = limiter.stats();
    assert_eq!(stats.error_count, 5_000);
    assert!(stats.recent_error_count <= 1_000);
    assert_eq!(stats.errors_by_category.get("server_error_503"), Some(&2_500));
    assert_eq!(stats.errors_by_category.get("rate_limited"), Some(&2_500));
}

#[tokio::test(start_paused = true)]
async fn test_old_failures_leave_the_window() {
    let limiter = AdaptiveRateLimiter::new(
        LimiterConfig::default().with_health_window(Duration::from_secs(2)),
    );
    for _ in 0..10 {
        limiter.report_error();
    }
    assert_eq!(limiter.stats().recent_error_count, 10);

    advance(Duration::from_secs(3)).await;
    let stats = limiter.stats();
    assert_eq!(stats.recent_error_count, 0);
    // Lifetime counters are unaffected by the window
    assert_eq!(stats.error_count, 10);
}

#[tokio::test(start_paused = true)]
async fn test_strategy_switch_takes_effect() {
    let limiter = limiter(Strategy::Burst);
    for _ in 0..4 {
        assert!(limiter.allow());
    }
    // Reservoir empty; Burst never falls back to the bucket for allow()
    assert!(!limiter.allow());

    limiter.set_strategy(Strategy::Fixed);
    assert_eq!(limiter.strategy(), Strategy::Fixed);
    assert!(limiter.allow());
}

#[tokio::test(start_paused = true)]
async fn test_random_operations_keep_invariants() {
    let limiter = limiter(Strategy::Hybrid);
    let cancel = CancellationToken::new();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let strategies = [
        Strategy::Fixed,
        Strategy::Adaptive,
        Strategy::Burst,
        Strategy::Hybrid,
    ];

    for _ in 0..2_000 {
        match rng.random_range(0..100u32) {
            0..=29 => {
                let _ = limiter.allow_n(rng.random_range(1..=3));
            }
            30..=49 => limiter.report_success(),
            50..=69 => limiter.report_error(),
            70..=84 => advance(Duration::from_millis(rng.random_range(0..400))).await,
            85..=89 => {
                let n = rng.random_range(1..=6);
                match limiter.wait_n_with_deadline(&cancel, n, Instant::now()).await {
                    Ok(()) => {}
                    Err(ThrottleError::DeadlineExceeded { .. })
                    | Err(ThrottleError::ExceedsBurst { .. }) => {}
                    Err(ThrottleError::Cancelled) => panic!("token was never cancelled"),
                }
            }
            90..=97 => limiter.set_strategy(strategies[rng.random_range(0..strategies.len())]),
            _ => limiter.reset(),
        }

        let stats = limiter.stats();
        assert!(stats.current_interval >= stats.base_interval);
        assert!(stats.current_interval <= MAX);
        assert!(stats.current_burst_size >= 1);
        assert!(stats.burst_tokens <= stats.current_burst_size);
        assert!(stats.consecutive_errs <= stats.error_count);
        assert!((0.0..=1.0).contains(&stats.error_rate));
        assert!(stats.recent_error_count <= limiter.tracked_failures());
        assert!(limiter.tracked_failures() <= 1_000);
        assert!(limiter.bucket_tokens() <= stats.current_burst_size as f64 + 1e-9);
    }
}
