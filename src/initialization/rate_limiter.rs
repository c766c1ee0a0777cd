//! Rate limiter initialization.

use std::sync::Arc;

use crate::adaptive_rate_limiter::AdaptiveRateLimiter;
use crate::config::LimiterConfig;

/// Builds a shareable limiter from `config` and logs the effective settings.
///
/// The returned `Arc` is meant to be cloned into every task that talks to the
/// same target. Nothing needs shutting down afterwards.
pub fn init_rate_limiter(config: LimiterConfig) -> Arc<AdaptiveRateLimiter> {
    let limiter = AdaptiveRateLimiter::new(config);
    let config = limiter.config();
    log::info!(
        "Rate limiter: strategy={} interval={:?} (max {:?}) burst={} refill={:?} adapt every {:?}",
        config.strategy,
        config.base_interval,
        config.max_interval,
        config.base_burst_size,
        config.burst_refill_rate,
        config.adaptation_threshold
    );
    Arc::new(limiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Strategy;
    use std::time::Duration;

    #[tokio::test]
    async fn test_init_rate_limiter_normalizes_config() {
        let limiter = init_rate_limiter(LimiterConfig {
            base_interval: Duration::ZERO,
            strategy: Strategy::Burst,
            ..Default::default()
        });
        assert_eq!(limiter.config().base_interval, crate::config::DEFAULT_BASE_INTERVAL);
        assert_eq!(limiter.strategy(), Strategy::Burst);
    }

    #[tokio::test]
    async fn test_init_rate_limiter_instances_are_independent() {
        let first = init_rate_limiter(LimiterConfig::default().with_strategy(Strategy::Fixed));
        let second = init_rate_limiter(LimiterConfig::default().with_strategy(Strategy::Fixed));

        first.report_error();
        assert_eq!(first.stats().error_count, 1);
        assert_eq!(second.stats().error_count, 0);
    }
}
