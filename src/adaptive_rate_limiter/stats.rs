//! Point-in-time view of the limiter's counters and limits.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::config::Strategy;

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

/// Snapshot returned by [`AdaptiveRateLimiter::stats`](crate::AdaptiveRateLimiter::stats).
///
/// Taken under the counters' read lock, so counters, limits and rates agree
/// with each other. Durations serialize as fractional milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimiterStats {
    pub strategy: Strategy,
    #[serde(rename = "base_interval_ms", serialize_with = "as_millis")]
    pub base_interval: Duration,
    #[serde(rename = "current_interval_ms", serialize_with = "as_millis")]
    pub current_interval: Duration,
    pub base_burst_size: usize,
    pub current_burst_size: usize,
    pub success_count: u64,
    pub error_count: u64,
    pub consecutive_errs: u64,
    /// Failures inside the health window
    pub recent_error_count: usize,
    /// Lifetime error rate (0.0-1.0)
    pub error_rate: f64,
    /// Tokens left in the burst reservoir
    pub burst_tokens: usize,
    /// Failure counts by category label, only for observed categories
    pub errors_by_category: BTreeMap<String, u64>,
}

impl LimiterStats {
    /// Total outcomes reported since construction or the last reset.
    pub fn total_requests(&self) -> u64 {
        self.success_count + self.error_count
    }

    /// How much slower than the base rate the limiter currently runs.
    pub fn slowdown(&self) -> f64 {
        self.current_interval.as_secs_f64() / self.base_interval.as_secs_f64()
    }
}

impl fmt::Display for LimiterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "strategy={} interval={:?} (base {:?}, {:.2}x) burst={}/{} tokens={} ok={} err={} streak={} recent_err={} error_rate={:.1}%",
            self.strategy,
            self.current_interval,
            self.base_interval,
            self.slowdown(),
            self.current_burst_size,
            self.base_burst_size,
            self.burst_tokens,
            self.success_count,
            self.error_count,
            self.consecutive_errs,
            self.recent_error_count,
            self.error_rate * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LimiterStats {
        let mut errors_by_category = BTreeMap::new();
        errors_by_category.insert("rate_limited".to_string(), 2);
        LimiterStats {
            strategy: Strategy::Hybrid,
            base_interval: Duration::from_millis(100),
            current_interval: Duration::from_millis(250),
            base_burst_size: 4,
            current_burst_size: 2,
            success_count: 8,
            error_count: 2,
            consecutive_errs: 1,
            recent_error_count: 2,
            error_rate: 0.2,
            burst_tokens: 1,
            errors_by_category,
        }
    }

    #[test]
    fn test_stats_derived_values() {
        let stats = sample();
        assert_eq!(stats.total_requests(), 10);
        assert!((stats.slowdown() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_stats_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["strategy"], "hybrid");
        assert_eq!(json["base_interval_ms"], 100.0);
        assert_eq!(json["current_interval_ms"], 250.0);
        assert_eq!(json["errors_by_category"]["rate_limited"], 2);
    }

    #[test]
    fn test_stats_display() {
        let line = sample().to_string();
        assert!(line.contains("strategy=hybrid"));
        assert!(line.contains("error_rate=20.0%"));
    }
}
