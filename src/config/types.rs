//! Configuration types and CLI options.
//!
//! This module defines the limiter configuration, the throttling strategy enum,
//! and the structs used for command-line argument parsing.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::config::constants::*;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Throttling strategy used by the limiter.
///
/// The strategy can be swapped at runtime with
/// [`AdaptiveRateLimiter::set_strategy`](crate::AdaptiveRateLimiter::set_strategy);
/// the change applies to the next call.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Plain token bucket at the base rate, no adaptation
    Fixed,
    /// Token bucket whose interval and burst follow observed errors
    Adaptive,
    /// Burst reservoir first; the token bucket is only used by blocking waits
    Burst,
    /// Adaptation plus burst reservoir with token bucket fallback
    Hybrid,
}

impl Strategy {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Strategy::Fixed => 0,
            Strategy::Adaptive => 1,
            Strategy::Burst => 2,
            Strategy::Hybrid => 3,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Strategy::Fixed,
            2 => Strategy::Burst,
            3 => Strategy::Hybrid,
            _ => Strategy::Adaptive,
        }
    }

    /// Whether this strategy runs adaptation passes.
    pub fn adapts(self) -> bool {
        matches!(self, Strategy::Adaptive | Strategy::Hybrid)
    }

    /// Whether this strategy consults the burst reservoir.
    pub fn uses_reservoir(self) -> bool {
        matches!(self, Strategy::Burst | Strategy::Hybrid)
    }
}

/// Limiter configuration.
///
/// Immutable once handed to the limiter. Zero (or, for ratios, negative/NaN)
/// values are replaced with the production defaults by [`LimiterConfig::normalized`],
/// so a partially filled config is always usable:
///
/// ```
/// use adaptive_throttle::{LimiterConfig, Strategy};
/// use std::time::Duration;
///
/// let config = LimiterConfig {
///     base_interval: Duration::from_millis(200),
///     strategy: Strategy::Hybrid,
///     ..Default::default()
/// };
/// assert_eq!(config.normalized().base_burst_size, 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LimiterConfig {
    /// Steady-state spacing between admitted requests
    pub base_interval: Duration,
    /// Steady-state burst size (token bucket capacity and reservoir size)
    pub base_burst_size: usize,
    /// Ceiling for the adapted interval
    pub max_interval: Duration,
    /// Minimum time between two adaptation passes
    pub adaptation_threshold: Duration,
    /// Error rate above which the interval grows
    pub error_rate_threshold: f64,
    /// Consecutive failures tolerated before the streak penalty applies
    pub consecutive_err_limit: u32,
    /// Minimum relative interval change that is actually committed
    pub min_change_threshold: f64,
    /// Time after which the burst reservoir is refilled
    pub burst_refill_rate: Duration,
    /// Trailing window for the recent-failure count
    pub health_window: Duration,
    /// Initial throttling strategy
    pub strategy: Strategy,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            base_interval: DEFAULT_BASE_INTERVAL,
            base_burst_size: DEFAULT_BURST_SIZE,
            max_interval: DEFAULT_MAX_INTERVAL,
            adaptation_threshold: DEFAULT_ADAPTATION_THRESHOLD,
            error_rate_threshold: DEFAULT_ERROR_RATE_THRESHOLD,
            consecutive_err_limit: DEFAULT_CONSECUTIVE_ERR_LIMIT,
            min_change_threshold: DEFAULT_MIN_CHANGE_THRESHOLD,
            burst_refill_rate: DEFAULT_BURST_REFILL_RATE,
            health_window: DEFAULT_HEALTH_WINDOW,
            strategy: Strategy::Adaptive,
        }
    }
}

fn duration_or(value: Duration, default: Duration) -> Duration {
    if value.is_zero() {
        default
    } else {
        value
    }
}

fn ratio_or(value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        default
    }
}

impl LimiterConfig {
    /// Returns a copy with every unset or invalid field replaced by its default.
    ///
    /// Misconfiguration is corrected rather than rejected: the limiter is a
    /// best-effort throttling aid. A `max_interval` below `base_interval` is
    /// raised to `base_interval`.
    pub fn normalized(&self) -> Self {
        let base_interval = duration_or(self.base_interval, DEFAULT_BASE_INTERVAL);
        let max_interval = duration_or(self.max_interval, DEFAULT_MAX_INTERVAL).max(base_interval);
        let base_burst_size = if self.base_burst_size == 0 {
            DEFAULT_BURST_SIZE
        } else {
            self.base_burst_size
        };
        let consecutive_err_limit = if self.consecutive_err_limit == 0 {
            DEFAULT_CONSECUTIVE_ERR_LIMIT
        } else {
            self.consecutive_err_limit
        };

        Self {
            base_interval,
            base_burst_size,
            max_interval,
            adaptation_threshold: duration_or(
                self.adaptation_threshold,
                DEFAULT_ADAPTATION_THRESHOLD,
            ),
            error_rate_threshold: ratio_or(self.error_rate_threshold, DEFAULT_ERROR_RATE_THRESHOLD),
            consecutive_err_limit,
            min_change_threshold: ratio_or(self.min_change_threshold, DEFAULT_MIN_CHANGE_THRESHOLD),
            burst_refill_rate: duration_or(self.burst_refill_rate, DEFAULT_BURST_REFILL_RATE),
            health_window: duration_or(self.health_window, DEFAULT_HEALTH_WINDOW),
            strategy: self.strategy,
        }
    }

    pub fn with_base_interval(mut self, interval: Duration) -> Self {
        self.base_interval = interval;
        self
    }

    pub fn with_burst_size(mut self, burst: usize) -> Self {
        self.base_burst_size = burst;
        self
    }

    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    pub fn with_adaptation_threshold(mut self, threshold: Duration) -> Self {
        self.adaptation_threshold = threshold;
        self
    }

    pub fn with_error_rate_threshold(mut self, threshold: f64) -> Self {
        self.error_rate_threshold = threshold;
        self
    }

    pub fn with_consecutive_err_limit(mut self, limit: u32) -> Self {
        self.consecutive_err_limit = limit;
        self
    }

    pub fn with_min_change_threshold(mut self, threshold: f64) -> Self {
        self.min_change_threshold = threshold;
        self
    }

    pub fn with_burst_refill_rate(mut self, rate: Duration) -> Self {
        self.burst_refill_rate = rate;
        self
    }

    pub fn with_health_window(mut self, window: Duration) -> Self {
        self.health_window = window;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Command-line options for the throttling simulator.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "adaptive_throttle",
    about = "Drive an adaptive rate limiter with synthetic traffic and report what it did"
)]
pub struct Opt {
    /// Throttling strategy
    #[arg(long, value_enum, default_value_t = Strategy::Adaptive, env = "THROTTLE_STRATEGY")]
    pub strategy: Strategy,

    /// Base interval between requests in milliseconds
    #[arg(long, default_value_t = 100, env = "THROTTLE_BASE_INTERVAL_MS")]
    pub base_interval_ms: u64,

    /// Burst size
    #[arg(long, default_value_t = DEFAULT_BURST_SIZE, env = "THROTTLE_BURST")]
    pub burst: usize,

    /// Maximum adapted interval in milliseconds
    #[arg(long, default_value_t = 5_000, env = "THROTTLE_MAX_INTERVAL_MS")]
    pub max_interval_ms: u64,

    /// Minimum time between adaptation passes in milliseconds
    #[arg(long, default_value_t = 1_000)]
    pub adaptation_threshold_ms: u64,

    /// Error rate above which the limiter slows down (0.0-1.0)
    #[arg(long, default_value_t = DEFAULT_ERROR_RATE_THRESHOLD)]
    pub error_rate_threshold: f64,

    /// Consecutive errors tolerated before the streak penalty applies
    #[arg(long, default_value_t = DEFAULT_CONSECUTIVE_ERR_LIMIT)]
    pub consecutive_err_limit: u32,

    /// Burst reservoir refill period in milliseconds
    #[arg(long, default_value_t = 2_000)]
    pub burst_refill_ms: u64,

    /// Number of synthetic requests to issue
    #[arg(long, default_value_t = DEFAULT_SIM_REQUESTS)]
    pub requests: usize,

    /// Number of concurrent workers
    #[arg(long, default_value_t = DEFAULT_SIM_CONCURRENCY)]
    pub concurrency: usize,

    /// Probability (0.0-1.0) that a synthetic request fails
    #[arg(long, default_value_t = 0.2)]
    pub failure_rate: f64,

    /// Print the final statistics as JSON
    #[arg(long)]
    pub json: bool,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl From<&Opt> for LimiterConfig {
    fn from(opt: &Opt) -> Self {
        LimiterConfig::default()
            .with_strategy(opt.strategy)
            .with_base_interval(Duration::from_millis(opt.base_interval_ms))
            .with_burst_size(opt.burst)
            .with_max_interval(Duration::from_millis(opt.max_interval_ms))
            .with_adaptation_threshold(Duration::from_millis(opt.adaptation_threshold_ms))
            .with_error_rate_threshold(opt.error_rate_threshold)
            .with_consecutive_err_limit(opt.consecutive_err_limit)
            .with_burst_refill_rate(Duration::from_millis(opt.burst_refill_ms))
    }
}
