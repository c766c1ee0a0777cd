//! Configuration constants.
//!
//! This module defines the production defaults for the limiter configuration and
//! the fixed tuning constants used by the adaptation control loop and the health
//! tracker.

use std::time::Duration;

// Limiter defaults (substituted for zero/invalid configuration values)
/// Steady-state spacing between admitted requests
pub const DEFAULT_BASE_INTERVAL: Duration = Duration::from_secs(1);
/// Number of requests that may be admitted back-to-back
pub const DEFAULT_BURST_SIZE: usize = 5;
/// Ceiling for the adapted interval
/// 30x the base interval gives a struggling host plenty of room without stalling the scan
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(30);
/// Minimum wall-clock time between two adaptation passes
pub const DEFAULT_ADAPTATION_THRESHOLD: Duration = Duration::from_secs(5);
/// Error rate (0.0-1.0) above which the interval starts to grow
pub const DEFAULT_ERROR_RATE_THRESHOLD: f64 = 0.1;
/// Consecutive failures tolerated before the streak penalty kicks in
pub const DEFAULT_CONSECUTIVE_ERR_LIMIT: u32 = 5;
/// Minimum relative change before an adapted interval is committed
pub const DEFAULT_MIN_CHANGE_THRESHOLD: f64 = 0.1;
/// How long the burst reservoir takes to refill completely
pub const DEFAULT_BURST_REFILL_RATE: Duration = Duration::from_secs(10);
/// Trailing window over which failures count as "recent"
pub const DEFAULT_HEALTH_WINDOW: Duration = Duration::from_secs(60);

// Health tracker bounds
/// Hard cap on stored failure timestamps
/// Failure reporting is caller-driven, so without a cap a tight error loop grows memory forever
pub const MAX_HEALTH_ERRORS: usize = 1000;
/// Fraction of `MAX_HEALTH_ERRORS` kept when the cap is hit
/// Keeping half leaves headroom so the next inserts don't truncate again
pub const HEALTH_RETENTION_RATIO: f64 = 0.5;
/// Run the expiry sweep every Nth recorded failure
pub const HEALTH_CLEANUP_INTERVAL: u64 = 100;

// Adaptation tuning
/// Slowdown factor per unit of error rate (100% errors => 1 + 3.0 = 4x interval)
pub const ERROR_RATE_MULTIPLIER: f64 = 3.0;
/// Upper bound for the consecutive-error penalty
pub const MAX_CONSECUTIVE_MULTIPLIER: f64 = 10.0;
/// Error rate below which the burst size grows
pub const BURST_INCREASE_THRESHOLD: f64 = 0.05;
/// Error rate above which the burst size shrinks
pub const BURST_DECREASE_THRESHOLD: f64 = 0.2;
/// Burst multiplier applied to the base burst when the host is healthy
pub const BURST_GROWTH_FACTOR: f64 = 1.5;
/// Burst multiplier applied to the base burst when the host is struggling
pub const BURST_SHRINK_FACTOR: f64 = 0.5;

// Simulation binary
/// Number of synthetic requests issued by the simulator
pub const DEFAULT_SIM_REQUESTS: usize = 100;
/// Concurrent simulated workers
pub const DEFAULT_SIM_CONCURRENCY: usize = 4;
/// Interval between progress log lines in the simulator (seconds)
pub const SIM_LOGGING_INTERVAL_SECS: u64 = 5;

// HTTP status codes (for clarity and consistency)
pub const HTTP_STATUS_FORBIDDEN: u16 = 403;
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;
