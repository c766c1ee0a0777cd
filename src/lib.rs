//! adaptive_throttle library: client-side request throttling that adapts to failures
//!
//! The limiter admits requests through a token bucket, optionally drains a burst
//! reservoir first, and slows itself down as callers report failures (rate limit
//! responses, timeouts, server errors). It recovers toward the configured base
//! rate once the failures stop.
//!
//! # Example
//!
//! ```no_run
//! use adaptive_throttle::{AdaptiveRateLimiter, LimiterConfig, Strategy};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = AdaptiveRateLimiter::new(
//!     LimiterConfig::default()
//!         .with_base_interval(Duration::from_millis(200))
//!         .with_burst_size(3)
//!         .with_strategy(Strategy::Hybrid),
//! );
//!
//! let cancel = CancellationToken::new();
//! limiter.wait(&cancel).await?;
//! // ... issue the request, then tell the limiter how it went
//! limiter.report_success();
//!
//! println!("{}", limiter.stats());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! Blocking admission (`wait`, `wait_n`) requires a Tokio runtime. The
//! non-blocking operations (`allow`, reporting, stats) work from any thread.

mod adaptive_rate_limiter;
mod app;
pub mod config;
pub mod error_handling;
pub mod http;
pub mod initialization;

// Re-export public API
pub use adaptive_rate_limiter::{AdaptiveRateLimiter, LimiterStats};
pub use app::{
    cancel_on_ctrl_c, print_final_statistics, run_simulation, SimulationPlan, SimulationReport,
};
pub use config::{LimiterConfig, LogFormat, LogLevel, Opt, Strategy};
pub use error_handling::{ErrorCategory, InitializationError, ThrottleError};
pub use http::{FetchError, ThrottledClient};
