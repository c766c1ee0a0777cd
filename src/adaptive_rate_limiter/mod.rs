//! Adaptive rate limiting with error-based throttling.
//!
//! This module implements a request throttle for scrapers built from:
//! - a token bucket that admits one request per interval, up to a burst
//! - a burst reservoir that absorbs short spikes and refills all at once
//! - a bounded health tracker counting failures in a trailing window
//! - an adaptation pass that stretches the interval as the error rate and the
//!   consecutive-failure streak grow, and resizes the burst
//!
//! Which of these a call consults is picked by the active [`Strategy`](crate::Strategy).
//! Everything time-based is computed lazily on access, so no background task
//! needs to be started or shut down.

mod bucket;
mod controller;
mod health;
mod limiter;
mod reservoir;
mod stats;

pub use limiter::AdaptiveRateLimiter;
pub use stats::LimiterStats;
