//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - The logger
//! - Rate limiters (one per throttled target)

mod logger;
mod rate_limiter;

// Re-export public API
pub use logger::init_logger_with;
pub use rate_limiter::init_rate_limiter;
