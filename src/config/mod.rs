//! Limiter configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, adaptation tuning, health bounds)
//! - The `LimiterConfig` and `Strategy` types
//! - CLI option types and parsing for the simulator

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{LimiterConfig, LogFormat, LogLevel, Opt, Strategy};
