//! Error handling and failure statistics.
//!
//! This module provides:
//! - The error returned by blocking admission (`ThrottleError`)
//! - Initialization errors
//! - Failure categories and categorization of HTTP statuses / `reqwest` errors
//! - Per-category failure counters

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, categorize_status};
pub(crate) use stats::ErrorStats;
pub use types::{ErrorCategory, InitializationError, ThrottleError};
