//! Error categorization.
//!
//! Maps HTTP responses and `reqwest` errors onto [`ErrorCategory`] values so the
//! limiter can keep per-category failure counts.

use super::types::ErrorCategory;

/// Categorizes a `reqwest::Error` into an `ErrorCategory`.
///
/// Status codes take precedence; otherwise the transport failure kind decides.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> ErrorCategory {
    if let Some(category) = error
        .status()
        .and_then(|status| ErrorCategory::from_status(status.as_u16()))
    {
        return category;
    }

    if error.is_timeout() {
        ErrorCategory::Timeout
    } else if error.is_connect() {
        ErrorCategory::Connect
    } else {
        ErrorCategory::Other
    }
}

/// Categorizes a response status, returning `None` when the status counts as success.
pub fn categorize_status(status: reqwest::StatusCode) -> Option<ErrorCategory> {
    ErrorCategory::from_status(status.as_u16())
}
