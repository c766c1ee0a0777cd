//! Error type definitions.
//!
//! This module defines the errors returned by the limiter, initialization
//! errors, and the categories a reported request failure can fall into.

use std::fmt;
use std::time::Duration;

use log::SetLoggerError;
use thiserror::Error;

use crate::config::{HTTP_STATUS_FORBIDDEN, HTTP_STATUS_TOO_MANY_REQUESTS};

/// Errors returned by blocking admission (`wait`/`wait_n`).
///
/// None of these are retried internally; they go back to the caller verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThrottleError {
    /// The caller's cancellation token fired before a token was available.
    #[error("wait cancelled before a token became available")]
    Cancelled,

    /// The token would only become available after the caller's deadline.
    #[error("waiting {wait:?} for a token would exceed the deadline")]
    DeadlineExceeded {
        /// How long the caller would have had to wait
        wait: Duration,
    },

    /// More units were requested than the bucket can ever hold.
    #[error("requested {requested} tokens but burst size is {burst}")]
    ExceedsBurst {
        /// Units requested
        requested: usize,
        /// Current burst size
        burst: usize,
    },
}

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Category of a reported request failure.
///
/// Keyed by HTTP status where one exists, otherwise by the transport failure
/// kind. Status codes are three-digit values, so the key space stays small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCategory {
    /// 429 Too Many Requests
    RateLimited,
    /// 403 Forbidden - typically bot detection
    Forbidden,
    /// Any other 4xx status
    ClientError(u16),
    /// Any 5xx status
    ServerError(u16),
    /// Request or connect timeout
    Timeout,
    /// Connection refused/reset, DNS failure
    Connect,
    /// Anything else
    Other,
}

impl ErrorCategory {
    /// Maps an HTTP status code onto a failure category.
    ///
    /// Returns `None` for statuses that count as success (below 400).
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            HTTP_STATUS_TOO_MANY_REQUESTS => Some(ErrorCategory::RateLimited),
            HTTP_STATUS_FORBIDDEN => Some(ErrorCategory::Forbidden),
            400..=499 => Some(ErrorCategory::ClientError(status)),
            500..=599 => Some(ErrorCategory::ServerError(status)),
            s if s >= 600 => Some(ErrorCategory::Other),
            _ => None,
        }
    }

    /// Stable label used in the stats snapshot.
    pub fn label(&self) -> String {
        match self {
            ErrorCategory::RateLimited => "rate_limited".to_string(),
            ErrorCategory::Forbidden => "forbidden".to_string(),
            ErrorCategory::ClientError(code) => format!("client_error_{code}"),
            ErrorCategory::ServerError(code) => format!("server_error_{code}"),
            ErrorCategory::Timeout => "timeout".to_string(),
            ErrorCategory::Connect => "connect".to_string(),
            ErrorCategory::Other => "other".to_string(),
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::RateLimited => f.write_str("Too many requests (429)"),
            ErrorCategory::Forbidden => f.write_str("Bot detection (403 Forbidden)"),
            ErrorCategory::ClientError(code) => write!(f, "Client error ({code})"),
            ErrorCategory::ServerError(code) => write!(f, "Server error ({code})"),
            ErrorCategory::Timeout => f.write_str("Timeout"),
            ErrorCategory::Connect => f.write_str("Connection error"),
            ErrorCategory::Other => f.write_str("Other error"),
        }
    }
}
