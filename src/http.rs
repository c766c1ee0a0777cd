//! Throttled HTTP client.
//!
//! Wraps a `reqwest::Client` so that every request waits for admission from an
//! [`AdaptiveRateLimiter`] and reports its outcome back: 2xx/3xx count as
//! success, 4xx/5xx and transport failures as categorized errors.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{ClientBuilder, RequestBuilder, Response};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::adaptive_rate_limiter::AdaptiveRateLimiter;
use crate::error_handling::{categorize_reqwest_error, categorize_status, ThrottleError};

/// Errors returned by [`ThrottledClient`].
#[derive(Error, Debug)]
pub enum FetchError {
    /// Admission was cancelled or could not be granted.
    #[error("Throttle error: {0}")]
    Throttle(#[from] ThrottleError),

    /// The request itself failed (already reported to the limiter).
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),
}

/// HTTP client whose requests are paced by a shared limiter.
#[derive(Clone)]
pub struct ThrottledClient {
    client: reqwest::Client,
    limiter: Arc<AdaptiveRateLimiter>,
}

impl ThrottledClient {
    pub fn new(client: reqwest::Client, limiter: Arc<AdaptiveRateLimiter>) -> Self {
        ThrottledClient { client, limiter }
    }

    /// Builds a client with the given User-Agent and per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns a `reqwest::Error` if client creation fails.
    pub fn with_settings(
        limiter: Arc<AdaptiveRateLimiter>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self::new(client, limiter))
    }

    pub fn limiter(&self) -> &Arc<AdaptiveRateLimiter> {
        &self.limiter
    }

    /// Throttled GET.
    pub async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<Response, FetchError> {
        self.execute(self.client.get(url), cancel).await
    }

    /// Waits for admission, sends `request` and reports the outcome.
    ///
    /// Error statuses are returned as `Ok(response)` so callers can inspect
    /// the body, but they still count as failures for the limiter.
    pub async fn execute(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Response, FetchError> {
        self.limiter.wait(cancel).await?;

        match request.send().await {
            Ok(response) => {
                match categorize_status(response.status()) {
                    Some(category) => {
                        log::debug!("{} returned {}", response.url(), response.status());
                        self.limiter.report_error_with(category);
                    }
                    None => self.limiter.report_success(),
                }
                Ok(response)
            }
            Err(e) => {
                let category = categorize_reqwest_error(&e);
                log::debug!("Request failed ({}): {}", category, e);
                self.limiter.report_error_with(category);
                Err(FetchError::Request(e))
            }
        }
    }
}
