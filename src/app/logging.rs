//! Progress logging utilities.

use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

use crate::adaptive_rate_limiter::AdaptiveRateLimiter;

/// Logs how many requests were admitted so far and the limiter's current state.
///
/// # Arguments
///
/// * `start_time` - When the run started
/// * `admitted` - Atomic counter of admitted requests
/// * `limiter` - The limiter pacing the run
pub fn log_progress(start_time: Instant, admitted: &Arc<AtomicUsize>, limiter: &AdaptiveRateLimiter) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let admitted = admitted.load(Ordering::SeqCst);
    let rate = if elapsed_secs > 0.0 {
        admitted as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Admitted {} requests in {:.2} seconds (~{:.2} req/sec); {}",
        admitted,
        elapsed_secs,
        rate,
        limiter.stats()
    );
}
