//! Synthetic load against a limiter.
//!
//! Workers pull request slots from a shared counter, wait for admission, roll a
//! failure with the configured probability and report the outcome, the same
//! loop a scraper runs around real requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use rand::Rng;
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::logging::log_progress;
use super::shutdown::shutdown_gracefully;
use crate::adaptive_rate_limiter::{AdaptiveRateLimiter, LimiterStats};
use crate::config::SIM_LOGGING_INTERVAL_SECS;
use crate::error_handling::{ErrorCategory, ThrottleError};

/// What the simulator should do.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    /// Total synthetic requests
    pub requests: usize,
    /// Concurrent workers
    pub concurrency: usize,
    /// Probability that a request fails (clamped to 0.0-1.0)
    pub failure_rate: f64,
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub admitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Whether the run was cut short by cancellation
    pub cancelled: bool,
    pub elapsed_seconds: f64,
    pub stats: LimiterStats,
}

fn failure_category(roll: u8) -> ErrorCategory {
    match roll % 3 {
        0 => ErrorCategory::RateLimited,
        1 => ErrorCategory::ServerError(503),
        _ => ErrorCategory::Timeout,
    }
}

/// Drives `plan` through `limiter` until all requests ran or `cancel` fires.
pub async fn run_simulation(
    limiter: Arc<AdaptiveRateLimiter>,
    plan: SimulationPlan,
    cancel: CancellationToken,
) -> SimulationReport {
    let start_time = Instant::now();
    let failure_rate = if plan.failure_rate.is_nan() {
        0.0
    } else {
        plan.failure_rate.clamp(0.0, 1.0)
    };

    let next = Arc::new(AtomicUsize::new(0));
    let admitted = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));

    let logging_cancel = CancellationToken::new();
    let logging_task = {
        let limiter = Arc::clone(&limiter);
        let admitted = Arc::clone(&admitted);
        let logging_cancel = logging_cancel.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(SIM_LOGGING_INTERVAL_SECS));
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => log_progress(start_time, &admitted, &limiter),
                    _ = logging_cancel.cancelled() => break,
                }
            }
        })
    };

    let mut workers = FuturesUnordered::new();
    for _ in 0..plan.concurrency.max(1) {
        let limiter = Arc::clone(&limiter);
        let next = Arc::clone(&next);
        let admitted = Arc::clone(&admitted);
        let failed = Arc::clone(&failed);
        let cancel = cancel.clone();
        let requests = plan.requests;

        workers.push(tokio::spawn(async move {
            while next.fetch_add(1, Ordering::SeqCst) < requests {
                match limiter.wait(&cancel).await {
                    Ok(()) => {}
                    Err(ThrottleError::Cancelled) => break,
                    Err(e) => {
                        log::error!("Worker stopped: {}", e);
                        break;
                    }
                }
                admitted.fetch_add(1, Ordering::SeqCst);

                let (is_failure, roll) = {
                    let mut rng = rand::rng();
                    (rng.random_bool(failure_rate), rng.random::<u8>())
                };
                if is_failure {
                    failed.fetch_add(1, Ordering::SeqCst);
                    limiter.report_error_with(failure_category(roll));
                } else {
                    limiter.report_success();
                }
            }
        }));
    }

    while let Some(result) = workers.next().await {
        if let Err(e) = result {
            log::error!("Simulation worker panicked: {}", e);
        }
    }
    shutdown_gracefully(logging_cancel, Some(logging_task)).await;

    let admitted = admitted.load(Ordering::SeqCst);
    let failed = failed.load(Ordering::SeqCst);
    SimulationReport {
        admitted,
        succeeded: admitted - failed,
        failed,
        cancelled: cancel.is_cancelled() && admitted < plan.requests,
        elapsed_seconds: start_time.elapsed().as_secs_f64(),
        stats: limiter.stats(),
    }
}
