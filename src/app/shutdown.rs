//! Graceful shutdown handling.

use tokio_util::sync::CancellationToken;

/// Cancels `cancel` when the process receives Ctrl-C.
///
/// Waiting workers observe the cancellation through
/// [`AdaptiveRateLimiter::wait`](crate::AdaptiveRateLimiter::wait) and stop.
pub fn cancel_on_ctrl_c(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    log::warn!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }
                log::warn!("Ctrl-C received, cancelling outstanding waits");
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }
    })
}

/// Stops the progress logger and waits for it to finish.
pub async fn shutdown_gracefully(
    logging_cancel: CancellationToken,
    logging_task: Option<tokio::task::JoinHandle<()>>,
) {
    logging_cancel.cancel();
    if let Some(logging_task) = logging_task {
        let _ = logging_task.await;
    }
}
