//! Serve loop with bounded graceful shutdown.
//!
//! [`serve`] runs the router until the `shutdown` token is cancelled, then
//! stops accepting connections and waits for in-flight requests. Draining is
//! bounded twice: by a deadline, and by the `force` token, which the binary
//! cancels on a second interrupt.

use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Errors returned by [`serve`].
#[derive(Debug, Error)]
pub enum ServeError {
    /// The server stopped on its own with an I/O error.
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
    /// The server task panicked or was cancelled.
    #[error("server task failed: {0}")]
    Task(#[from] JoinError),
    /// In-flight requests did not finish within the shutdown timeout.
    #[error("graceful shutdown did not finish within {}", humantime::format_duration(*.0))]
    ShutdownTimeout(Duration),
    /// A forced shutdown was requested while draining.
    #[error("shutdown interrupted before in-flight requests finished")]
    Interrupted,
}

/// Serves `router` on `listener` until `shutdown` is cancelled, then drains.
///
/// Returns `Ok(())` once every in-flight request has completed. If draining
/// outlives `timeout`, or `force` is cancelled first, the server task is
/// aborted and an error is returned.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
    force: CancellationToken,
    timeout: Duration,
) -> Result<(), ServeError> {
    let drain = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { drain.cancelled().await })
            .await
    });

    tokio::select! {
        result = &mut server => return Ok(result??),
        _ = shutdown.cancelled() => {}
    }

    info!(
        timeout = %humantime::format_duration(timeout),
        "waiting for in-flight requests"
    );

    tokio::select! {
        result = &mut server => Ok(result??),
        _ = tokio::time::sleep(timeout) => {
            warn!("shutdown timeout elapsed with requests still in flight");
            server.abort();
            Err(ServeError::ShutdownTimeout(timeout))
        }
        _ = force.cancelled() => {
            warn!("forced shutdown requested");
            server.abort();
            Err(ServeError::Interrupted)
        }
    }
}
