//! Process shutdown signals
//!
//! The server stops accepting connections on Ctrl+C (SIGINT) or, on Unix,
//! SIGTERM.

use std::future::Future;
use std::io;

use tracing::info;

/// Future that resolves on the first shutdown signal
///
/// Signal handlers are installed before this returns, so a signal sent right
/// after the call is not lost.
pub fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    #[cfg(unix)]
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    Ok(async move {
        #[cfg(unix)]
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
            _ = terminate.recv() => info!("Received SIGTERM"),
        }

        #[cfg(not(unix))]
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C");
        }
    })
}
