//! Shutdown Signal
//!
//! Waits for the OS signals that end a `Registry::run` loop.

use crate::error::Result;
use tokio::signal;

/// The signal that ended the run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Signal {
    #[strum(serialize = "SIGINT")]
    Interrupt,
    #[strum(serialize = "SIGTERM")]
    Terminate,
}

/// Create a future that completes when a shutdown signal is received
///
/// # Example
///
/// ```rust,ignore
/// use appx::lifecycle::shutdown_signal;
///
/// registry.start(&ctx).await?;
/// let signal = shutdown_signal().await?;
/// tracing::info!("Received {}", signal);
/// registry.stop(&ctx).await;
/// ```
pub async fn shutdown_signal() -> Result<Signal> {
    #[cfg(unix)]
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    #[cfg(unix)]
    let terminate = async move {
        terminate.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        res = signal::ctrl_c() => {
            res?;
            tracing::info!("Received Ctrl+C signal");
            Ok(Signal::Interrupt)
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
            Ok(Signal::Terminate)
        },
    }
}
