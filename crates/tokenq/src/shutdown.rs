// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the HTTP server monitors. In-flight requests
//! finish before the process exits.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
/// The signal handler task runs in the background until the token is cancelled.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            signal = wait_for_signal() => {
                info!(signal, "received shutdown signal, initiating shutdown");
                token_clone.cancel();
            }
            _ = token_clone.cancelled() => {}
        }
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = until_signalled(tokio::signal::ctrl_c(), "SIGINT") => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            }
        }
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler, listening for Ctrl+C only");
            until_signalled(tokio::signal::ctrl_c(), "SIGINT").await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    until_signalled(tokio::signal::ctrl_c(), "Ctrl+C").await;
    "Ctrl+C"
}

/// Resolves when `listener` reports its signal.
///
/// A listener that fails to install never resolves, so the server keeps
/// running instead of shutting down on a signal that was never sent.
async fn until_signalled<F>(listener: F, signal: &'static str)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = listener.await {
        warn!(signal, error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn install_signal_handler_returns_token() {
        let token = install_signal_handler();
        // Token should not be cancelled yet.
        assert!(!token.is_cancelled());
        // Cancel it manually to clean up the background task.
        token.cancel();
    }

    #[tokio::test(start_paused = true)]
    #[tracing_test::traced_test]
    async fn failed_listener_is_logged_and_never_fires() {
        let failing = async { Err(std::io::Error::other("signal driver unavailable")) };
        let waited = tokio::time::timeout(
            std::time::Duration::from_secs(60),
            until_signalled(failing, "SIGINT"),
        )
        .await;
        assert!(waited.is_err(), "a failed listener must not trigger shutdown");
        assert!(logs_contain("failed to listen for shutdown signal"));
        assert!(logs_contain("signal driver unavailable"));
    }

    #[tokio::test]
    async fn delivered_signal_resolves() {
        until_signalled(async { Ok(()) }, "SIGTERM").await;
    }
}
