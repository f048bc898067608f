use std::io;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Install handlers for SIGINT, SIGTERM and SIGHUP and cancel the returned token on the
/// first of them.
///
/// The handlers are registered before this returns, so a signal that arrives while a
/// child is still starting up is never lost. Must be called inside a Tokio runtime.
#[cfg(unix)]
pub fn shutdown_on_signal() -> io::Result<CancellationToken> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
            _ = hangup.recv() => "SIGHUP",
        };
        info!(target: "squall.signal", signal = name, "shutdown requested");
        cancel.cancel();
    });
    Ok(token)
}

#[cfg(not(unix))]
pub fn shutdown_on_signal() -> io::Result<CancellationToken> {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!(target: "squall.signal", signal = "ctrl-c", "shutdown requested"),
            Err(e) => {
                warn!(target: "squall.signal", error = %e, "ctrl-c handler failed");
                return;
            }
        }
        cancel.cancel();
    });
    Ok(token)
}
