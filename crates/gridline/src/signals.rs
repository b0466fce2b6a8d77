//! Termination signal handling.
//!
//! The application waits on [`setup_signal_handlers`] once to start a
//! graceful shutdown, then again on [`setup_signal_handlers_silent`] to catch
//! an impatient second signal.

use grid_server::ShutdownState;
use tracing::info;

/// Waits for SIGINT or SIGTERM (Ctrl+C on Windows) and returns an initiated
/// shutdown state.
pub async fn setup_signal_handlers() -> Result<ShutdownState, Box<dyn std::error::Error>> {
    let name = wait_for_signal().await?;
    info!("📡 Received {} - initiating graceful shutdown", name);
    Ok(initiated())
}

/// Like [`setup_signal_handlers`], without logging which signal arrived.
pub async fn setup_signal_handlers_silent() -> Result<ShutdownState, Box<dyn std::error::Error>> {
    wait_for_signal().await?;
    Ok(initiated())
}

fn initiated() -> ShutdownState {
    let state = ShutdownState::new();
    state.initiate_shutdown();
    state
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    })
}

#[cfg(windows)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}
