//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that orchestrates server
//! startup, periodic statistics, and phased shutdown.

use crate::{
    config::AppConfig,
    logging::display_banner,
    signals::{setup_signal_handlers, setup_signal_handlers_silent},
};
use grid_server::{
    connection::ConnectionRegistry, registry::SessionRegistry, GameServer, ShutdownState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const STATS_INTERVAL: Duration = Duration::from_secs(60);
const SERVER_STOP_TIMEOUT: Duration = Duration::from_secs(8);
const DRAIN_POLL: Duration = Duration::from_millis(100);
const MAX_DRAIN_CYCLES: u32 = 30;

/// Owns the validated configuration and the server built from it.
///
/// # Architecture
///
/// * **Configuration Management**: validated before anything is bound
/// * **Server Orchestration**: the accept loop runs on its own task
/// * **Health Monitoring**: connection and session counts every 60 seconds
/// * **Graceful Shutdown**: first signal drains, second signal exits
pub struct Application {
    config: AppConfig,
    server: GameServer,
}

impl Application {
    /// Validates `config` and builds the server from it.
    pub fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let server = GameServer::new(config.to_server_config()?);
        Ok(Self { config, server })
    }

    /// Runs the server until a shutdown signal arrives or the accept loop
    /// fails.
    ///
    /// # Shutdown Phases
    ///
    /// 1. Stop the statistics task and the accept loop
    /// 2. Give open connections a few seconds to finish
    /// 3. Log final statistics
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting gridline");
        self.log_configuration_summary();

        let sessions = self.server.get_session_registry();
        let connections = self.server.get_connection_registry();
        let bind_address = self.config.server.bind_address.clone();

        let shutdown_state = ShutdownState::new();
        let mut server_handle = {
            let server = self.server;
            let shutdown_state = shutdown_state.clone();
            tokio::spawn(async move { server.start_with_shutdown_state(shutdown_state).await })
        };

        let monitoring_handle = {
            let sessions = sessions.clone();
            let connections = connections.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(STATS_INTERVAL);
                interval.tick().await;
                loop {
                    interval.tick().await;
                    log_statistics("📊 Server Health", &sessions, &connections).await;
                }
            })
        };

        info!("✅ Gridline is now running!");
        info!("🎮 Ready to accept connections on {}", bind_address);
        info!("🔍 Health monitoring active - stats every 60 seconds");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        tokio::select! {
            signal = setup_signal_handlers() => {
                signal?;
            }
            result = &mut server_handle => {
                monitoring_handle.abort();
                return match result {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => {
                        error!("❌ Server error: {}", e);
                        Err(e.into())
                    }
                    Err(e) => Err(format!("Server task failed: {e}").into()),
                };
            }
        }

        tokio::spawn(async move {
            if let Err(e) = setup_signal_handlers_silent().await {
                error!("Failed to set up forced shutdown signal handler: {e}");
                return;
            }
            warn!("Shutdown signal received again, exiting immediately");
            std::process::exit(1);
        });

        info!("📡 Phase 1: Stopping new connections...");
        shutdown_state.initiate_shutdown();
        monitoring_handle.abort();

        match tokio::time::timeout(SERVER_STOP_TIMEOUT, &mut server_handle).await {
            Ok(_) => info!("✅ Accept loop stopped"),
            Err(_) => {
                warn!("⏰ Accept loop did not stop within timeout, aborting it");
                server_handle.abort();
            }
        }

        info!("⏳ Phase 2: Waiting for connections to close...");
        let mut cycles = 0;
        while connections.connection_count() > 0 && cycles < MAX_DRAIN_CYCLES {
            tokio::time::sleep(DRAIN_POLL).await;
            cycles += 1;
        }
        if connections.connection_count() > 0 {
            info!(
                "⏰ Timeout reached with {} connection(s) still open, proceeding",
                connections.connection_count()
            );
        }
        shutdown_state.complete_shutdown();

        info!("🧹 Phase 3: Final statistics");
        log_statistics("📊 Final Statistics", &sessions, &connections).await;
        info!("👋 Gridline shutdown complete");

        Ok(())
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!("  👥 Max connections: {}", self.config.server.max_connections);
        info!("  📏 Max line length: {} bytes", self.config.server.max_line_length);
        info!("  📬 Outbound queue size: {}", self.config.server.outbound_queue_size);
    }
}

async fn log_statistics(
    heading: &str,
    sessions: &Arc<SessionRegistry>,
    connections: &Arc<ConnectionRegistry>,
) {
    let stats = sessions.stats().await;
    info!(
        connections = connections.connection_count(),
        forming = stats.forming,
        active = stats.active,
        ended = stats.ended,
        "{} - {} connection(s) | {} session(s)",
        heading,
        connections.connection_count(),
        stats.total()
    );
}
