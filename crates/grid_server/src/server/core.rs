//! Core game server implementation.
//!
//! This module contains the main `GameServer` struct: it owns the session and
//! connection registries, runs the accept loop, and enforces the connection
//! limit before handing each socket to its own handler task.

use crate::{
    config::ServerConfig,
    connection::ConnectionRegistry,
    error::ServerError,
    registry::SessionRegistry,
    server::handlers::handle_connection,
    shutdown::ShutdownState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, error, info, warn};

/// Line written to a peer refused because the server is at capacity.
const SERVER_FULL: &[u8] = b"ERROR Server full\n";

/// The core game server structure.
///
/// `GameServer` orchestrates networking for the grid game: one accept loop,
/// one task per connection, and the two registries those tasks share.
///
/// # Architecture
///
/// * **Session Registry**: every session ever created and not yet aborted
/// * **Connection Registry**: live connections and their outbound queues
/// * **Connection Limit**: a semaphore with one permit per allowed connection
/// * **Shutdown**: an internal broadcast channel plus an optional
///   [`ShutdownState`] shared with the application layer
pub struct GameServer {
    /// Server configuration settings
    config: ServerConfig,

    /// Authoritative store of game sessions
    sessions: Arc<SessionRegistry>,

    /// Registry of live client connections
    connections: Arc<ConnectionRegistry>,

    /// Permits for concurrently served connections
    connection_slots: Arc<Semaphore>,

    /// Channel for coordinating server shutdown
    shutdown_sender: broadcast::Sender<()>,
}

impl GameServer {
    /// Creates a new game server with the specified configuration.
    ///
    /// Nothing is bound until [`GameServer::start`] or [`GameServer::bind`]
    /// is called.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_sender, _) = broadcast::channel(1);
        let connection_slots = Arc::new(Semaphore::new(config.max_connections));

        Self {
            config,
            sessions: Arc::new(SessionRegistry::new()),
            connections: Arc::new(ConnectionRegistry::new()),
            connection_slots,
            shutdown_sender,
        }
    }

    /// Starts the server and runs until `shutdown_state` is initiated.
    ///
    /// # Returns
    ///
    /// `Ok(())` once the accept loop has stopped cleanly, or a
    /// `ServerError` if binding or accepting failed.
    pub async fn start_with_shutdown_state(
        &self,
        shutdown_state: ShutdownState,
    ) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, Some(shutdown_state)).await
    }

    /// Starts the server and runs until [`GameServer::shutdown`] is called.
    pub async fn start(&self) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, None).await
    }

    /// Binds the configured listen address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| {
                ServerError::Network(format!(
                    "Failed to bind {}: {e}",
                    self.config.bind_address
                ))
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(format!("Failed to read local address: {e}")))?;
        info!("🚀 Grid server listening on {}", local_addr);
        Ok(listener)
    }

    /// Runs the accept loop on an already bound listener.
    ///
    /// # Accept Loop
    ///
    /// 1. Wait for a connection, an internal shutdown, or `shutdown_state`
    /// 2. Refuse the peer with `ERROR Server full` if no slot is free
    /// 3. Otherwise spawn [`handle_connection`] holding the slot until it ends
    ///
    /// An accept error stops the loop and is returned to the caller.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown_state: Option<ShutdownState>,
    ) -> Result<(), ServerError> {
        let mut shutdown_receiver = self.shutdown_sender.subscribe();

        loop {
            let (stream, addr) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        error!("❌ Failed to accept connection: {}", e);
                        return Err(ServerError::Network(format!("Accept failed: {e}")));
                    }
                },
                _ = shutdown_receiver.recv() => {
                    info!("🛑 Internal shutdown signal received");
                    break;
                }
                _ = wait_for_shutdown(shutdown_state.as_ref()) => {
                    info!("🛑 Accept loop stopping - shutdown initiated");
                    break;
                }
            };

            let Ok(slot) = self.connection_slots.clone().try_acquire_owned() else {
                warn!(
                    peer = %addr,
                    "🚧 Connection limit of {} reached, refusing",
                    self.config.max_connections
                );
                tokio::spawn(refuse_connection(stream, addr));
                continue;
            };

            let sessions = self.sessions.clone();
            let connections = self.connections.clone();
            let config = self.config.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, addr, sessions, connections, &config).await {
                    error!(peer = %addr, "Connection error: {:?}", e);
                }
                drop(slot);
            });
        }

        info!(
            "🧹 Accept loop stopped with {} connection(s) still open",
            self.connections.connection_count()
        );
        Ok(())
    }

    /// Stops the accept loop started by [`GameServer::start`] or
    /// [`GameServer::serve`].
    pub fn shutdown(&self) {
        // No receiver simply means no accept loop is running.
        let _ = self.shutdown_sender.send(());
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Gets a reference to the session registry.
    pub fn get_session_registry(&self) -> Arc<SessionRegistry> {
        self.sessions.clone()
    }

    /// Gets a reference to the connection registry.
    pub fn get_connection_registry(&self) -> Arc<ConnectionRegistry> {
        self.connections.clone()
    }
}

/// Resolves when `state` is initiated; never resolves without one.
async fn wait_for_shutdown(state: Option<&ShutdownState>) {
    match state {
        Some(state) => state.wait_for_initiation().await,
        None => std::future::pending().await,
    }
}

async fn refuse_connection(mut stream: TcpStream, addr: SocketAddr) {
    if let Err(e) = stream.write_all(SERVER_FULL).await {
        debug!(peer = %addr, "Could not send refusal: {}", e);
    }
    let _ = stream.shutdown().await;
}
