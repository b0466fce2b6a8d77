//! Connection registry for tracking live connections and their sessions.
//!
//! This module provides the central bookkeeping for all client connections:
//! id assignment, connection → session membership, and access to each
//! connection's outbound queue.

use super::{client::ClientConnection, ConnectionId};
use crate::game::SessionId;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::info;

/// Central registry for all client connections.
///
/// Entries are created when a connection is accepted and removed
/// unconditionally when it goes away, whatever state its session is in.
/// The session id stored per entry is a plain reference; sessions are owned
/// by the [`SessionRegistry`](crate::registry::SessionRegistry).
///
/// # Architecture
///
/// * Uses `DashMap` so concurrent handlers only contend per shard
/// * Implements atomic connection ID generation
/// * Hands out clones of each connection's outbound sender
#[derive(Debug)]
pub struct ConnectionRegistry {
    /// Map of connection ID to client connection information
    connections: DashMap<ConnectionId, ClientConnection>,

    /// Atomic counter for generating unique connection IDs
    next_id: AtomicUsize,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Adds a new connection and returns its unique ID.
    ///
    /// # Arguments
    ///
    /// * `remote_addr` - The network address of the connecting client
    /// * `outbound` - Sender half of the connection's outbound queue
    pub fn add_connection(
        &self,
        remote_addr: SocketAddr,
        outbound: mpsc::Sender<String>,
    ) -> ConnectionId {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections
            .insert(connection_id, ClientConnection::new(remote_addr, outbound));
        info!("🔗 Connection {} from {}", connection_id, remote_addr);
        connection_id
    }

    /// Removes a connection, dropping its outbound sender.
    ///
    /// Once every sender is gone the writer task drains what is queued and
    /// exits.
    pub fn remove_connection(&self, connection_id: ConnectionId) -> Option<ClientConnection> {
        let (_, connection) = self.connections.remove(&connection_id)?;
        info!(
            "❌ Connection {} from {} disconnected after {:?}",
            connection_id,
            connection.remote_addr,
            connection.connected_at.elapsed().unwrap_or_default()
        );
        Some(connection)
    }

    /// Records that a connection has created or joined a session.
    pub fn bind_session(&self, connection_id: ConnectionId, session_id: SessionId) {
        if let Some(mut connection) = self.connections.get_mut(&connection_id) {
            connection.session_id = Some(session_id);
        }
    }

    /// Clears and returns a connection's session membership.
    pub fn take_session(&self, connection_id: ConnectionId) -> Option<SessionId> {
        self.connections
            .get_mut(&connection_id)
            .and_then(|mut connection| connection.session_id.take())
    }

    pub fn session_of(&self, connection_id: ConnectionId) -> Option<SessionId> {
        self.connections
            .get(&connection_id)
            .and_then(|connection| connection.session_id)
    }

    /// Returns a clone of the connection's outbound sender.
    pub fn outbound(&self, connection_id: ConnectionId) -> Option<mpsc::Sender<String>> {
        self.connections
            .get(&connection_id)
            .map(|connection| connection.outbound.clone())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
