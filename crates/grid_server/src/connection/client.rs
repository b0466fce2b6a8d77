//! Client connection representation.
//!
//! This module defines the per-connection record kept by the
//! [`ConnectionRegistry`](super::ConnectionRegistry).

use crate::game::SessionId;
use std::net::SocketAddr;
use std::time::SystemTime;
use tokio::sync::mpsc;

/// Represents an individual client connection to the server.
///
/// # Fields
///
/// * `remote_addr` - The network address of the connected client
/// * `connected_at` - Timestamp when the connection was established
/// * `session_id` - The session this connection has created or joined, if any
/// * `outbound` - Queue drained by the connection's writer task
#[derive(Debug)]
pub struct ClientConnection {
    /// The remote network address of the client
    pub remote_addr: SocketAddr,

    /// When this connection was established
    pub connected_at: SystemTime,

    /// Non-owning reference to the session this connection plays in
    pub session_id: Option<SessionId>,

    /// Outbound line queue for this connection
    pub outbound: mpsc::Sender<String>,
}

impl ClientConnection {
    /// Creates a new connection record that is not yet in any session.
    pub fn new(remote_addr: SocketAddr, outbound: mpsc::Sender<String>) -> Self {
        Self {
            remote_addr,
            connected_at: SystemTime::now(),
            session_id: None,
            outbound,
        }
    }
}
