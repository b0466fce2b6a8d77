//! Server configuration types and defaults.
//!
//! This module contains the server configuration structure and default values
//! used to initialize and customize the game server behavior.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Port the server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 5000;

/// Configuration structure for the game server.
///
/// Contains the network settings and the per-connection limits applied by
/// the accept loop and the connection handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent connections allowed
    pub max_connections: usize,

    /// Longest inbound line accepted, in bytes, before the peer is dropped
    pub max_line_length: usize,

    /// Capacity of each connection's outbound line queue
    pub outbound_queue_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            max_connections: 1000,
            max_line_length: 1024,
            outbound_queue_size: 256,
        }
    }
}
