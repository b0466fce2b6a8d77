//! Factory helpers for building a [`GameServer`].

use crate::{config::ServerConfig, server::GameServer};

/// Creates a game server listening on `127.0.0.1:5000` with default limits.
///
/// # Example
///
/// ```rust
/// use grid_server::create_server;
///
/// let server = create_server();
/// assert_eq!(server.config().bind_address.port(), 5000);
/// ```
pub fn create_server() -> GameServer {
    GameServer::new(ServerConfig::default())
}

/// Creates a game server from an explicit configuration.
///
/// # Example
///
/// ```rust
/// use grid_server::{create_server_with_config, ServerConfig};
///
/// let config = ServerConfig {
///     bind_address: "0.0.0.0:9000".parse().unwrap(),
///     max_connections: 64,
///     ..Default::default()
/// };
///
/// let server = create_server_with_config(config);
/// assert_eq!(server.config().max_connections, 64);
/// ```
pub fn create_server_with_config(config: ServerConfig) -> GameServer {
    GameServer::new(config)
}
