//! Connection management for client connections.
//!
//! This module tracks live connections, which session each one belongs to,
//! and the outbound queue that every notification for it goes through.

pub mod broadcaster;
pub mod client;
pub mod manager;

pub use broadcaster::Broadcaster;
pub use client::ClientConnection;
pub use manager::ConnectionRegistry;

/// Type alias for connection identifiers.
///
/// Connection IDs are used to uniquely identify client connections
/// throughout their lifecycle on the server. They double as the player
/// identity inside a session.
pub type ConnectionId = usize;
