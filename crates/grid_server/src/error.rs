//! Error types and handling for the game server.
//!
//! This module defines the error types that can occur during server operations,
//! split into infrastructure failures ([`ServerError`]) and the closed set of
//! game rule violations ([`GameError`]) that are reported back to clients.

use crate::game::SessionId;

/// Enumeration of possible server errors.
///
/// Categorizes errors into network-related and internal server errors
/// to help with debugging and error handling.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or connection issues
    #[error("Network error: {0}")]
    Network(String),

    /// Internal server errors such as a writer task that could not be joined
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Rule violations raised by sessions and the session registry.
///
/// None of these are fatal: the dispatcher turns each one into a single
/// notification for the offending connection. The `Display` output is the
/// reason text sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Malformed or out-of-range arguments
    #[error("{0}")]
    Validation(String),

    /// The session is in the wrong phase for the request
    #[error("{0}")]
    State(String),

    /// The caller does not hold the turn
    #[error("Not your turn")]
    Turn,

    /// The target cell lies outside the board
    #[error("Out of bounds")]
    Bounds { row: i64, col: i64, dimension: usize },

    /// The target cell already carries a symbol
    #[error("Cell already occupied")]
    Occupancy { row: usize, col: usize },

    /// Every seat of the session is taken
    #[error("Game is full")]
    Capacity { capacity: usize },

    /// No session with this id is registered
    #[error("Game {0} not found")]
    UnknownSession(SessionId),
}
