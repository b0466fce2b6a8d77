//! # Grid Server
//!
//! A TCP server hosting any number of concurrent turn-based grid games. Each
//! game seats between 2 and 13 players on an `(N + 1) × (N + 1)` board, and
//! the first player to line up three of their symbols wins.
//!
//! ## Architecture Overview
//!
//! ### Core Components
//!
//! * **Session** ([`game::Session`]) - board, players, turn order and phase
//!   of one game; pure state, no I/O
//! * **Session Registry** ([`registry::SessionRegistry`]) - allocates session
//!   ids and answers lobby queries
//! * **Connection Registry** ([`connection::ConnectionRegistry`]) - live
//!   connections, their session membership and outbound queues
//! * **Broadcaster** ([`connection::Broadcaster`]) - best-effort delivery of
//!   protocol lines to one or many connections
//! * **Dispatcher** ([`messaging::route_client_message`]) - turns each client
//!   command into session operations and notifications
//!
//! ### Message Flow
//!
//! 1. The connection handler reads one newline-terminated line
//! 2. The dispatcher parses it into a [`messaging::Command`]
//! 3. The command runs against its session while holding the session lock
//! 4. Every resulting notification is queued before the lock is released
//! 5. Each connection's writer task drains its queue onto the socket
//!
//! ## Protocol
//!
//! ```text
//! client: LIST | CREATE <n> | JOIN <id> | MOVE <row> <col> | EXIT
//! server: GAMES, CREATED, JOINED, WAIT, BOARD, YOURTURN, WIN, LOSE, DRAW,
//!         INVALID, PLAYER_LEFT, GAME_ABORTED, BYE, ERROR
//! ```
//!
//! ## Error Handling
//!
//! * [`ServerError`] covers bind, accept and transport failures
//! * [`GameError`] is the closed set of rule violations; its `Display`
//!   output is the reason sent to the client
//!
//! ## Thread Safety
//!
//! Each session sits behind its own async mutex, so games never contend with
//! each other. The session registry lock is never held while waiting on a
//! session lock.

pub use config::ServerConfig;
pub use error::{GameError, ServerError};
pub use server::GameServer;
pub use shutdown::ShutdownState;
pub use utils::{create_server, create_server_with_config};

pub mod config;
pub mod connection;
pub mod error;
pub mod game;
pub mod messaging;
pub mod registry;
pub mod server;
pub mod shutdown;
pub mod utils;

mod tests;
