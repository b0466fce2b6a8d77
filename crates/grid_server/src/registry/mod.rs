//! Authoritative registry of game sessions and the lobby view over it.

pub mod sessions;

pub use sessions::{LobbyEntry, RegistryStats, SessionRegistry, SharedSession};
