//! Accept loop and per-connection handling.
//!
//! This module contains the main game server structure and the task that
//! serves each client connection.

pub mod core;
pub mod handlers;

pub use core::GameServer;
