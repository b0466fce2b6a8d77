//! Message handling and routing for client-server communication.
//!
//! This module provides the line protocol types and the dispatcher that
//! turns client commands into session operations and notifications.

pub mod router;
pub mod types;

pub use router::{route_client_message, ConnectionContext, Dispatch};
pub use types::{Command, CommandError, ServerMessage};
