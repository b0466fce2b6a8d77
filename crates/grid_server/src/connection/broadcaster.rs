//! Best-effort delivery of protocol lines to one or many connections.
//!
//! This module bridges the dispatcher and the connection registry: it looks
//! up a connection's outbound queue and pushes a line into it without ever
//! waiting.

use super::{manager::ConnectionRegistry, ConnectionId};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace, warn};

/// Sends notifications to players.
///
/// Delivery never blocks and never fails the caller. A full queue (slow
/// peer) or a closed one (peer gone) drops the line and logs it, so one bad
/// connection cannot stall the session it belongs to.
#[derive(Clone, Debug)]
pub struct Broadcaster {
    connections: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(connections: Arc<ConnectionRegistry>) -> Self {
        Self { connections }
    }

    /// Queues `message` for a single connection.
    ///
    /// Returns whether the line was queued.
    pub fn send(&self, connection_id: ConnectionId, message: impl Into<String>) -> bool {
        let Some(outbound) = self.connections.outbound(connection_id) else {
            debug!("📭 Connection {} is gone, dropping message", connection_id);
            return false;
        };
        let message = message.into();
        trace!("📤 {} <- {:?}", connection_id, message);
        match outbound.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                warn!(
                    "🐢 Outbound queue full for connection {}, dropping {:?}",
                    connection_id, message
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("📭 Outbound queue closed for connection {}", connection_id);
                false
            }
        }
    }

    /// Queues `message` for every listed connection.
    ///
    /// Returns the number of connections the line was queued for.
    pub fn send_to_all<I>(&self, recipients: I, message: &str) -> usize
    where
        I: IntoIterator<Item = ConnectionId>,
    {
        recipients
            .into_iter()
            .filter(|&connection_id| self.send(connection_id, message))
            .count()
    }
}
