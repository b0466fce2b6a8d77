//! Connection handling logic for line-protocol clients.
//!
//! This module contains the per-connection task: it frames the socket into
//! lines, feeds them to the dispatcher, and tears everything down when the
//! peer leaves.

use crate::{
    config::ServerConfig,
    connection::{ConnectionId, ConnectionRegistry},
    error::ServerError,
    messaging::{route_client_message, ConnectionContext, Dispatch},
    registry::SessionRegistry,
};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, trace, warn};

/// How long a closing connection may spend flushing its queued lines.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handles a single client connection from establishment to cleanup.
///
/// # Connection Flow
///
/// 1. Register the connection with a bounded outbound queue
/// 2. Spawn the writer task that drains the queue onto the socket
/// 3. Read lines and route each one until EOF, a read error, or `EXIT`
/// 4. Leave the connection's session, notifying the other players
/// 5. Unregister the connection, which closes the queue
/// 6. Wait for the writer to flush what is left
///
/// Read failures (including an over-long line or invalid UTF-8) end the
/// connection silently; the peer is not told why.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    sessions: Arc<SessionRegistry>,
    connections: Arc<ConnectionRegistry>,
    config: &ServerConfig,
) -> Result<(), ServerError> {
    let (read_half, write_half) = stream.into_split();
    let mut lines = FramedRead::new(
        read_half,
        LinesCodec::new_with_max_length(config.max_line_length),
    );

    let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_queue_size);
    let connection_id = connections.add_connection(addr, outbound_tx);
    let mut writer = tokio::spawn(write_lines(write_half, outbound_rx, connection_id));

    let ctx = ConnectionContext::new(connection_id, addr, sessions, connections.clone());
    while let Some(frame) = lines.next().await {
        match frame {
            Ok(line) => {
                if route_client_message(&line, &ctx).await == Dispatch::Close {
                    debug!(connection_id, "👋 Client requested exit");
                    break;
                }
            }
            Err(e) => {
                debug!(connection_id, peer = %addr, "🔌 Read failed: {}", e);
                break;
            }
        }
    }

    ctx.leave_session().await;
    connections.remove_connection(connection_id);

    match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ServerError::Internal(format!(
            "Writer task for connection {connection_id} failed: {e}"
        ))),
        Err(_) => {
            warn!(connection_id, "⏰ Outbound queue not drained in time, dropping it");
            writer.abort();
            Ok(())
        }
    }
}

/// Drains the outbound queue onto the socket, one line per message.
///
/// Exits once every sender is gone and the queue is empty, or on the first
/// write error.
async fn write_lines(
    write_half: OwnedWriteHalf,
    mut outbound: mpsc::Receiver<String>,
    connection_id: ConnectionId,
) {
    let mut sink = FramedWrite::new(write_half, LinesCodec::new());
    while let Some(line) = outbound.recv().await {
        trace!(connection_id, "📝 Writing {:?}", line);
        if let Err(e) = sink.send(line).await {
            debug!(connection_id, "Write failed: {}", e);
            return;
        }
    }
    let _ = sink.into_inner().shutdown().await;
}
