//! Command dispatch for a single connection.
//!
//! This module takes parsed client commands, drives the session registry and
//! sessions, and queues the resulting notifications through the
//! [`Broadcaster`]. Every notification that follows from a session mutation
//! is queued while that session's lock is still held, so each recipient sees
//! them in the order the mutations happened.

use crate::{
    connection::{Broadcaster, ConnectionId, ConnectionRegistry},
    error::GameError,
    game::{Departure, MoveOutcome, Phase, Session, SessionId},
    messaging::{Command, CommandError, ServerMessage},
    registry::SessionRegistry,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// What the connection handler should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Continue,
    Close,
}

/// Everything one connection needs to serve its commands.
///
/// Built once per connection by the handler; the registries are shared with
/// every other connection.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    connection_id: ConnectionId,
    remote_addr: SocketAddr,
    sessions: Arc<SessionRegistry>,
    connections: Arc<ConnectionRegistry>,
    broadcaster: Broadcaster,
}

impl ConnectionContext {
    pub fn new(
        connection_id: ConnectionId,
        remote_addr: SocketAddr,
        sessions: Arc<SessionRegistry>,
        connections: Arc<ConnectionRegistry>,
    ) -> Self {
        let broadcaster = Broadcaster::new(connections.clone());
        Self {
            connection_id,
            remote_addr,
            sessions,
            connections,
            broadcaster,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    fn reply(&self, message: ServerMessage) {
        self.broadcaster.send(self.connection_id, message);
    }

    fn send_to_players(&self, session: &Session, message: &ServerMessage) {
        self.broadcaster
            .send_to_all(session.connection_ids(), &message.to_string());
    }

    /// Re-issues the turn notice after a rejected move, if this connection
    /// still holds the turn.
    fn resend_turn_notice(&self, session: &Session) {
        if session.is_current(self.connection_id) {
            self.reply(ServerMessage::YourTurn);
        }
    }

    async fn handle_list(&self) {
        let entries = self.sessions.list().await;
        self.reply(ServerMessage::Games(entries));
    }

    async fn handle_create(&self, players: usize) {
        if let Err(e) = self.ensure_free().await {
            self.reply(ServerMessage::Error(e.to_string()));
            return;
        }

        match self
            .sessions
            .create(players, self.connection_id, self.remote_addr)
            .await
        {
            Ok(session) => {
                let session_id = session.id();
                self.connections.bind_session(self.connection_id, session_id);
                self.reply(ServerMessage::Created(session_id));
                if let Some(player) = session.player(self.connection_id) {
                    self.reply(ServerMessage::Joined(player.symbol));
                }
                self.reply(ServerMessage::Wait);
            }
            Err(e) => {
                debug!(
                    connection_id = self.connection_id,
                    "🚫 CREATE {} rejected: {}", players, e
                );
                self.reply(ServerMessage::Error(e.to_string()));
            }
        }
    }

    async fn handle_join(&self, session_id: SessionId) {
        if let Err(e) = self.ensure_free().await {
            self.reply(ServerMessage::Error(e.to_string()));
            return;
        }

        let Some(shared) = self.sessions.get(session_id).await else {
            self.reply(ServerMessage::Error(
                GameError::UnknownSession(session_id).to_string(),
            ));
            return;
        };

        let mut session = shared.lock().await;
        let symbol = match session.add_player(self.connection_id, self.remote_addr) {
            Ok(symbol) => symbol,
            Err(e) => {
                debug!(
                    connection_id = self.connection_id,
                    session_id,
                    "🚫 JOIN rejected: {}", e
                );
                self.reply(ServerMessage::Error(e.to_string()));
                return;
            }
        };

        self.connections.bind_session(self.connection_id, session_id);
        self.reply(ServerMessage::Joined(symbol));
        info!(
            connection_id = self.connection_id,
            session_id,
            "👤 Joined as {} ({}/{})",
            symbol,
            session.joined_count(),
            session.capacity()
        );

        if session.phase() == Phase::Active {
            info!(session_id, "🏁 Session started");
            self.send_to_players(&session, &ServerMessage::Board(session.board().clone()));
            if let Some(first) = session.current_player() {
                self.broadcaster
                    .send(first.connection_id, ServerMessage::YourTurn);
            }
        } else {
            self.reply(ServerMessage::Wait);
        }
    }

    async fn handle_move(&self, row: i64, col: i64) {
        let Some(session_id) = self.connections.session_of(self.connection_id) else {
            self.reply(ServerMessage::Invalid("Not in a game".into()));
            return;
        };
        let Some(shared) = self.sessions.get(session_id).await else {
            self.reply(ServerMessage::Invalid("Game not found".into()));
            return;
        };

        let mut session = shared.lock().await;
        let outcome = match session.apply_move(self.connection_id, row, col) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(
                    connection_id = self.connection_id,
                    session_id,
                    "🚫 MOVE {} {} rejected: {}", row, col, e
                );
                self.reply(ServerMessage::Invalid(e.to_string()));
                self.resend_turn_notice(&session);
                return;
            }
        };

        self.send_to_players(&session, &ServerMessage::Board(session.board().clone()));
        match outcome {
            MoveOutcome::Moved { next } => {
                self.broadcaster.send(next, ServerMessage::YourTurn);
            }
            MoveOutcome::Win { winner, symbol } => {
                for player in session.players() {
                    let result = if player.connection_id == winner {
                        ServerMessage::Win
                    } else {
                        ServerMessage::Lose
                    };
                    self.broadcaster.send(player.connection_id, result);
                }
                if let Some(player) = session.winner() {
                    info!(
                        session_id,
                        connection_id = player.connection_id,
                        peer = %player.remote_addr,
                        "🏆 Session won by {}", symbol
                    );
                }
            }
            MoveOutcome::Draw => {
                self.send_to_players(&session, &ServerMessage::Draw);
                info!(session_id, "🤝 Session ended in a draw");
            }
        }
    }

    /// Answers a line that failed to parse.
    async fn handle_malformed(&self, error: CommandError) {
        if !error.is_move() {
            self.reply(ServerMessage::Error(error.to_string()));
            return;
        }

        self.reply(ServerMessage::Invalid(error.to_string()));
        if let Some(session_id) = self.connections.session_of(self.connection_id) {
            if let Some(shared) = self.sessions.get(session_id).await {
                self.resend_turn_notice(&*shared.lock().await);
            }
        }
    }

    /// Fails if this connection is seated in a session that is still forming
    /// or running. A seat in an ended session is given up first.
    async fn ensure_free(&self) -> Result<(), GameError> {
        let Some(session_id) = self.connections.session_of(self.connection_id) else {
            return Ok(());
        };
        let phase = match self.sessions.get(session_id).await {
            Some(shared) => shared.lock().await.phase(),
            None => Phase::Ended,
        };
        if phase == Phase::Ended {
            self.leave_session().await;
            Ok(())
        } else {
            Err(GameError::State(format!("Already in game {session_id}")))
        }
    }

    /// Removes this connection from its session, notifying the players left
    /// behind, and drops the session from the registry if it was aborted.
    pub async fn leave_session(&self) {
        let Some(session_id) = self.connections.take_session(self.connection_id) else {
            return;
        };
        let Some(shared) = self.sessions.get(session_id).await else {
            return;
        };

        let departure = {
            let mut session = shared.lock().await;
            let departure = session.remove_player(self.connection_id);
            match departure {
                Some(Departure::Removed { turn_passed_to, .. }) => {
                    self.send_to_players(&session, &ServerMessage::PlayerLeft);
                    if let Some(next) = turn_passed_to {
                        self.broadcaster.send(next, ServerMessage::YourTurn);
                    }
                }
                Some(Departure::Abort { .. }) => {
                    for remaining in session.connection_ids() {
                        self.connections.take_session(remaining);
                    }
                    self.send_to_players(&session, &ServerMessage::PlayerLeft);
                    self.send_to_players(&session, &ServerMessage::GameAborted);
                }
                None => {}
            }
            departure
        };

        if let Some(Departure::Abort { .. }) = departure {
            info!(session_id, "💥 Session aborted");
            self.sessions.remove(session_id).await;
        }
    }
}

/// Routes one raw inbound line for the connection described by `ctx`.
///
/// # Message Flow
///
/// 1. Parse the line into a [`Command`]; blank lines are ignored
/// 2. Answer malformed lines without touching any session
/// 3. Dispatch the command to its handler
/// 4. Tell the caller whether to keep the connection open
pub async fn route_client_message(line: &str, ctx: &ConnectionContext) -> Dispatch {
    let command = match Command::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Dispatch::Continue,
        Err(error) => {
            debug!(connection_id = ctx.connection_id, "❓ Malformed line {:?} ({})", line, error);
            ctx.handle_malformed(error).await;
            return Dispatch::Continue;
        }
    };

    debug!(connection_id = ctx.connection_id, "📨 {:?}", command);
    match command {
        Command::List => ctx.handle_list().await,
        Command::Create { players } => ctx.handle_create(players).await,
        Command::Join { session_id } => ctx.handle_join(session_id).await,
        Command::Move { row, col } => ctx.handle_move(row, col).await,
        Command::Exit => {
            ctx.reply(ServerMessage::Bye);
            return Dispatch::Close;
        }
    }
    Dispatch::Continue
}
