//! Message type definitions for client-server communication.
//!
//! The protocol is newline-delimited UTF-8 text. Each inbound line carries
//! one [`Command`]; each [`ServerMessage`] renders to one or more outbound
//! lines (a board snapshot spans several).

use crate::game::{Board, SessionId, Symbol};
use crate::registry::LobbyEntry;
use std::fmt;

/// A command sent from a client to the server.
///
/// # Examples
///
/// ```text
/// LIST
/// CREATE 3
/// JOIN 1
/// MOVE 0 2
/// EXIT
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    List,
    Create { players: usize },
    Join { session_id: SessionId },
    Move { row: i64, col: i64 },
    Exit,
}

/// Reasons a line could not be turned into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Invalid CREATE command")]
    MissingPlayerCount,
    #[error("Invalid number of players")]
    BadPlayerCount,
    #[error("Invalid JOIN command")]
    MissingSessionId,
    #[error("Invalid game ID")]
    BadSessionId,
    #[error("Missing row or column")]
    MissingCoordinates,
    #[error("Invalid move format (use: MOVE <row> <col>)")]
    BadCoordinates,
    #[error("Unknown command: {0}")]
    Unknown(String),
}

impl CommandError {
    /// Malformed MOVE lines are answered like illegal moves.
    pub fn is_move(&self) -> bool {
        matches!(
            self,
            CommandError::MissingCoordinates | CommandError::BadCoordinates
        )
    }
}

impl Command {
    /// Parses one inbound line.
    ///
    /// Returns `Ok(None)` for a blank line. The verb is matched without regard
    /// to case and arguments past the required ones are ignored.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Ok(None);
        };

        let command = match verb.to_ascii_uppercase().as_str() {
            "LIST" => Command::List,
            "CREATE" => {
                let players = parts.next().ok_or(CommandError::MissingPlayerCount)?;
                Command::Create {
                    players: players.parse().map_err(|_| CommandError::BadPlayerCount)?,
                }
            }
            "JOIN" => {
                let id = parts.next().ok_or(CommandError::MissingSessionId)?;
                Command::Join {
                    session_id: id.parse().map_err(|_| CommandError::BadSessionId)?,
                }
            }
            "MOVE" => {
                let (Some(row), Some(col)) = (parts.next(), parts.next()) else {
                    return Err(CommandError::MissingCoordinates);
                };
                match (row.parse(), col.parse()) {
                    (Ok(row), Ok(col)) => Command::Move { row, col },
                    _ => return Err(CommandError::BadCoordinates),
                }
            }
            "EXIT" => Command::Exit,
            _ => return Err(CommandError::Unknown(verb.to_string())),
        };
        Ok(Some(command))
    }
}

/// A notification sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Games(Vec<LobbyEntry>),
    Created(SessionId),
    Joined(Symbol),
    Wait,
    Board(Board),
    YourTurn,
    Win,
    Lose,
    Draw,
    Invalid(String),
    PlayerLeft,
    GameAborted,
    Bye,
    Error(String),
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Games(entries) => {
                write!(f, "GAMES ")?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{entry}")?;
                }
                Ok(())
            }
            ServerMessage::Created(id) => write!(f, "CREATED {id}"),
            ServerMessage::Joined(symbol) => write!(f, "JOINED {symbol}"),
            ServerMessage::Wait => write!(f, "WAIT"),
            ServerMessage::Board(board) => write!(f, "{board}"),
            ServerMessage::YourTurn => write!(f, "YOURTURN"),
            ServerMessage::Win => write!(f, "WIN"),
            ServerMessage::Lose => write!(f, "LOSE"),
            ServerMessage::Draw => write!(f, "DRAW"),
            ServerMessage::Invalid(reason) => write!(f, "INVALID {reason}"),
            ServerMessage::PlayerLeft => write!(f, "PLAYER_LEFT"),
            ServerMessage::GameAborted => write!(f, "GAME_ABORTED"),
            ServerMessage::Bye => write!(f, "BYE"),
            ServerMessage::Error(reason) => write!(f, "ERROR {reason}"),
        }
    }
}

impl From<ServerMessage> for String {
    fn from(message: ServerMessage) -> Self {
        message.to_string()
    }
}
