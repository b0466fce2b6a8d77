//! Game rules: board, symbols, and the session state machine.
//!
//! Nothing in here touches the network. The dispatcher in
//! [`crate::messaging`] turns the results into wire notifications.

pub mod board;
pub mod session;
pub mod symbols;

pub use board::{Board, Cell, WIN_LENGTH};
pub use session::{
    Departure, MoveOutcome, Phase, Player, Session, SessionId, MAX_PLAYERS, MIN_PLAYERS,
};
pub use symbols::{Symbol, SymbolPool, SYMBOLS};
