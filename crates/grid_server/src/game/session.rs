//! A single game session: seats, turn order, board and lifecycle.
//!
//! `Session` is plain synchronous state. Callers share it behind a
//! `tokio::sync::Mutex` (see [`crate::registry::SharedSession`]) so that every
//! join, move and departure runs as one critical section.

use super::board::Board;
use super::symbols::{Symbol, SymbolPool};
use crate::connection::ConnectionId;
use crate::error::GameError;
use std::net::SocketAddr;

/// Identifier of a session, allocated sequentially from 1 and never reused.
pub type SessionId = u64;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 13;

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for seats to fill
    Forming,
    /// Seats are full and moves are accepted
    Active,
    /// Won, drawn, or aborted
    Ended,
}

/// A seated player. Join order is turn order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub connection_id: ConnectionId,
    pub remote_addr: SocketAddr,
    pub symbol: Symbol,
}

/// Result of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The game continues and `next` now holds the turn
    Moved { next: ConnectionId },
    /// The mover completed a line
    Win { winner: ConnectionId, symbol: Symbol },
    /// The board filled without a line
    Draw,
}

/// Result of removing a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The session carries on. `turn_passed_to` is set when the departed
    /// player held the turn and someone else now does.
    Removed {
        symbol: Symbol,
        turn_passed_to: Option<ConnectionId>,
    },
    /// Too few players remain; the session is over and should be dropped
    Abort { symbol: Symbol },
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    capacity: usize,
    board: Board,
    players: Vec<Player>,
    turn: usize,
    phase: Phase,
    winner: Option<ConnectionId>,
    move_count: usize,
    symbols: SymbolPool,
}

impl Session {
    /// Creates a forming session with a `(capacity + 1)²` board.
    pub fn new(id: SessionId, capacity: usize) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&capacity) {
            return Err(GameError::Validation(format!(
                "Number of players must be {MIN_PLAYERS}-{MAX_PLAYERS}"
            )));
        }
        Ok(Self {
            id,
            capacity,
            board: Board::new(capacity + 1),
            players: Vec::with_capacity(capacity),
            turn: 0,
            phase: Phase::Forming,
            winner: None,
            move_count: 0,
            symbols: SymbolPool::new(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dimension(&self) -> usize {
        self.board.dimension()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn joined_count(&self) -> usize {
        self.players.len()
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    pub fn winner(&self) -> Option<&Player> {
        let winner = self.winner?;
        self.player(winner)
    }

    pub fn player(&self, connection_id: ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| p.connection_id == connection_id)
    }

    /// Connection ids of every seated player, in turn order.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.players.iter().map(|p| p.connection_id).collect()
    }

    /// Seats a new player and hands out the next free symbol.
    ///
    /// The join that fills the last seat also flips the session to
    /// [`Phase::Active`], with the first joiner holding the turn.
    pub fn add_player(
        &mut self,
        connection_id: ConnectionId,
        remote_addr: SocketAddr,
    ) -> Result<Symbol, GameError> {
        match self.phase {
            Phase::Forming => {}
            Phase::Active | Phase::Ended => {
                return Err(GameError::State("Game already started".into()))
            }
        }
        if self.players.len() >= self.capacity {
            return Err(GameError::Capacity {
                capacity: self.capacity,
            });
        }
        let symbol = self
            .symbols
            .take()
            .ok_or_else(|| GameError::State("No symbols available".into()))?;

        self.players.push(Player {
            connection_id,
            remote_addr,
            symbol,
        });
        if self.players.len() == self.capacity {
            self.phase = Phase::Active;
            self.turn = 0;
        }
        Ok(symbol)
    }

    /// The player holding the turn. Only an active session has one.
    pub fn current_player(&self) -> Option<&Player> {
        match self.phase {
            Phase::Active => self.players.get(self.turn),
            _ => None,
        }
    }

    pub fn is_current(&self, connection_id: ConnectionId) -> bool {
        self.current_player()
            .is_some_and(|p| p.connection_id == connection_id)
    }

    /// Applies a move for `connection_id`.
    ///
    /// Checks turn, then bounds, then occupancy; a rejected move leaves the
    /// session untouched. An accepted move is tested for a win before a draw.
    pub fn apply_move(
        &mut self,
        connection_id: ConnectionId,
        row: i64,
        col: i64,
    ) -> Result<MoveOutcome, GameError> {
        let symbol = match self.current_player() {
            Some(player) if player.connection_id == connection_id => player.symbol,
            _ => return Err(GameError::Turn),
        };

        let dimension = self.dimension();
        let (r, c) = match (usize::try_from(row), usize::try_from(col)) {
            (Ok(r), Ok(c)) if r < dimension && c < dimension => (r, c),
            _ => return Err(GameError::Bounds { row, col, dimension }),
        };
        if self.board.get(r, c) != Some(None) {
            return Err(GameError::Occupancy { row: r, col: c });
        }

        self.board.place(r, c, symbol);
        self.move_count += 1;

        if self.board.completes_line(r, c, symbol) {
            self.phase = Phase::Ended;
            self.winner = Some(connection_id);
            return Ok(MoveOutcome::Win {
                winner: connection_id,
                symbol,
            });
        }
        if self.move_count == dimension * dimension {
            self.phase = Phase::Ended;
            return Ok(MoveOutcome::Draw);
        }

        self.turn = (self.turn + 1) % self.players.len();
        Ok(MoveOutcome::Moved {
            next: self.players[self.turn].connection_id,
        })
    }

    /// Removes a player and returns its symbol to the pool.
    ///
    /// Returns `None` if the connection holds no seat here. The turn passes
    /// to the next remaining player in join order.
    pub fn remove_player(&mut self, connection_id: ConnectionId) -> Option<Departure> {
        let index = self
            .players
            .iter()
            .position(|p| p.connection_id == connection_id)?;
        let player = self.players.remove(index);
        self.symbols.give_back(player.symbol);
        let symbol = player.symbol;

        if self.players.is_empty() {
            self.phase = Phase::Ended;
            return Some(Departure::Abort { symbol });
        }

        if self.phase != Phase::Active {
            return Some(Departure::Removed {
                symbol,
                turn_passed_to: None,
            });
        }

        if self.players.len() <= 1 {
            self.phase = Phase::Ended;
            return Some(Departure::Abort { symbol });
        }

        let held_turn = index == self.turn;
        if index < self.turn {
            self.turn -= 1;
        } else if self.turn >= self.players.len() {
            self.turn = 0;
        }

        Some(Departure::Removed {
            symbol,
            turn_passed_to: held_turn.then(|| self.players[self.turn].connection_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn active_session(capacity: usize) -> Session {
        let mut session = Session::new(1, capacity).expect("valid capacity");
        for conn in 1..=capacity {
            session.add_player(conn, addr(conn as u16)).expect("seat available");
        }
        session
    }

    #[test]
    fn test_dimension_follows_capacity() {
        for capacity in MIN_PLAYERS..=MAX_PLAYERS {
            let session = Session::new(7, capacity).expect("valid capacity");
            assert_eq!(session.dimension(), capacity + 1);
            assert_eq!(session.phase(), Phase::Forming);
        }
    }

    #[test]
    fn test_capacity_out_of_range_is_rejected() {
        for capacity in [0, 1, 14, 100] {
            assert!(matches!(
                Session::new(1, capacity),
                Err(GameError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_becomes_active_on_last_join() {
        let mut session = Session::new(1, 3).unwrap();
        assert_eq!(session.add_player(10, addr(1)), Ok('X'));
        assert_eq!(session.add_player(11, addr(2)), Ok('O'));
        assert_eq!(session.phase(), Phase::Forming);
        assert!(session.current_player().is_none());
        assert_eq!(session.add_player(12, addr(3)), Ok('△'));
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.current_player().map(|p| p.connection_id), Some(10));

        assert_eq!(
            session.add_player(13, addr(4)),
            Err(GameError::State("Game already started".into()))
        );
    }

    #[test]
    fn test_turn_order_is_join_order() {
        let mut session = active_session(3);
        assert_eq!(session.apply_move(1, 0, 0), Ok(MoveOutcome::Moved { next: 2 }));
        assert_eq!(session.apply_move(2, 0, 3), Ok(MoveOutcome::Moved { next: 3 }));
        assert_eq!(session.apply_move(3, 3, 0), Ok(MoveOutcome::Moved { next: 1 }));
        assert_eq!(session.apply_move(2, 1, 1), Err(GameError::Turn));
    }

    #[test]
    fn test_rejections_follow_check_order_and_leave_board_alone() {
        let mut session = active_session(2);
        session.apply_move(1, 1, 1).unwrap();
        let before = session.board().clone();

        // Wrong player targeting an occupied, out-of-range cell: turn wins.
        assert_eq!(session.apply_move(1, 9, 9), Err(GameError::Turn));
        assert!(matches!(
            session.apply_move(2, -1, 0),
            Err(GameError::Bounds { .. })
        ));
        assert!(matches!(
            session.apply_move(2, 3, 0),
            Err(GameError::Bounds { .. })
        ));
        assert_eq!(
            session.apply_move(2, 1, 1),
            Err(GameError::Occupancy { row: 1, col: 1 })
        );
        assert_eq!(session.board(), &before);
        assert_eq!(session.move_count(), 1);
        assert!(session.is_current(2));
    }

    #[test]
    fn test_occupied_cells_are_always_rejected() {
        let mut session = active_session(2);
        let moves = [(1, 0, 0), (2, 1, 1), (1, 2, 2), (2, 0, 2)];
        for (i, &(conn, r, c)) in moves.iter().enumerate() {
            session.apply_move(conn, r, c).unwrap();
            let next = session.current_player().unwrap().connection_id;
            for &(_, taken_row, taken_col) in &moves[..=i] {
                let snapshot = session.board().clone();
                assert!(matches!(
                    session.apply_move(next, taken_row, taken_col),
                    Err(GameError::Occupancy { .. })
                ));
                assert_eq!(session.board(), &snapshot);
            }
        }
        assert_eq!(session.move_count(), session.board().occupied());
    }

    #[test]
    fn test_win_on_fifth_move() {
        let mut session = active_session(2);
        assert_eq!(session.dimension(), 3);
        session.apply_move(1, 0, 0).unwrap();
        session.apply_move(2, 1, 0).unwrap();
        session.apply_move(1, 0, 1).unwrap();
        session.apply_move(2, 1, 1).unwrap();
        assert_eq!(
            session.apply_move(1, 0, 2),
            Ok(MoveOutcome::Win { winner: 1, symbol: 'X' })
        );
        assert_eq!(session.phase(), Phase::Ended);
        assert_eq!(session.winner().map(|p| p.symbol), Some('X'));
        assert_eq!(
            session.board().to_string(),
            "BOARD\nX X X\nO O .\n. . ."
        );
        assert_eq!(session.apply_move(2, 2, 2), Err(GameError::Turn));
    }

    #[test]
    fn test_draw_on_ninth_move() {
        let mut session = active_session(2);
        // X O X / X O O / O X X
        let moves = [
            (1, 0, 0),
            (2, 0, 1),
            (1, 0, 2),
            (2, 1, 1),
            (1, 1, 0),
            (2, 1, 2),
            (1, 2, 1),
            (2, 2, 0),
        ];
        for (conn, r, c) in moves {
            assert!(matches!(
                session.apply_move(conn, r, c),
                Ok(MoveOutcome::Moved { .. })
            ));
        }
        assert_eq!(session.apply_move(1, 2, 2), Ok(MoveOutcome::Draw));
        assert_eq!(session.phase(), Phase::Ended);
        assert!(session.winner().is_none());
        assert!(session.board().is_full());
    }

    #[test]
    fn test_win_on_final_cell_beats_draw() {
        let mut session = active_session(2);
        // X O X / O X O / O X X  -> last X at (2,2) closes the main diagonal
        let moves = [
            (1, 0, 0),
            (2, 0, 1),
            (1, 0, 2),
            (2, 1, 0),
            (1, 1, 1),
            (2, 1, 2),
            (1, 2, 1),
            (2, 2, 0),
        ];
        for (conn, r, c) in moves {
            session.apply_move(conn, r, c).unwrap();
        }
        assert_eq!(
            session.apply_move(1, 2, 2),
            Ok(MoveOutcome::Win { winner: 1, symbol: 'X' })
        );
    }

    #[test]
    fn test_leaving_forming_session_returns_symbol() {
        let mut session = Session::new(1, 3).unwrap();
        session.add_player(1, addr(1)).unwrap();
        session.add_player(2, addr(2)).unwrap();
        assert_eq!(
            session.remove_player(2),
            Some(Departure::Removed { symbol: 'O', turn_passed_to: None })
        );
        assert_eq!(session.phase(), Phase::Forming);
        assert_eq!(session.add_player(3, addr(3)), Ok('△'));
        assert_eq!(session.remove_player(99), None);
    }

    #[test]
    fn test_last_player_leaving_aborts() {
        let mut session = Session::new(1, 2).unwrap();
        session.add_player(1, addr(1)).unwrap();
        assert_eq!(session.remove_player(1), Some(Departure::Abort { symbol: 'X' }));
        assert_eq!(session.phase(), Phase::Ended);
    }

    #[test]
    fn test_active_session_dropping_to_one_aborts() {
        let mut session = active_session(2);
        assert_eq!(session.remove_player(2), Some(Departure::Abort { symbol: 'O' }));
        assert_eq!(session.phase(), Phase::Ended);
    }

    #[test]
    fn test_turn_passes_to_next_player_when_holder_leaves() {
        let mut session = active_session(4);
        session.apply_move(1, 0, 0).unwrap();
        // Player 2 holds the turn and leaves: player 3 is next.
        assert_eq!(
            session.remove_player(2),
            Some(Departure::Removed { symbol: 'O', turn_passed_to: Some(3) })
        );
        assert!(session.is_current(3));
    }

    #[test]
    fn test_turn_stays_with_holder_when_earlier_player_leaves() {
        let mut session = active_session(4);
        session.apply_move(1, 0, 0).unwrap();
        session.apply_move(2, 0, 1).unwrap();
        assert!(session.is_current(3));
        assert_eq!(
            session.remove_player(1),
            Some(Departure::Removed { symbol: 'X', turn_passed_to: None })
        );
        assert!(session.is_current(3));
        assert_eq!(session.apply_move(3, 4, 4), Ok(MoveOutcome::Moved { next: 4 }));
        assert_eq!(session.apply_move(4, 4, 0), Ok(MoveOutcome::Moved { next: 2 }));
    }

    #[test]
    fn test_turn_wraps_when_last_seat_holder_leaves() {
        let mut session = active_session(3);
        session.apply_move(1, 0, 0).unwrap();
        session.apply_move(2, 0, 1).unwrap();
        assert_eq!(
            session.remove_player(3),
            Some(Departure::Removed { symbol: '△', turn_passed_to: Some(1) })
        );
        assert!(session.is_current(1));
    }
}
