//! Square game board and line detection.

use super::symbols::Symbol;
use std::fmt;

/// A board cell: empty, or holding one player's symbol.
pub type Cell = Option<Symbol>;

/// Number of consecutive symbols that wins, independent of board size.
pub const WIN_LENGTH: usize = 3;

/// Row, column, main diagonal, anti-diagonal.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// A `dimension × dimension` grid stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    dimension: usize,
    cells: Vec<Cell>,
}

impl Board {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            cells: vec![None; dimension * dimension],
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the cell at `(row, col)`, or `None` when outside the board.
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        if row < self.dimension && col < self.dimension {
            Some(self.cells[row * self.dimension + col])
        } else {
            None
        }
    }

    /// Writes `symbol` into `(row, col)`.
    ///
    /// The caller has already checked bounds and emptiness.
    pub(crate) fn place(&mut self, row: usize, col: usize, symbol: Symbol) {
        debug_assert!(self.get(row, col) == Some(None));
        self.cells[row * self.dimension + col] = Some(symbol);
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.dimension)
    }

    /// Checks whether `symbol` at `(row, col)` sits inside a run of
    /// [`WIN_LENGTH`] along any of the four directions through that cell.
    pub fn completes_line(&self, row: usize, col: usize, symbol: Symbol) -> bool {
        if self.get(row, col) != Some(Some(symbol)) {
            return false;
        }
        DIRECTIONS.iter().any(|&(dr, dc)| {
            let run = 1
                + self.run_length(row, col, dr, dc, symbol)
                + self.run_length(row, col, -dr, -dc, symbol);
            run >= WIN_LENGTH
        })
    }

    fn run_length(&self, row: usize, col: usize, dr: isize, dc: isize, symbol: Symbol) -> usize {
        let mut count = 0;
        let mut r = row as isize + dr;
        let mut c = col as isize + dc;
        while count < WIN_LENGTH - 1 && self.symbol_at(r, c) == Some(symbol) {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }

    fn symbol_at(&self, row: isize, col: isize) -> Option<Symbol> {
        if row < 0 || col < 0 {
            return None;
        }
        self.get(row as usize, col as usize).flatten()
    }
}

/// Wire form of a snapshot: `BOARD` followed by one line per row, cells
/// separated by spaces and empty cells shown as `.`.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BOARD")?;
        for row in self.rows() {
            writeln!(f)?;
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", cell.unwrap_or('.'))?;
            }
        }
        Ok(())
    }
}
