//! Player symbols and the per-session pool they are drawn from.

use std::collections::VecDeque;

/// A single glyph marking a player's cells on the board.
pub type Symbol = char;

/// The fixed symbol alphabet, in the order players receive them.
///
/// Its length matches the largest allowed session capacity.
pub const SYMBOLS: [Symbol; 13] = [
    'X', 'O', '△', '𝄞', '✿', '♕', '♖', '☀', '♥', '♣', '♦', '♠', '♫',
];

/// FIFO pool of symbols not currently held by a player.
///
/// Symbols are handed out from the front; returned symbols go to the back,
/// so a freed symbol is only reused once the fresh ones run out.
#[derive(Debug, Clone)]
pub struct SymbolPool {
    available: VecDeque<Symbol>,
}

impl SymbolPool {
    pub fn new() -> Self {
        Self {
            available: SYMBOLS.iter().copied().collect(),
        }
    }

    /// Takes the next symbol, or `None` when the alphabet is exhausted.
    pub fn take(&mut self) -> Option<Symbol> {
        self.available.pop_front()
    }

    pub fn give_back(&mut self, symbol: Symbol) {
        self.available.push_back(symbol);
    }
}

impl Default for SymbolPool {
    fn default() -> Self {
        Self::new()
    }
}
