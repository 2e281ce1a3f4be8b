//! Read-only views of the engine handed to callers.
//!
//! Snapshots are only ever taken of full boards, so they hold plain colors.

use std::hash::Hasher;

use crate::board::Board;
use crate::matches::MatchSet;
use crate::types::{Cell, Color, Position};

/// Stable 64-bit FNV-1a hasher for deterministic `state_hash`.
///
/// `DefaultHasher` output is not guaranteed stable across Rust versions.
#[derive(Debug, Clone)]
struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

/// Full board as rows of colors, top row first
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardSnapshot {
    pub rows: Vec<Vec<Color>>,
}

impl BoardSnapshot {
    /// Capture a board. None if any cell is empty
    pub fn capture(board: &Board) -> Option<Self> {
        board.to_rows().map(|rows| Self { rows })
    }

    pub fn get(&self, pos: Position) -> Option<Color> {
        if pos.row < 0 || pos.col < 0 {
            return None;
        }
        self.rows
            .get(pos.row as usize)
            .and_then(|r| r.get(pos.col as usize))
            .copied()
    }
}

/// One cascade round: what matched, and the board around the removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStep {
    pub matches: MatchSet,
    /// Immediately before the matched tiles were removed
    pub board_before: BoardSnapshot,
    /// After removal and gravity refill
    pub board_after: BoardSnapshot,
}

/// Result of a move attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub success: bool,
    /// Every round's matches, concatenated in round order
    pub matches: Vec<Position>,
    /// The board right after the swap, before any cascade (None on failure)
    pub board_after_swap: Option<BoardSnapshot>,
    pub chain_steps: Vec<ChainStep>,
}

impl MoveOutcome {
    /// An invalid move: nothing happened
    pub fn rejected() -> Self {
        Self {
            success: false,
            matches: Vec::new(),
            board_after_swap: None,
            chain_steps: Vec::new(),
        }
    }

    /// Number of cascade rounds resolved
    pub fn rounds(&self) -> usize {
        self.chain_steps.len()
    }

    /// Tiles cleared over the whole chain
    pub fn tiles_cleared(&self) -> usize {
        self.matches.len()
    }
}

/// Externally visible game state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub board: BoardSnapshot,
    pub score: u64,
    pub moves: u32,
    /// Increments every time a new board is dealt
    pub game_id: u32,
    pub state_hash: u64,
}

/// Deterministic hash over dimensions, tiles, score, moves and game id
pub fn state_hash(board: &Board, score: u64, moves: u32, game_id: u32) -> u64 {
    let mut hasher = Fnv1aHasher::new();
    hasher.write(&(board.rows() as u64).to_le_bytes());
    hasher.write(&(board.cols() as u64).to_le_bytes());
    for cell in board.cells() {
        hasher.write_u8(match cell {
            Cell::Filled(c) => c.id(),
            Cell::Empty => 0,
        });
    }
    hasher.write(&score.to_le_bytes());
    hasher.write(&moves.to_le_bytes());
    hasher.write(&game_id.to_le_bytes());
    hasher.finish()
}
