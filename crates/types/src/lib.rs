//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (engine logic, wire protocol, benchmarks).
//!
//! # Board Dimensions
//!
//! The reference board is 8 rows by 8 columns. Dimensions are fixed for the
//! lifetime of a board but may be configured per game.
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_ROWS` | 8 | Rows on a default board |
//! | `DEFAULT_COLS` | 8 | Columns on a default board |
//! | `MIN_RUN` | 3 | Shortest run that counts as a match |
//! | `POINTS_PER_TILE` | 10 | Score for every cleared tile |
//! | `MAX_CASCADE_ROUNDS` | 1000 | Safety valve on a single move's cascade |
//!
//! # Examples
//!
//! ```
//! use match3_types::{Cell, Color, Position, PALETTE};
//!
//! // Parse from string (case-insensitive)
//! let parsed = Color::from_str("Red").unwrap();
//! assert_eq!(parsed, Color::Red);
//! assert_eq!(PALETTE.len(), 6);
//!
//! // Cells are explicitly filled or empty
//! assert_eq!(Cell::Filled(Color::Blue).color(), Some(Color::Blue));
//! assert_eq!(Cell::Empty.color(), None);
//!
//! // Positions are (row, col)
//! let a = Position::new(0, 0);
//! let b = Position::new(0, 1);
//! assert_eq!(a.manhattan(b), 1);
//! ```

/// Rows on a default board
pub const DEFAULT_ROWS: usize = 8;

/// Columns on a default board
pub const DEFAULT_COLS: usize = 8;

/// Shortest run of identical colors that counts as a match
pub const MIN_RUN: usize = 3;

/// Points awarded for every tile cleared by a match
pub const POINTS_PER_TILE: u64 = 10;

/// Upper bound on cascade rounds resolved for a single move.
///
/// Refills are independent random draws, so an endless cascade is not
/// impossible, only vanishingly unlikely. Resolution stops here if it ever
/// happens.
pub const MAX_CASCADE_ROUNDS: usize = 1000;

/// Tile colors
///
/// The palette is closed; the engine only ever compares colors for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

/// Number of colors in the palette
pub const PALETTE_SIZE: usize = 6;

/// Every color, in palette order
pub const PALETTE: [Color; PALETTE_SIZE] = [
    Color::Red,
    Color::Blue,
    Color::Green,
    Color::Yellow,
    Color::Purple,
    Color::Orange,
];

// Board generation excludes at most two colors per cell (one per axis).
const _: () = assert!(PALETTE_SIZE >= MIN_RUN);

impl Color {
    /// Parse color from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use match3_types::Color;
    ///
    /// assert_eq!(Color::from_str("purple"), Some(Color::Purple));
    /// assert_eq!(Color::from_str("ORANGE"), Some(Color::Orange));
    /// assert_eq!(Color::from_str("teal"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        PALETTE
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
    }

    /// Convert to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Purple => "purple",
            Color::Orange => "orange",
        }
    }

    /// Stable small-integer id (1-based, 0 is reserved for empty)
    pub fn id(&self) -> u8 {
        match self {
            Color::Red => 1,
            Color::Blue => 2,
            Color::Green => 3,
            Color::Yellow => 4,
            Color::Purple => 5,
            Color::Orange => 6,
        }
    }
}

/// A cell on the board
///
/// - `Filled(Color)`: a tile is present
/// - `Empty`: the tile was just cleared and the column has not been refilled yet
///
/// `Empty` only exists between match removal and gravity refill. Every
/// externally visible board is fully `Filled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Filled(Color),
    Empty,
}

impl Cell {
    /// The tile color, if any
    pub fn color(&self) -> Option<Color> {
        match self {
            Cell::Filled(c) => Some(*c),
            Cell::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Whether two cells belong to the same run.
    ///
    /// Empty never matches anything, including another empty cell.
    pub fn same_color(&self, other: &Cell) -> bool {
        match (self, other) {
            (Cell::Filled(a), Cell::Filled(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Color> for Cell {
    fn from(value: Color) -> Self {
        Cell::Filled(value)
    }
}

/// Board coordinate: (row, col), 0-indexed, row 0 at the top.
///
/// Coordinates are signed so that out-of-range requests from callers can be
/// represented and rejected by bounds checks instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Manhattan distance to another position
    pub fn manhattan(&self, other: Position) -> u32 {
        self.row.abs_diff(other.row).saturating_add(self.col.abs_diff(other.col))
    }

    /// Edge-adjacent (exactly one step horizontally or vertically)
    pub fn is_adjacent(&self, other: Position) -> bool {
        self.manhattan(other) == 1
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(i32, i32)> for Position {
    fn from((row, col): (i32, i32)) -> Self {
        Self { row, col }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_rule_constants() {
        assert_eq!(DEFAULT_ROWS, 8);
        assert_eq!(DEFAULT_COLS, 8);
        assert_eq!(MIN_RUN, 3);
        assert_eq!(POINTS_PER_TILE, 10);
        assert_eq!(PALETTE.len(), 6);
    }

    #[test]
    fn test_color_string_roundtrip() {
        for c in PALETTE {
            assert_eq!(Color::from_str(c.as_str()), Some(c));
        }
    }

    #[test]
    fn test_color_ids_are_distinct_and_nonzero() {
        let mut ids: Vec<u8> = PALETTE.iter().map(|c| c.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), PALETTE.len());
        assert!(!ids.contains(&0));
    }

    #[test]
    fn test_empty_never_matches() {
        assert!(!Cell::Empty.same_color(&Cell::Empty));
        assert!(!Cell::Empty.same_color(&Cell::Filled(Color::Red)));
        assert!(Cell::Filled(Color::Red).same_color(&Cell::Filled(Color::Red)));
        assert!(!Cell::Filled(Color::Red).same_color(&Cell::Filled(Color::Blue)));
    }

    #[test]
    fn test_adjacency() {
        let p = Position::new(2, 2);
        assert!(p.is_adjacent(Position::new(1, 2)));
        assert!(p.is_adjacent(Position::new(2, 3)));
        assert!(!p.is_adjacent(p));
        assert!(!p.is_adjacent(Position::new(3, 3)));
        assert!(!p.is_adjacent(Position::new(2, 4)));
        assert_eq!(Position::new(-1, 0).manhattan(Position::new(0, 0)), 1);
    }
}
