//! Board module - manages the tile grid
//!
//! The board is a rows x cols grid where each cell holds a colored tile, or is
//! transiently empty while a cascade round is between removal and refill.
//! Uses a flat row-major vector for cache locality.
//! Coordinates: (row, col) with row 0 at the top and col 0 at the left.

use arrayvec::ArrayVec;

use crate::matches::{find_matches, MatchSet};
use crate::tiles::TileSource;
use crate::types::{Cell, Color, Position, PALETTE, PALETTE_SIZE};

/// Errors building a board from explicit rows
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("board must have at least one row and one column")]
    Empty,

    #[error("row {row} has {len} cells, expected {expected}")]
    Ragged {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("board dimension {0} exceeds the coordinate range")]
    TooLarge(usize),
}

/// Why a swap was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SwapRejection {
    #[error("position {0} is outside the board")]
    OutOfBounds(Position),

    #[error("{from} and {to} are not adjacent")]
    NotAdjacent { from: Position, to: Position },

    #[error("swap produces no match")]
    NoMatch,
}

/// The game board - flat vector of cells in row-major order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    /// row * cols + col
    cells: Vec<Cell>,
}

impl Board {
    /// Generate a full board that contains no run of three or more.
    ///
    /// Cells are filled in row-major order. A color is excluded for a cell when
    /// the two cells to its left, or the two cells above it, already share that
    /// color. At most two colors are excluded, so the candidate set is never empty.
    pub fn generate<S: TileSource + ?Sized>(rows: usize, cols: usize, tiles: &mut S) -> Self {
        let mut cells: Vec<Cell> = Vec::with_capacity(rows * cols);

        for row in 0..rows {
            for col in 0..cols {
                let mut candidates: ArrayVec<Color, PALETTE_SIZE> = ArrayVec::from(PALETTE);

                if col >= 2 {
                    let left = cells[row * cols + col - 1];
                    let left2 = cells[row * cols + col - 2];
                    exclude_completing(&mut candidates, left, left2);
                }
                if row >= 2 {
                    let up = cells[(row - 1) * cols + col];
                    let up2 = cells[(row - 2) * cols + col];
                    exclude_completing(&mut candidates, up, up2);
                }

                cells.push(Cell::Filled(tiles.pick(&candidates)));
            }
        }

        Self { rows, cols, cells }
    }

    /// Build a board from explicit rows of colors (top row first)
    pub fn from_rows(rows: Vec<Vec<Color>>) -> Result<Self, BoardError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(BoardError::Empty);
        }
        for dim in [height, width] {
            if dim > i32::MAX as usize {
                return Err(BoardError::TooLarge(dim));
            }
        }

        let mut cells = Vec::with_capacity(height * width);
        for (row, colors) in rows.into_iter().enumerate() {
            if colors.len() != width {
                return Err(BoardError::Ragged {
                    row,
                    len: colors.len(),
                    expected: width,
                });
            }
            cells.extend(colors.into_iter().map(Cell::Filled));
        }

        Ok(Self {
            rows: height,
            cols: width,
            cells,
        })
    }

    /// Calculate flat index from a position
    #[inline(always)]
    fn index(&self, pos: Position) -> Option<usize> {
        if pos.row < 0 || pos.col < 0 {
            return None;
        }
        let (row, col) = (pos.row as usize, pos.col as usize);
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(row * self.cols + col)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Check if a position lies on the board
    pub fn contains(&self, pos: Position) -> bool {
        self.index(pos).is_some()
    }

    /// Get cell at a position.
    /// Returns None if out of bounds
    pub fn get(&self, pos: Position) -> Option<Cell> {
        self.index(pos).map(|idx| self.cells[idx])
    }

    /// Cell at in-bounds coordinates
    #[inline(always)]
    pub(crate) fn cell_at(&self, row: usize, col: usize) -> Cell {
        self.cells[row * self.cols + col]
    }

    /// Place a tile.
    /// Returns false if out of bounds
    pub fn set(&mut self, pos: Position, color: Color) -> bool {
        match self.index(pos) {
            Some(idx) => {
                self.cells[idx] = Cell::Filled(color);
                true
            }
            None => false,
        }
    }

    /// Exchange two cells.
    /// Returns false (and changes nothing) if either position is out of bounds
    pub fn swap(&mut self, a: Position, b: Position) -> bool {
        match (self.index(a), self.index(b)) {
            (Some(ia), Some(ib)) => {
                self.cells.swap(ia, ib);
                true
            }
            _ => false,
        }
    }

    /// Every cell holds a tile
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| !c.is_empty())
    }

    /// Get a reference to the internal cells (row-major)
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// All positions in runs of three or more
    pub fn find_matches(&self) -> MatchSet {
        find_matches(self)
    }

    /// Decide whether swapping `a` and `b` is a legal move.
    ///
    /// Legal means both positions are on the board, they are edge-adjacent, and
    /// the swapped board contains at least one match. The match check swaps the
    /// cells, scans, and swaps them back, so the board is unchanged on return.
    pub fn check_swap(&mut self, a: Position, b: Position) -> Result<(), SwapRejection> {
        let (Some(ia), Some(ib)) = (self.index(a), self.index(b)) else {
            let outside = if self.contains(a) { b } else { a };
            return Err(SwapRejection::OutOfBounds(outside));
        };
        if !a.is_adjacent(b) {
            return Err(SwapRejection::NotAdjacent { from: a, to: b });
        }

        self.cells.swap(ia, ib);
        let has_match = !self.find_matches().is_empty();
        self.cells.swap(ia, ib);

        if has_match {
            Ok(())
        } else {
            Err(SwapRejection::NoMatch)
        }
    }

    /// Boolean form of [`Board::check_swap`]
    pub fn is_valid_swap(&mut self, a: Position, b: Position) -> bool {
        self.check_swap(a, b).is_ok()
    }

    /// Empty every matched cell.
    /// Returns the number of tiles removed
    pub fn clear_matches(&mut self, matches: &MatchSet) -> usize {
        let mut removed = 0;
        for pos in matches {
            if let Some(idx) = self.index(*pos) {
                if !self.cells[idx].is_empty() {
                    self.cells[idx] = Cell::Empty;
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Let tiles fall and refill each column from the top.
    ///
    /// Per column, tiles are compacted downward keeping their top-to-bottom
    /// order (two-pointer pass from the bottom), then the vacated top cells are
    /// filled with fresh colors drawn from the whole palette. Refills are not
    /// constrained against matching.
    /// Returns the number of tiles spawned
    pub fn apply_gravity<S: TileSource + ?Sized>(&mut self, tiles: &mut S) -> usize {
        let mut spawned = 0;

        for col in 0..self.cols {
            let mut write_row = self.rows;

            // Scan from bottom to top
            for read_row in (0..self.rows).rev() {
                let cell = self.cell_at(read_row, col);
                if cell.is_empty() {
                    continue;
                }
                write_row -= 1;
                if write_row != read_row {
                    self.cells[write_row * self.cols + col] = cell;
                }
            }

            // Fill the vacated cells at the top
            for row in 0..write_row {
                self.cells[row * self.cols + col] = Cell::Filled(tiles.pick(&PALETTE));
                spawned += 1;
            }
        }

        spawned
    }

    /// Rows of colors (top row first), or None while any cell is empty
    pub fn to_rows(&self) -> Option<Vec<Vec<Color>>> {
        if self.cols == 0 {
            return Some(Vec::new());
        }
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|c| c.color()).collect())
            .collect()
    }

    /// Empty a single cell (for testing)
    #[cfg(test)]
    pub(crate) fn clear_cell(&mut self, pos: Position) {
        if let Some(idx) = self.index(pos) {
            self.cells[idx] = Cell::Empty;
        }
    }
}

/// Drop the color that would complete a run with two equal predecessors
fn exclude_completing(candidates: &mut ArrayVec<Color, PALETTE_SIZE>, a: Cell, b: Cell) {
    if a.same_color(&b) {
        if let Some(color) = a.color() {
            candidates.retain(|c| *c != color);
        }
    }
}
