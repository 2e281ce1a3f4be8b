//! Match detection
//!
//! Rows are scanned left to right and columns top to bottom, independently.
//! Every maximal run of at least [`MIN_RUN`] identical tiles contributes all of
//! its positions. A position that sits in both a horizontal and a vertical run
//! is reported once.

use std::collections::BTreeSet;

use crate::board::Board;
use crate::types::{Cell, Position, MIN_RUN};

/// Deduplicated set of matched positions, iterated in row-major order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    positions: BTreeSet<Position>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.positions.contains(&pos)
    }

    /// Add a position. Returns false if it was already present
    pub fn insert(&mut self, pos: Position) -> bool {
        self.positions.insert(pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> + '_ {
        self.positions.iter()
    }

    pub fn to_vec(&self) -> Vec<Position> {
        self.positions.iter().copied().collect()
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a Position;
    type IntoIter = std::collections::btree_set::Iter<'a, Position>;

    fn into_iter(self) -> Self::IntoIter {
        self.positions.iter()
    }
}

impl FromIterator<Position> for MatchSet {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

/// Find every position that belongs to a run of three or more
pub fn find_matches(board: &Board) -> MatchSet {
    let mut found = MatchSet::new();
    let (rows, cols) = (board.rows(), board.cols());

    for row in 0..rows {
        scan_line(cols, |i| (row, i), board, &mut found);
    }
    for col in 0..cols {
        scan_line(rows, |i| (i, col), board, &mut found);
    }

    found
}

/// Scan one row or column. `at` maps an offset along the line to (row, col).
fn scan_line<F>(len: usize, at: F, board: &Board, found: &mut MatchSet)
where
    F: Fn(usize) -> (usize, usize),
{
    let cell = |i: usize| -> Cell {
        let (r, c) = at(i);
        board.cell_at(r, c)
    };

    let mut start = 0;
    while start < len {
        let first = cell(start);
        let mut end = start + 1;

        // Empty cells break runs and never start one.
        if !first.is_empty() {
            while end < len && cell(end).same_color(&first) {
                end += 1;
            }
            if end - start >= MIN_RUN {
                for i in start..end {
                    let (r, c) = at(i);
                    found.insert(Position::new(r as i32, c as i32));
                }
            }
        }

        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color::{self, *};

    fn board(rows: Vec<Vec<Color>>) -> Board {
        Board::from_rows(rows).unwrap()
    }

    fn set(positions: &[(i32, i32)]) -> MatchSet {
        positions.iter().map(|&p| Position::from(p)).collect()
    }

    #[test]
    fn test_no_matches() {
        let b = board(vec![
            vec![Red, Red, Blue],
            vec![Green, Blue, Red],
            vec![Blue, Green, Red],
        ]);
        assert!(find_matches(&b).is_empty());
    }

    #[test]
    fn test_horizontal_run() {
        let b = board(vec![vec![Blue, Red, Red, Red], vec![Green, Blue, Green, Blue]]);
        assert_eq!(find_matches(&b), set(&[(0, 1), (0, 2), (0, 3)]));
    }

    #[test]
    fn test_vertical_run_at_end_of_column() {
        let b = board(vec![
            vec![Red, Blue],
            vec![Green, Blue],
            vec![Green, Blue],
            vec![Green, Red],
        ]);
        assert_eq!(
            find_matches(&b),
            set(&[(0, 1), (1, 1), (2, 1), (1, 0), (2, 0), (3, 0)])
        );
    }

    #[test]
    fn test_long_run_counted_once() {
        let b = board(vec![vec![Yellow, Yellow, Yellow, Yellow, Yellow]]);
        assert_eq!(find_matches(&b).len(), 5);
    }

    #[test]
    fn test_run_of_two_ignored() {
        let b = board(vec![vec![Red, Red, Blue, Blue, Red, Red]]);
        assert!(find_matches(&b).is_empty());
    }

    #[test]
    fn test_intersecting_runs_deduplicated() {
        // Plus shape centered on (1, 1)
        let b = board(vec![
            vec![Blue, Red, Green],
            vec![Red, Red, Red],
            vec![Green, Red, Blue],
        ]);
        let found = find_matches(&b);
        assert_eq!(found.len(), 5);
        assert!(found.contains(Position::new(1, 1)));
    }

    #[test]
    fn test_adjacent_runs_split_at_color_change() {
        let b = board(vec![vec![Red, Red, Red, Blue, Blue, Blue, Red]]);
        assert_eq!(
            find_matches(&b),
            set(&[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (0, 5)])
        );
    }

    #[test]
    fn test_empty_cells_break_runs() {
        let mut b = board(vec![vec![Red, Red, Red, Red, Red]]);
        b.clear_cell(Position::new(0, 2));
        assert!(find_matches(&b).is_empty());

        let mut b = board(vec![vec![Red, Red, Red], vec![Red, Red, Red], vec![Red, Red, Red]]);
        for c in 0..3 {
            b.clear_cell(Position::new(1, c));
        }
        // Rows 0 and 2 still match; no column run survives
        assert_eq!(
            find_matches(&b),
            set(&[(0, 0), (0, 1), (0, 2), (2, 0), (2, 1), (2, 2)])
        );
    }

    #[test]
    fn test_match_set_iterates_row_major() {
        let s = set(&[(2, 0), (0, 5), (0, 1)]);
        assert_eq!(
            s.to_vec(),
            vec![Position::new(0, 1), Position::new(0, 5), Position::new(2, 0)]
        );
    }
}
