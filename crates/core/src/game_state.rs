//! Game state module - one live game
//!
//! Ties the board, the tile source and the running totals together. Moves are
//! resolved synchronously: a successful swap runs the cascade loop until the
//! board is quiescent before `make_move` returns.

use tracing::{debug, warn};

use crate::board::{Board, SwapRejection};
use crate::scoring::score_for_matches;
use crate::snapshot::{state_hash, BoardSnapshot, ChainStep, GameSnapshot, MoveOutcome};
use crate::tiles::{RandomTiles, TileSource};
use crate::types::{Position, DEFAULT_COLS, DEFAULT_ROWS, MAX_CASCADE_ROUNDS};

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("board must be at least 1x1 (got {rows}x{cols})")]
    ZeroDimension { rows: usize, cols: usize },

    #[error("board dimension {0} exceeds the coordinate range")]
    TooLarge(usize),
}

/// Board shape and randomness for new games
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    /// Fixed seed for reproducible games; OS entropy when None
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::ZeroDimension {
                rows: self.rows,
                cols: self.cols,
            });
        }
        for dim in [self.rows, self.cols] {
            if dim > i32::MAX as usize {
                return Err(ConfigError::TooLarge(dim));
            }
        }
        Ok(())
    }

    /// Tile source matching the configured seed
    pub fn tiles(&self) -> RandomTiles {
        match self.seed {
            Some(seed) => RandomTiles::seeded(seed),
            None => RandomTiles::from_entropy(),
        }
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct Game<S = RandomTiles> {
    board: Board,
    tiles: S,
    score: u64,
    moves: u32,
    game_id: u32,
}

impl Game<RandomTiles> {
    /// Deal a fresh board from the configuration
    pub fn new(config: GameConfig) -> Self {
        Self::with_tiles(config.rows, config.cols, config.tiles())
    }
}

impl<S: TileSource> Game<S> {
    /// Deal a fresh board using the given tile source
    pub fn with_tiles(rows: usize, cols: usize, mut tiles: S) -> Self {
        let board = Board::generate(rows, cols, &mut tiles);
        Self::from_board(board, tiles)
    }

    /// Adopt an existing full board (fixtures, replays)
    pub fn from_board(board: Board, tiles: S) -> Self {
        Self {
            board,
            tiles,
            score: 0,
            moves: 0,
            game_id: 1,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn game_id(&self) -> u32 {
        self.game_id
    }

    pub fn tiles(&self) -> &S {
        &self.tiles
    }

    /// Replace the board with a fresh one of the same size and reset totals
    pub fn new_game(&mut self) -> GameSnapshot {
        self.board = Board::generate(self.board.rows(), self.board.cols(), &mut self.tiles);
        self.score = 0;
        self.moves = 0;
        self.game_id = self.game_id.wrapping_add(1);
        debug!(game_id = self.game_id, "new game dealt");
        self.snapshot()
    }

    /// Read-only view of the current state
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: capture(&self.board),
            score: self.score,
            moves: self.moves,
            game_id: self.game_id,
            state_hash: state_hash(&self.board, self.score, self.moves, self.game_id),
        }
    }

    /// Why swapping `a` and `b` would be refused, if it would. Leaves the board unchanged.
    pub fn check_swap(&mut self, a: Position, b: Position) -> Result<(), SwapRejection> {
        self.board.check_swap(a, b)
    }

    pub fn is_valid_swap(&mut self, a: Position, b: Position) -> bool {
        self.board.is_valid_swap(a, b)
    }

    /// First legal swap in row-major order (right neighbor before down neighbor)
    pub fn hint(&mut self) -> Option<(Position, Position)> {
        let (rows, cols) = (self.board.rows() as i32, self.board.cols() as i32);
        for row in 0..rows {
            for col in 0..cols {
                let from = Position::new(row, col);
                for to in [Position::new(row, col + 1), Position::new(row + 1, col)] {
                    if self.board.is_valid_swap(from, to) {
                        return Some((from, to));
                    }
                }
            }
        }
        None
    }

    /// Attempt a swap and resolve every cascade it triggers.
    ///
    /// An illegal swap (off the board, not adjacent, or no match) changes
    /// nothing and returns [`MoveOutcome::rejected`]. A legal swap counts as a
    /// move, then rounds of find, remove, score and refill repeat until the
    /// board has no match. Each round is recorded as a [`ChainStep`].
    pub fn make_move(&mut self, from: Position, to: Position) -> MoveOutcome {
        if let Err(reason) = self.board.check_swap(from, to) {
            debug!(%from, %to, %reason, "move rejected");
            return MoveOutcome::rejected();
        }

        self.board.swap(from, to);
        self.moves += 1;
        let board_after_swap = capture(&self.board);

        let mut matches = Vec::new();
        let mut chain_steps: Vec<ChainStep> = Vec::new();

        loop {
            let found = self.board.find_matches();
            if found.is_empty() {
                break;
            }
            if chain_steps.len() >= MAX_CASCADE_ROUNDS {
                warn!(
                    rounds = chain_steps.len(),
                    "cascade cap reached; leaving remaining matches on the board"
                );
                break;
            }

            let board_before = capture(&self.board);
            let removed = self.board.clear_matches(&found);
            self.score += score_for_matches(removed);
            self.board.apply_gravity(&mut self.tiles);
            let board_after = capture(&self.board);

            matches.extend(found.iter().copied());
            chain_steps.push(ChainStep {
                matches: found,
                board_before,
                board_after,
            });
        }

        debug!(
            %from,
            %to,
            rounds = chain_steps.len(),
            cleared = matches.len(),
            score = self.score,
            "move resolved"
        );

        MoveOutcome {
            success: true,
            matches,
            board_after_swap: Some(board_after_swap),
            chain_steps,
        }
    }
}

/// Snapshot of a board that is full between operations
fn capture(board: &Board) -> BoardSnapshot {
    BoardSnapshot::capture(board).expect("board is full outside of a cascade round")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::CyclingTiles;
    use crate::types::Color::{self, *};

    fn fixture(rows: Vec<Vec<Color>>) -> Game<CyclingTiles> {
        Game::from_board(Board::from_rows(rows).unwrap(), CyclingTiles::new())
    }

    #[test]
    fn test_new_game_resets_totals() {
        let mut game = Game::new(GameConfig {
            seed: Some(3),
            ..GameConfig::default()
        });
        let first_id = game.game_id();

        if let Some((a, b)) = game.hint() {
            assert!(game.make_move(a, b).success);
            assert!(game.score() > 0);
        }

        let snap = game.new_game();
        assert_eq!(snap.score, 0);
        assert_eq!(snap.moves, 0);
        assert_eq!(snap.game_id, first_id + 1);
        assert_eq!(snap.board.rows.len(), DEFAULT_ROWS);
        assert!(game.board().find_matches().is_empty());
    }

    #[test]
    fn test_single_round_move() {
        let mut game = fixture(vec![
            vec![Red, Red, Blue],
            vec![Green, Blue, Red],
            vec![Blue, Green, Red],
        ]);

        let outcome = game.make_move(Position::new(0, 2), Position::new(1, 2));

        assert!(outcome.success);
        assert_eq!(
            outcome.matches,
            vec![Position::new(0, 0), Position::new(0, 1), Position::new(0, 2)]
        );
        assert_eq!(outcome.rounds(), 1);
        assert_eq!(game.score(), 30);
        assert_eq!(game.moves(), 1);

        let after_swap = outcome.board_after_swap.unwrap();
        assert_eq!(after_swap.rows[0], vec![Red, Red, Red]);
        assert_eq!(after_swap.rows[1], vec![Green, Blue, Blue]);

        let step = &outcome.chain_steps[0];
        assert_eq!(step.board_before, after_swap);
        // Refill draws red, blue, green for columns 0..3
        assert_eq!(step.board_after.rows[0], vec![Red, Blue, Green]);
        assert_eq!(step.board_after.rows[1], vec![Green, Blue, Blue]);
        assert_eq!(step.board_after.rows[2], vec![Blue, Green, Red]);
        assert_eq!(game.snapshot().board, step.board_after);
    }

    #[test]
    fn test_rejected_move_changes_nothing() {
        let mut game = fixture(vec![
            vec![Red, Red, Blue],
            vec![Green, Blue, Red],
            vec![Blue, Green, Red],
        ]);
        let before = game.snapshot();

        for (a, b) in [
            ((0, 0), (0, 0)),
            ((0, 0), (1, 1)),
            ((0, 0), (0, 2)),
            ((2, 0), (2, 1)),
            ((-1, 0), (0, 0)),
            ((2, 2), (3, 2)),
        ] {
            let outcome = game.make_move(Position::from(a), Position::from(b));
            assert_eq!(outcome, MoveOutcome::rejected());
        }

        assert_eq!(game.snapshot(), before);
        assert_eq!(game.tiles().draws(), 0);
    }

    #[test]
    fn test_cascade_records_each_round() {
        let mut game = fixture(vec![
            vec![Yellow, Yellow, Red, Yellow],
            vec![Blue, Yellow, Yellow, Blue],
            vec![Green, Green, Red, Yellow],
            vec![Red, Blue, Yellow, Green],
        ]);

        // Completes a yellow column; the refill then lines up three greens.
        let outcome = game.make_move(Position::new(2, 2), Position::new(2, 3));
        assert!(outcome.success);
        assert_eq!(outcome.rounds(), 2);

        assert_eq!(
            outcome.chain_steps[0].matches.to_vec(),
            vec![Position::new(1, 2), Position::new(2, 2), Position::new(3, 2)]
        );
        assert_eq!(
            outcome.chain_steps[1].matches.to_vec(),
            vec![Position::new(2, 0), Position::new(2, 1), Position::new(2, 2)]
        );
        assert_eq!(outcome.matches.len(), 6);
        assert_eq!(game.score(), 60);
        assert_eq!(game.moves(), 1);

        assert_eq!(
            outcome.chain_steps[0].board_after,
            outcome.chain_steps[1].board_before
        );
        assert_eq!(
            game.snapshot().board.rows,
            vec![
                vec![Yellow, Purple, Orange, Yellow],
                vec![Yellow, Yellow, Red, Blue],
                vec![Blue, Yellow, Blue, Red],
                vec![Red, Blue, Red, Green],
            ]
        );
        assert!(game.board().find_matches().is_empty());
    }

    /// Refills with one color forever
    struct SameColor(Color);

    impl TileSource for SameColor {
        fn pick(&mut self, _candidates: &[Color]) -> Color {
            self.0
        }
    }

    #[test]
    fn test_endless_cascade_stops_at_cap() {
        let board = Board::from_rows(vec![
            vec![Red, Red, Blue],
            vec![Green, Blue, Red],
            vec![Blue, Green, Red],
        ])
        .unwrap();
        let mut game = Game::from_board(board, SameColor(Red));

        // Every refill rebuilds the red top row
        let outcome = game.make_move(Position::new(0, 2), Position::new(1, 2));
        assert!(outcome.success);
        assert_eq!(outcome.rounds(), MAX_CASCADE_ROUNDS);
        assert_eq!(outcome.matches.len(), 3 * MAX_CASCADE_ROUNDS);
        assert_eq!(game.score(), 10 * outcome.matches.len() as u64);
        assert_eq!(game.moves(), 1);

        assert!(game.board().is_full());
        assert!(!game.board().find_matches().is_empty());
        assert_eq!(game.snapshot().board.rows[0], vec![Red, Red, Red]);
    }

    #[test]
    fn test_hint_finds_legal_swap() {
        let mut game = fixture(vec![
            vec![Red, Red, Blue],
            vec![Green, Blue, Red],
            vec![Blue, Green, Red],
        ]);
        let before = game.board().clone();

        let (a, b) = game.hint().unwrap();
        assert_eq!(game.board(), &before);
        assert!(game.is_valid_swap(a, b));
    }

    #[test]
    fn test_hint_none_without_legal_moves() {
        let mut game = fixture(vec![vec![Red, Blue], vec![Green, Yellow]]);
        assert_eq!(game.hint(), None);
    }

    #[test]
    fn test_config_validation() {
        assert!(GameConfig::default().validate().is_ok());
        assert_eq!(
            GameConfig {
                rows: 0,
                cols: 8,
                seed: None
            }
            .validate(),
            Err(ConfigError::ZeroDimension { rows: 0, cols: 8 })
        );
    }
}
