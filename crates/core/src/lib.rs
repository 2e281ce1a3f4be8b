//! Core game logic module - pure, deterministic, and testable
//!
//! This module contains the board simulation: generation, match detection,
//! swap validation, removal, gravity refill and cascade resolution. It has
//! **no dependencies** on networking or I/O, making it:
//!
//! - **Deterministic**: Same seed produces identical boards and refills
//! - **Testable**: Tile sources can be scripted for exact fixtures
//! - **Portable**: Runs behind the TCP adapter, in benchmarks, or headless
//!
//! # Module Structure
//!
//! - [`board`]: rows x cols grid, generation without initial matches, swap
//!   validation, removal and gravity refill
//! - [`matches`]: run detection along rows and columns
//! - [`game_state`]: one live game with score, move count and the cascade loop
//! - [`tiles`]: where new colors come from
//! - [`scoring`]: points per cleared tile
//! - [`snapshot`]: read-only views returned to callers
//!
//! # Game Rules
//!
//! - **Board**: 8x8 by default, six colors, never starts with a match
//! - **Move**: swap two edge-adjacent tiles; legal only if it creates a run of 3+
//! - **Clear**: every tile in a run of 3+ is removed, 10 points each
//! - **Gravity**: tiles fall, fresh random tiles enter from the top
//! - **Cascade**: repeat until no run remains
//!
//! # Example
//!
//! ```
//! use match3_core::{Game, GameConfig};
//!
//! let mut game = Game::new(GameConfig {
//!     seed: Some(12345),
//!     ..GameConfig::default()
//! });
//! assert!(game.board().find_matches().is_empty());
//!
//! if let Some((from, to)) = game.hint() {
//!     let outcome = game.make_move(from, to);
//!     assert!(outcome.success);
//!     assert_eq!(game.moves(), 1);
//!     assert_eq!(game.score(), 10 * outcome.matches.len() as u64);
//! }
//! ```

pub mod board;
pub mod game_state;
pub mod matches;
pub mod scoring;
pub mod snapshot;
pub mod tiles;

pub use match3_types as types;

// Re-export commonly used types for convenience
pub use board::{Board, BoardError, SwapRejection};
pub use game_state::{ConfigError, Game, GameConfig};
pub use matches::{find_matches, MatchSet};
pub use scoring::{score_for_chain, score_for_matches};
pub use snapshot::{state_hash, BoardSnapshot, ChainStep, GameSnapshot, MoveOutcome};
pub use tiles::{CyclingTiles, RandomTiles, TileSource};
