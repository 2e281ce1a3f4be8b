//! Scoring module
//!
//! Every cleared tile is worth a flat [`POINTS_PER_TILE`]; run length, cascade
//! depth and shape carry no bonus.

use crate::snapshot::ChainStep;
use crate::types::POINTS_PER_TILE;

/// Points for clearing `tiles` tiles in one cascade round
pub fn score_for_matches(tiles: usize) -> u64 {
    tiles as u64 * POINTS_PER_TILE
}

/// Points earned by a whole chain of cascade rounds
pub fn score_for_chain(steps: &[ChainStep]) -> u64 {
    steps.iter().map(|s| score_for_matches(s.matches.len())).sum()
}
