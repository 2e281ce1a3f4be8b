//! Tiles module - where new tile colors come from
//!
//! Board generation and gravity refill both draw colors through [`TileSource`].
//! Live games use [`RandomTiles`] (uniform draws from a seedable RNG); replays
//! and fixtures can use [`CyclingTiles`] to make every draw predictable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::Color;

/// Supplier of tile colors.
pub trait TileSource {
    /// Pick one color from a non-empty candidate list.
    fn pick(&mut self, candidates: &[Color]) -> Color;
}

/// Uniform random draws backed by `StdRng`
#[derive(Debug, Clone)]
pub struct RandomTiles {
    rng: StdRng,
    seed: Option<u64>,
}

impl RandomTiles {
    /// Reproducible source: the same seed yields the same boards and refills
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Source seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            seed: None,
        }
    }

    /// The seed this source was created with, if any
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl Default for RandomTiles {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl TileSource for RandomTiles {
    fn pick(&mut self, candidates: &[Color]) -> Color {
        candidates[self.rng.random_range(0..candidates.len())]
    }
}

/// Deterministic source that walks the candidate list round-robin.
///
/// Draw `n` returns `candidates[n % candidates.len()]`.
#[derive(Debug, Clone, Default)]
pub struct CyclingTiles {
    draws: usize,
}

impl CyclingTiles {
    pub fn new() -> Self {
        Self { draws: 0 }
    }

    /// Number of colors handed out so far
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl TileSource for CyclingTiles {
    fn pick(&mut self, candidates: &[Color]) -> Color {
        let color = candidates[self.draws % candidates.len()];
        self.draws += 1;
        color
    }
}
