//! Shared access to the single live game.
//!
//! Every operation takes the lock once for its whole read, mutate and
//! snapshot sequence, so a move result and the state it reports always belong
//! together and concurrent clients see moves applied one at a time.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::core::{Game, GameConfig, GameSnapshot, MoveOutcome};
use crate::types::Position;

#[derive(Debug, Clone)]
pub struct GameHandle {
    inner: Arc<Mutex<Game>>,
}

impl GameHandle {
    pub fn new(game: Game) -> Self {
        Self {
            inner: Arc::new(Mutex::new(game)),
        }
    }

    pub fn from_config(config: GameConfig) -> Self {
        Self::new(Game::new(config))
    }

    pub async fn new_game(&self) -> GameSnapshot {
        self.inner.lock().await.new_game()
    }

    /// Resolve a move and capture the resulting state under the same lock
    pub async fn make_move(&self, from: Position, to: Position) -> (MoveOutcome, GameSnapshot) {
        let mut game = self.inner.lock().await;
        let outcome = game.make_move(from, to);
        (outcome, game.snapshot())
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        self.inner.lock().await.snapshot()
    }

    pub async fn hint(&self) -> Option<(Position, Position)> {
        self.inner.lock().await.hint()
    }

    /// (rows, cols) of the live board
    pub async fn dimensions(&self) -> (usize, usize) {
        let game = self.inner.lock().await;
        (game.board().rows(), game.board().cols())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> GameHandle {
        GameHandle::from_config(GameConfig {
            seed: Some(99),
            ..GameConfig::default()
        })
    }

    #[tokio::test]
    async fn test_move_and_snapshot_agree() {
        let handle = seeded();
        let Some((from, to)) = handle.hint().await else {
            return;
        };

        let (outcome, snap) = handle.make_move(from, to).await;
        assert!(outcome.success);
        assert_eq!(snap.moves, 1);
        assert_eq!(snap, handle.snapshot().await);
    }

    #[tokio::test]
    async fn test_clones_share_one_game() {
        let a = seeded();
        let b = a.clone();

        let snap = a.new_game().await;
        assert_eq!(b.snapshot().await, snap);
        assert_eq!(b.dimensions().await, (8, 8));
    }
}
