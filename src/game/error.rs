use thiserror::Error;

/// Misuse of the game core. These are never recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("snake is dead and can no longer move or grow")]
    DeadSnake,
    #[error("game is already over")]
    GameOver,
}
