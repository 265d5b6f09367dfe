//! Core game logic for a two-player round
//!
//! Nothing in here touches the terminal. The driver feeds key presses in,
//! calls [`Game::advance`] on a clock and reads snakes and apple back out to draw.

pub mod action;
pub mod config;
pub mod engine;
pub mod error;
pub mod state;

// Re-export commonly used types
pub use action::{Direction, Player};
pub use config::GameConfig;
pub use engine::{Game, Outcome, TickReport};
pub use error::GameError;
pub use state::{Apple, CollisionType, MoveOutcome, Position, Renderable, Snake};
