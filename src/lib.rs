//! Duel Snake - two players, one keyboard, one apple
//!
//! This library provides:
//! - Core game logic (game module)
//! - Key mapping for both control schemes (input module)
//! - TUI rendering (render module)
//! - The terminal driver that runs a round (modes module)

pub mod game;
pub mod input;
pub mod modes;
pub mod render;
