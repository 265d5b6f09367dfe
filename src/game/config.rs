use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use super::state::Position;

/// Largest playfield side accepted by [`GameConfig::validate`]
pub const MAX_GRID_SIZE: usize = 4096;

/// Configuration for a round
///
/// Loaded from JSON with [`GameConfig::from_file`]. Any field left out of the
/// file keeps its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Columns in the playfield
    pub grid_width: usize,
    /// Rows in the playfield
    pub grid_height: usize,
    /// Length each snake unrolls to after spawning
    pub initial_snake_length: usize,
    /// Apples land on rows and columns in `0..=apple_max`
    pub apple_max: i32,
    /// Spawn cell of player A
    pub spawn_a: Position,
    /// Spawn cell of player B
    pub spawn_b: Position,
    /// Milliseconds between ticks
    pub tick_millis: u64,
    /// Blinks shown once the round is over
    pub end_animation_frames: u32,
    /// Milliseconds per blink
    pub end_animation_millis: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 40,
            grid_height: 22,
            initial_snake_length: 5,
            apple_max: 20,
            spawn_a: Position::new(0, 0),
            spawn_b: Position::new(10, 0),
            tick_millis: 100,
            end_animation_frames: 6,
            end_animation_millis: 150,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            ..Default::default()
        }
    }

    /// Read a JSON config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: GameConfig = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.grid_width >= 3 && self.grid_height >= 3,
            "playfield must be at least 3x3, got {}x{}",
            self.grid_width,
            self.grid_height
        );
        ensure!(
            self.grid_width <= MAX_GRID_SIZE && self.grid_height <= MAX_GRID_SIZE,
            "playfield must be at most {MAX_GRID_SIZE}x{MAX_GRID_SIZE}, got {}x{}",
            self.grid_width,
            self.grid_height
        );
        ensure!(
            self.initial_snake_length >= 1,
            "initial snake length must be at least 1"
        );
        ensure!(self.apple_max >= 0, "apple_max must not be negative");
        ensure!(self.tick_millis > 0, "tick interval must be positive");
        ensure!(
            self.spawn_a.is_valid() && self.spawn_b.is_valid(),
            "spawn cells must have non-negative coordinates"
        );
        if !self.apples_fit() {
            warn!(
                apple_max = self.apple_max,
                width = self.grid_width,
                height = self.grid_height,
                "apples can spawn outside the playfield"
            );
        }
        Ok(())
    }

    /// True when every apple cell in `0..=apple_max` lies on the playfield
    pub fn apples_fit(&self) -> bool {
        let max = self.apple_max as usize;
        max < self.grid_width && max < self.grid_height
    }
}
