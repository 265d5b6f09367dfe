use rand::Rng;
use serde::{Deserialize, Serialize};

use super::action::Direction;
use super::error::GameError;

/// A cell on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset_row(&self, n: i32) -> Self {
        Self::new(self.row + n, self.col)
    }

    pub fn offset_col(&self, n: i32) -> Self {
        Self::new(self.row, self.col + n)
    }

    /// Move position one cell in a direction
    pub fn moved_in_direction(&self, direction: Direction) -> Self {
        let (d_row, d_col) = direction.delta();
        self.offset_row(d_row).offset_col(d_col)
    }

    /// Negative coordinates are never on the grid
    pub fn is_valid(&self) -> bool {
        self.row >= 0 && self.col >= 0
    }
}

/// Anything the renderer can draw
pub trait Renderable {
    /// Cells occupied by this entity, head first where that matters
    fn positions(&self) -> Vec<Position>;
}

/// Why a snake died
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionType {
    /// Left the playfield
    Wall,
    /// Ran into its own body
    SelfCollision,
    /// Both heads landed on the same cell
    HeadToHead,
    /// A head landed on a body, its own or the opponent's
    Body,
}

/// What a single call to [`Snake::move_towards`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Head advanced, tail followed
    Moved,
    /// Head advanced, tail stayed put
    Grew,
    /// The move was fatal and the body was left untouched
    Crashed(CollisionType),
}

/// A snake on the grid
///
/// The body starts as a single cell and the rest of the initial length is
/// held as pending growth, so a fresh snake unrolls out of its spawn cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at index 0
    body: Vec<Position>,
    pending_growth: usize,
    dead: bool,
}

impl Snake {
    pub fn new(spawn: Position, initial_length: usize) -> Self {
        Self {
            body: vec![spawn],
            pending_growth: initial_length.saturating_sub(1),
            dead: false,
        }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Every segment, head included
    pub fn body(&self) -> &[Position] {
        &self.body
    }

    /// Get body segments (excluding head)
    pub fn body_segments(&self) -> &[Position] {
        &self.body[1..]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn pending_growth(&self) -> usize {
        self.pending_growth
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Marks the snake dead for good. Calling it again is harmless.
    pub fn kill(&mut self) {
        self.dead = true;
    }

    /// Advance the head one cell.
    ///
    /// The new head is checked against the pre-move body, current tail
    /// included, and against negative coordinates. A fatal move marks the
    /// snake dead and leaves the body as it was.
    pub fn move_towards(&mut self, direction: Direction) -> Result<MoveOutcome, GameError> {
        if self.dead {
            return Err(GameError::DeadSnake);
        }

        let new_head = self.head().moved_in_direction(direction);

        if !new_head.is_valid() {
            self.dead = true;
            return Ok(MoveOutcome::Crashed(CollisionType::Wall));
        }
        if self.body.contains(&new_head) {
            self.dead = true;
            return Ok(MoveOutcome::Crashed(CollisionType::SelfCollision));
        }

        self.body.insert(0, new_head);

        if self.pending_growth > 0 {
            self.pending_growth -= 1;
            Ok(MoveOutcome::Grew)
        } else {
            self.body.pop();
            Ok(MoveOutcome::Moved)
        }
    }

    /// Queue one cell of growth for the next move
    pub fn grow(&mut self) -> Result<(), GameError> {
        if self.dead {
            return Err(GameError::DeadSnake);
        }
        self.pending_growth += 1;
        Ok(())
    }
}

impl Renderable for Snake {
    fn positions(&self) -> Vec<Position> {
        self.body.clone()
    }
}

/// The single apple on the board. Eating it replaces it with a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Apple {
    position: Position,
}

impl Apple {
    pub fn new(position: Position) -> Self {
        Self { position }
    }

    /// Uniform over `0..=max` on both axes. Occupied cells are not avoided.
    pub fn random<R: Rng>(rng: &mut R, max: i32) -> Self {
        let row = rng.gen_range(0..=max);
        let col = rng.gen_range(0..=max);
        Self::new(Position::new(row, col))
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

impl Renderable for Apple {
    fn positions(&self) -> Vec<Position> {
        vec![self.position]
    }
}
