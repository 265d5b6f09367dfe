use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::game::{Direction, Player};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Steer(Player, Direction),
    Quit,
    None,
}

/// Maps raw key events to the two control schemes.
///
/// Player A steers with WASD, player B with the arrow keys.
pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_key_event(&self, key: KeyEvent) -> KeyAction {
        // Handle Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        match key.code {
            // Player B - Arrow keys
            KeyCode::Up => KeyAction::Steer(Player::B, Direction::Up),
            KeyCode::Down => KeyAction::Steer(Player::B, Direction::Down),
            KeyCode::Left => KeyAction::Steer(Player::B, Direction::Left),
            KeyCode::Right => KeyAction::Steer(Player::B, Direction::Right),

            // Player A - WASD
            KeyCode::Char('w') | KeyCode::Char('W') => KeyAction::Steer(Player::A, Direction::Up),
            KeyCode::Char('s') | KeyCode::Char('S') => {
                KeyAction::Steer(Player::A, Direction::Down)
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                KeyAction::Steer(Player::A, Direction::Left)
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                KeyAction::Steer(Player::A, Direction::Right)
            }

            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,

            _ => KeyAction::None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
