use rand::Rng;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::game::{Game, Outcome, Player, Position, Renderable, Snake};

/// Glyphs for one player's snake
struct SnakeGlyphs {
    head: &'static str,
    body: &'static str,
    color: Color,
}

const GLYPHS_A: SnakeGlyphs = SnakeGlyphs {
    head: "@ ",
    body: "o ",
    color: Color::Green,
};

const GLYPHS_B: SnakeGlyphs = SnakeGlyphs {
    head: "# ",
    body: "+ ",
    color: Color::Magenta,
};

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Draw one frame. With `show_dead` off, dead snakes are left out so the
    /// end-of-round animation can blink them.
    pub fn render<R: Rng>(&self, frame: &mut Frame, game: &Game<R>, show_dead: bool) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        let status = self.render_status(game);
        frame.render_widget(status, chunks[0]);

        let grid = self.render_grid(chunks[1], game, show_dead);
        frame.render_widget(grid, chunks[1]);

        let controls = self.render_controls();
        frame.render_widget(controls, chunks[2]);
    }

    fn render_grid<R: Rng>(&self, _area: Rect, game: &Game<R>, show_dead: bool) -> Paragraph<'_> {
        let width = game.config().grid_width;
        let height = game.config().grid_height;
        let mut cells: Vec<Option<Span<'static>>> = vec![None; width * height];

        let mut paint = |pos: Position, span: Span<'static>| {
            if pos.is_valid() && (pos.row as usize) < height && (pos.col as usize) < width {
                cells[pos.row as usize * width + pos.col as usize] = Some(span);
            }
        };

        for (player, glyphs) in [(Player::A, &GLYPHS_A), (Player::B, &GLYPHS_B)] {
            let snake = game.snake(player);
            if snake.is_dead() && !show_dead {
                continue;
            }
            for (pos, span) in snake_spans(snake, glyphs) {
                paint(pos, span);
            }
        }

        for pos in game.apple().positions() {
            paint(
                pos,
                Span::styled(
                    "O ",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
            );
        }

        let lines: Vec<Line> = cells
            .chunks(width)
            .map(|row| {
                let spans: Vec<Span> = row
                    .iter()
                    .map(|cell| {
                        cell.clone().unwrap_or_else(|| {
                            Span::styled(". ", Style::default().fg(Color::DarkGray))
                        })
                    })
                    .collect();
                Line::from(spans)
            })
            .collect();

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(Color::White))
                    .title(" Duel Snake "),
            )
            .alignment(Alignment::Center)
    }

    fn render_status<R: Rng>(&self, game: &Game<R>) -> Paragraph<'_> {
        let line = match game.outcome() {
            None => Line::from(vec![
                player_status(game, Player::A, &GLYPHS_A),
                Span::raw("    "),
                player_status(game, Player::B, &GLYPHS_B),
            ]),
            Some(Outcome::Winner(player)) => Line::from(vec![
                Span::styled(
                    "GAME OVER  ",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{player} wins"),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Some(Outcome::Draw) => Line::from(vec![
                Span::styled(
                    "GAME OVER  ",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled("Draw", Style::default().fg(Color::White)),
            ]),
        };

        Paragraph::new(vec![line]).alignment(Alignment::Center)
    }

    fn render_controls(&self) -> Paragraph<'_> {
        let text = vec![Line::from(vec![
            Span::styled("WASD", Style::default().fg(GLYPHS_A.color)),
            Span::raw(" player 1 | "),
            Span::styled("↑↓←→", Style::default().fg(GLYPHS_B.color)),
            Span::raw(" player 2 | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" to quit"),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn snake_spans(snake: &Snake, glyphs: &SnakeGlyphs) -> Vec<(Position, Span<'static>)> {
    let color = if snake.is_dead() {
        Color::DarkGray
    } else {
        glyphs.color
    };

    snake
        .positions()
        .into_iter()
        .enumerate()
        .map(|(i, pos)| {
            let span = if i == 0 {
                Span::styled(
                    glyphs.head,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(glyphs.body, Style::default().fg(color))
            };
            (pos, span)
        })
        .collect()
}

fn player_status<R: Rng>(game: &Game<R>, player: Player, glyphs: &SnakeGlyphs) -> Span<'static> {
    let snake = game.snake(player);
    Span::styled(
        format!("{player}: length {}", snake.len()),
        Style::default().fg(glyphs.color),
    )
}
