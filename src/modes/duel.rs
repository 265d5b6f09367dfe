use anyhow::{Context, Result, bail};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::game::{Game, GameConfig, Outcome};
use crate::input::{InputHandler, KeyAction};
use crate::render::Renderer;

type Term = Terminal<CrosstermBackend<Stderr>>;

/// One round between two players sharing a keyboard
pub struct DuelMode {
    game: Game,
    renderer: Renderer,
    tick_interval: Duration,
    end_frames: u32,
    end_frame_interval: Duration,
}

impl DuelMode {
    pub fn new(config: GameConfig) -> Self {
        let tick_interval = Duration::from_millis(config.tick_millis);
        let end_frames = config.end_animation_frames;
        let end_frame_interval = Duration::from_millis(config.end_animation_millis);

        Self {
            game: Game::new(config),
            renderer: Renderer::new(),
            tick_interval,
            end_frames,
            end_frame_interval,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Play the round. Returns the outcome, or `None` if the players quit
    /// before either snake died.
    pub async fn run(&mut self) -> Result<Option<Outcome>> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut terminal = undo_on_error(enter_terminal, || {
            if let Err(err) = execute!(stderr(), LeaveAlternateScreen) {
                error!(?err, "failed to leave alternate screen");
            }
            if let Err(err) = disable_raw_mode() {
                error!(?err, "failed to disable raw mode");
            }
        })?;

        let (key_tx, mut key_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        let input_task = tokio::spawn(poll_input(key_tx, stop_rx));

        info!(
            tick_ms = self.tick_interval.as_millis() as u64,
            "round started"
        );

        let mut result = self.run_game_loop(&mut terminal, &mut key_rx).await;
        if let Ok(true) = result {
            result = self.play_end_animation(&mut terminal).await.map(|()| true);
        }

        // Stop the input task and wait for it
        let _ = stop_tx.send(true);
        match input_task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(?err, "input task failed"),
            Err(err) => error!(?err, "input task panicked"),
        }

        self.cleanup_terminal(&mut terminal);

        result.map(|_| self.game.outcome())
    }

    /// Returns true when the round ended with a death, false on quit.
    async fn run_game_loop(
        &mut self,
        terminal: &mut Term,
        keys: &mut mpsc::UnboundedReceiver<KeyAction>,
    ) -> Result<bool> {
        let mut tick_timer = interval(self.tick_interval);

        terminal
            .draw(|frame| self.renderer.render(frame, &self.game, true))
            .context("Failed to draw frame")?;

        loop {
            tokio::select! {
                _ = tick_timer.tick() => {
                    if self.apply_pending_keys(keys)? {
                        info!(ticks = self.game.ticks(), "players quit");
                        return Ok(false);
                    }

                    self.game.advance()?;

                    terminal
                        .draw(|frame| self.renderer.render(frame, &self.game, true))
                        .context("Failed to draw frame")?;

                    if self.game.is_over() {
                        return Ok(true);
                    }
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    return Ok(false);
                }
            }
        }
    }

    /// Feed every key that arrived since the last tick to the game, in order.
    /// Returns true if a quit was requested. Fails once the input task is
    /// gone, since nobody could steer any more.
    fn apply_pending_keys(
        &mut self,
        keys: &mut mpsc::UnboundedReceiver<KeyAction>,
    ) -> Result<bool> {
        let mut quit = false;

        loop {
            match keys.try_recv() {
                Ok(KeyAction::Steer(player, direction)) => {
                    let accepted = self.game.on_key_press(player, direction);
                    debug!(%player, ?direction, accepted, "steer");
                }
                Ok(KeyAction::Quit) => quit = true,
                Ok(KeyAction::None) => {}
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) if quit => break,
                Err(TryRecvError::Disconnected) => bail!("input task stopped mid-round"),
            }
        }

        Ok(quit)
    }

    /// Blink the dead snakes, then leave them on screen
    async fn play_end_animation(&mut self, terminal: &mut Term) -> Result<()> {
        let mut frame_timer = interval(self.end_frame_interval);

        for i in 0..self.end_frames {
            frame_timer.tick().await;
            let show_dead = i % 2 == 1;
            terminal
                .draw(|frame| self.renderer.render(frame, &self.game, show_dead))
                .context("Failed to draw frame")?;
        }

        frame_timer.tick().await;
        terminal
            .draw(|frame| self.renderer.render(frame, &self.game, true))
            .context("Failed to draw frame")?;

        Ok(())
    }

    fn cleanup_terminal(&mut self, terminal: &mut Term) {
        if let Err(err) = disable_raw_mode() {
            error!(?err, "failed to disable raw mode");
        }
        if let Err(err) = execute!(terminal.backend_mut(), LeaveAlternateScreen) {
            error!(?err, "failed to leave alternate screen");
        }
        if let Err(err) = terminal.show_cursor() {
            error!(?err, "failed to show cursor");
        }
    }
}

fn enter_terminal() -> Result<Term> {
    let mut stderr = stderr();
    execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stderr);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
    terminal.hide_cursor().context("Failed to hide cursor")?;
    terminal.clear().context("Failed to clear terminal")?;
    Ok(terminal)
}

/// Run `step`, calling `undo` if it fails
fn undo_on_error<T>(step: impl FnOnce() -> Result<T>, undo: impl FnOnce()) -> Result<T> {
    let result = step();
    if result.is_err() {
        undo();
    }
    result
}

/// Read key presses until told to stop, forwarding anything meaningful
async fn poll_input(
    keys: mpsc::UnboundedSender<KeyAction>,
    mut stop: watch::Receiver<bool>,
) -> Result<()> {
    let handler = InputHandler::new();
    let mut event_stream = EventStream::new();

    loop {
        tokio::select! {
            _ = stop.changed() => break,

            maybe_event = event_stream.next() => match maybe_event {
                // Only process key press events, not release
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    let action = handler.handle_key_event(key);
                    if action != KeyAction::None && keys.send(action).is_err() {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).context("Failed to read terminal event"),
                None => break,
            }
        }
    }

    Ok(())
}
