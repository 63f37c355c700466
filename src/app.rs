//! App: terminal init, main loop, mouse and key handling.

use crate::GameConfig;
use crate::game::{GameState, PlaceOutcome, Turn};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, Geometry};
use anyhow::Result;
use crossterm::event::{
    self, Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, info};

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    /// Layout of the last drawn frame; mouse events are hit-tested against it.
    geometry: Geometry,
    frame_rate: f64,
    /// TachyonFX fade for the latest clear (created on first draw after the clear).
    clear_effect: Option<Effect>,
    /// Last time the clear effect was processed (for delta).
    clear_effect_time: Option<Instant>,
    quit: bool,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, frame_rate: f64) -> Self {
        let state = GameState::new(&config);
        let geometry = Geometry::compute(Rect::new(0, 0, 80, 24), config.compact);
        Self {
            config,
            theme,
            state,
            geometry,
            frame_rate,
            clear_effect: None,
            clear_effect_time: None,
            quit: false,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        let result = execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .and_then(|()| {
                ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))
            })
            .map_err(anyhow::Error::from)
            .and_then(|mut terminal| self.run_loop(&mut terminal));

        // Restore
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        info!(score = self.state.score, "exit");
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.frame_rate.max(1.0));
        while !self.quit {
            let now = Instant::now();
            terminal.draw(|f| {
                let geometry = Geometry::compute(f.area(), self.config.compact);
                self.geometry = geometry;
                ui::draw(
                    f,
                    &self.state,
                    &self.theme,
                    &geometry,
                    &mut self.clear_effect,
                    &mut self.clear_effect_time,
                    now,
                    self.config.animation,
                );
            })?;

            if self.clear_effect.as_ref().is_some_and(|e| e.done()) {
                self.state.flash.clear();
                self.clear_effect = None;
                self.clear_effect_time = None;
            }

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                        Event::Mouse(mouse) => self.handle_mouse(mouse),
                        _ => {}
                    }
                    if self.quit {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let action = key_to_action(key);
        match action {
            Action::Quit => self.quit = true,
            Action::Reset => self.reset(),
            _ if self.state.game_over => {}
            Action::RotateLeft => {
                self.state.rotate_selected(Turn::Left);
            }
            Action::RotateRight => {
                self.state.rotate_selected(Turn::Right);
            }
            Action::Select(slot) => {
                if self.state.select(slot) {
                    self.state.keyboard_active = true;
                }
            }
            Action::SelectNext => {
                if self.state.select_next() {
                    self.state.keyboard_active = true;
                }
            }
            Action::CursorUp => self.state.move_cursor(-1, 0),
            Action::CursorDown => self.state.move_cursor(1, 0),
            Action::CursorLeft => self.state.move_cursor(0, -1),
            Action::CursorRight => self.state.move_cursor(0, 1),
            Action::Place => {
                if let Some(outcome) = self.state.place_selected_at_cursor() {
                    self.after_place(&outcome);
                }
            }
            Action::None => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let MouseEvent {
            kind, column, row, ..
        } = mouse;
        let pointer = ui::pointer_position(column, row);
        let grid = self.geometry.snap_grid();
        match kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.geometry.is_reset(column, row) {
                    self.reset();
                } else if let Some(slot) = self.geometry.slot_at(column, row) {
                    self.state.begin_drag(slot, pointer, &grid);
                }
            }
            MouseEventKind::Down(MouseButton::Right) => self.state.cancel_drag(),
            MouseEventKind::Drag(MouseButton::Left) => self.state.drag_to(pointer, &grid),
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(outcome) = self.state.end_drag() {
                    self.after_place(&outcome);
                }
            }
            _ => {}
        }
    }

    /// A new clear restarts the fade; without animation the flash is dropped at once.
    fn after_place(&mut self, outcome: &PlaceOutcome) {
        debug!(
            cells = outcome.cells_placed,
            lines = outcome.cleared.count(),
            points = outcome.points,
            refilled = outcome.refilled,
            game_over = outcome.game_over,
            "turn done"
        );
        if !outcome.cleared.is_empty() {
            self.clear_effect = None;
            self.clear_effect_time = None;
            if !self.config.animation {
                self.state.flash.clear();
            }
        }
    }

    fn reset(&mut self) {
        self.state.reset();
        self.clear_effect = None;
        self.clear_effect_time = None;
    }
}
