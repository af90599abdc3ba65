//! App: terminal init, main loop, tick and key/mouse handling.

use crate::GameConfig;
use crate::engine::{ClickOutcome, TickReport};
use crate::input::{Action, BoardGeometry, key_to_action};
use crate::session::{GameSession, LoadOutcome};
use crate::theme::Theme;
use crate::ui::{self, Effects};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Ticks run back to back after a stall before the loop drops the backlog.
const MAX_CATCH_UP_TICKS: u32 = 8;

pub struct App {
    config: GameConfig,
    theme: Theme,
    session: GameSession,
    paused: bool,
    /// Last save/load message for the sidebar.
    status: Option<String>,
    /// Board position from the last draw; None until drawn or while the terminal is too small.
    geometry: Option<BoardGeometry>,
    effects: Effects,
    last_tick: Instant,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let mut session = GameSession::new(config.seed, config.cascade_scoring);
        let mut status = None;
        if config.load_on_start {
            status = Some(load_status(&mut session, &config));
        }
        Self {
            effects: Effects::new(config.effects),
            config,
            theme,
            session,
            paused: false,
            status,
            geometry: None,
            last_tick: Instant::now(),
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
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        info!(
            tick_rate = self.config.tick_rate,
            frame_rate = self.config.frame_rate,
            "terminal ready"
        );

        let result = self.run_loop(&mut terminal);

        // Restore every step before reporting the first failure.
        let mouse = execute!(std::io::stdout(), DisableMouseCapture);
        let screen = execute!(std::io::stdout(), LeaveAlternateScreen);
        let raw = disable_raw_mode();

        result?;
        mouse?;
        screen?;
        raw?;
        Ok(())
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let tick_interval = Duration::from_secs_f64(1.0 / self.config.tick_rate.max(1.0));
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate.max(1.0));
        self.last_tick = Instant::now();

        loop {
            let frame_start = Instant::now();
            terminal.draw(|f| {
                self.geometry = ui::draw(
                    f,
                    &self.session,
                    &self.theme,
                    self.paused,
                    self.status.as_deref(),
                    &mut self.effects,
                    frame_start,
                );
            })?;

            let timeout = frame_duration
                .saturating_sub(frame_start.elapsed())
                .min(tick_interval.saturating_sub(self.last_tick.elapsed()));
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let quit = match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            self.apply_action(key_to_action(key))
                        }
                        Event::Mouse(mouse) => {
                            self.handle_mouse(mouse);
                            false
                        }
                        _ => false,
                    };
                    if quit {
                        info!(score = self.session.state().score, "quit");
                        return Ok(());
                    }
                }
            }

            if self.paused {
                self.last_tick = Instant::now();
                continue;
            }
            let mut ticks = 0;
            while self.last_tick.elapsed() >= tick_interval {
                if ticks == MAX_CATCH_UP_TICKS {
                    self.last_tick = Instant::now();
                    break;
                }
                self.last_tick += tick_interval;
                let report = self.session.tick();
                self.on_tick(&report);
                ticks += 1;
            }
        }
    }

    /// Returns true when the app should exit.
    fn apply_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::Pause => self.paused = !self.paused,
            _ if self.paused => {}
            Action::Cursor(direction) => self.session.move_cursor(direction),
            Action::Select => {
                let outcome = self.session.select_at_cursor();
                self.on_click(outcome);
            }
            Action::Save => {
                self.status = Some(match self.session.save(&self.config.save_path) {
                    Ok(()) => format!("Saved to {}", self.config.save_path.display()),
                    Err(e) => {
                        warn!(error = %e, "save failed");
                        format!("Save failed: {e}")
                    }
                });
            }
            Action::Load => self.status = Some(load_status(&mut self.session, &self.config)),
            Action::None => {}
        }
        false
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.paused || mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let Some(cell) = self
            .geometry
            .and_then(|g| g.cell_at(mouse.column, mouse.row))
        else {
            return;
        };
        let outcome = self.session.click(cell);
        self.on_click(outcome);
    }

    fn on_click(&mut self, outcome: ClickOutcome) {
        debug!(?outcome, "click");
        if let ClickOutcome::Swapped(..) = outcome {
            self.status = None;
        }
    }

    fn on_tick(&mut self, report: &TickReport) {
        if report.refilled > 0 {
            debug!(refilled = report.refilled, "refill");
        }
        if report.settled {
            debug!(score = self.session.state().score, "ready for input");
        }
        if report.scored.as_ref().is_some_and(|s| s.points > 0) {
            self.effects.score_pulse(&self.theme);
        }
        if report.level_up {
            self.effects.level_flash(&self.theme);
            self.status = Some(format!("Level {}!", self.session.state().level));
        }
    }
}

/// Load the save file into the session and describe the result for the status line.
fn load_status(session: &mut GameSession, config: &GameConfig) -> String {
    match session.load(&config.save_path) {
        Ok(LoadOutcome::Loaded) => format!("Loaded {}", config.save_path.display()),
        Ok(LoadOutcome::Missing) => "No save file yet".to_string(),
        Err(e) => format!("Load failed: {e}"),
    }
}
