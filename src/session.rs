//! One running game: board, score state, resolution engine, cursor and RNG in a single owner.

use crate::board::{Board, Cell};
use crate::engine::{ClickOutcome, Engine, TickReport};
use crate::input::{Cursor, Direction};
use crate::save::{self, SaveError};
use crate::scoring::GameState;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use tracing::{info, warn};

/// Result of a load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// No save file yet; the session is unchanged.
    Missing,
}

pub struct GameSession {
    board: Board,
    state: GameState,
    engine: Engine,
    cursor: Cursor,
    rng: StdRng,
}

impl GameSession {
    /// Fresh game on a random board. A fixed seed makes boards and refills reproducible.
    pub fn new(seed: Option<u64>, cascade_scoring: bool) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let board = Board::random(&mut rng);
        Self::with_board(board, rng, cascade_scoring)
    }

    fn with_board(board: Board, rng: StdRng, cascade_scoring: bool) -> Self {
        Self {
            board,
            state: GameState::default(),
            engine: Engine::new(cascade_scoring),
            cursor: Cursor::default(),
            rng,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn tick(&mut self) -> TickReport {
        self.engine.tick(&mut self.board, &mut self.state, &mut self.rng)
    }

    pub fn click(&mut self, cell: Cell) -> ClickOutcome {
        self.engine.click(cell, &mut self.board, &mut self.state)
    }

    /// Click the cell under the keyboard cursor.
    pub fn select_at_cursor(&mut self) -> ClickOutcome {
        self.click(self.cursor.cell())
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        self.cursor.step(direction);
    }

    /// Write score and board kinds. Mid-resolution boards are saved as they are.
    pub fn save(&self, path: &Path) -> Result<(), SaveError> {
        save::save(path, &self.state, &self.board)?;
        info!(path = %path.display(), score = self.state.score, "saved");
        Ok(())
    }

    /// Replace state and board from a save file. On any error the session is left untouched.
    pub fn load(&mut self, path: &Path) -> Result<LoadOutcome, SaveError> {
        match save::load(path) {
            Ok(Some((state, board))) => {
                self.restore(state, board);
                info!(path = %path.display(), score = state.score, level = state.level, "loaded");
                Ok(LoadOutcome::Loaded)
            }
            Ok(None) => {
                info!(path = %path.display(), "no save file");
                Ok(LoadOutcome::Missing)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "load failed");
                Err(e)
            }
        }
    }

    /// Runs already present in a restored board resolve without scoring.
    fn restore(&mut self, state: GameState, board: Board) {
        self.state = state;
        self.board = board;
        self.engine.reset();
    }
}
