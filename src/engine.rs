//! Resolution engine: the per-tick state machine that takes one swap at a time through
//! slide → match → fade → score → gravity → refill until the board is at rest again.

use crate::board::{Board, BoardError, Cell};
use crate::scoring::{self, GameState, ScoreResult};
use rand::Rng;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the first click.
    Idle,
    /// One gem picked; the next adjacent click swaps.
    AwaitingSecond { origin: Cell },
    /// Swap applied, gems sliding; scored once the board stops moving.
    Swapped { a: Cell, b: Cell },
    /// Fading, falling and refilling. `pass` counts scoring passes of this swap.
    Settling { pass: u32 },
}

/// What a click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The cell is now the pending origin.
    Origin(Cell),
    /// The pending origin and this cell were swapped.
    Swapped(Cell, Cell),
    /// Board busy; click counted but not used.
    Ignored,
}

/// Summary of one tick, for effects and status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub moving: bool,
    pub scored: Option<ScoreResult>,
    pub level_up: bool,
    pub refilled: usize,
    /// The swap's resolution finished this tick.
    pub settled: bool,
}

#[derive(Debug, Clone)]
pub struct Engine {
    phase: Phase,
    /// Whether the board was animating or fading on the last tick.
    moving: bool,
    /// Score cascades after the first pass of a swap.
    cascade_scoring: bool,
    ignored_clicks: u32,
}

impl Engine {
    pub fn new(cascade_scoring: bool) -> Self {
        Self {
            phase: Phase::Idle,
            // unknown until the first tick has looked at the board
            moving: true,
            cascade_scoring,
            ignored_clicks: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn ignored_clicks(&self) -> u32 {
        self.ignored_clicks
    }

    pub fn pending_origin(&self) -> Option<Cell> {
        match self.phase {
            Phase::AwaitingSecond { origin } => Some(origin),
            _ => None,
        }
    }

    /// Clicks are only taken while no swap is in flight and the board is still.
    pub fn accepts_input(&self) -> bool {
        !self.moving && matches!(self.phase, Phase::Idle | Phase::AwaitingSecond { .. })
    }

    /// Drop any pending selection, e.g. after the board was replaced by a load.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.moving = true;
    }

    /// Feed one pointer click. The second click swaps if adjacent to the first, otherwise
    /// it becomes the new origin.
    pub fn click(&mut self, cell: Cell, board: &mut Board, state: &mut GameState) -> ClickOutcome {
        if self.moving {
            return self.ignore(cell);
        }
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::AwaitingSecond { origin: cell };
                ClickOutcome::Origin(cell)
            }
            Phase::AwaitingSecond { origin } => match board.swap_cells(origin, cell) {
                Ok(()) => {
                    state.moves = state.moves.saturating_add(1);
                    self.phase = Phase::Swapped { a: origin, b: cell };
                    self.moving = true;
                    info!(from = %origin, to = %cell, moves = state.moves, "swap");
                    ClickOutcome::Swapped(origin, cell)
                }
                Err(BoardError::NotAdjacent { .. }) => {
                    self.phase = Phase::AwaitingSecond { origin: cell };
                    ClickOutcome::Origin(cell)
                }
            },
            Phase::Swapped { .. } | Phase::Settling { .. } => self.ignore(cell),
        }
    }

    fn ignore(&mut self, cell: Cell) -> ClickOutcome {
        self.ignored_clicks = self.ignored_clicks.saturating_add(1);
        debug!(%cell, phase = ?self.phase, "click ignored while resolving");
        ClickOutcome::Ignored
    }

    /// Advance the board by one frame.
    pub fn tick<R: Rng>(&mut self, board: &mut Board, state: &mut GameState, rng: &mut R) -> TickReport {
        let mut report = TickReport::default();

        board.detect_matches();
        let mut moving = board.advance_animation();
        if !moving {
            moving = board.advance_fade();
        }

        if !moving {
            match self.phase {
                Phase::Swapped { a, b } => {
                    debug!(%a, %b, "swap landed");
                    score_pass(board, state, &mut report, 1);
                    self.phase = Phase::Settling { pass: 1 };
                }
                Phase::Settling { pass } if board.has_matches() => {
                    if self.cascade_scoring {
                        score_pass(board, state, &mut report, pass + 1);
                    }
                    self.phase = Phase::Settling { pass: pass + 1 };
                }
                _ => {}
            }

            if board.has_matches() {
                debug!(matched = board.matched_count(), "compacting");
                report.refilled = board.compact_and_refill(rng);
                moving = true;
            } else if let Phase::Settling { pass } = self.phase {
                debug_assert!(board.is_at_rest());
                debug!(passes = pass, score = state.score, "board settled");
                self.phase = Phase::Idle;
                report.settled = true;
            }
        }

        self.moving = moving;
        report.moving = moving;
        report
    }
}

fn score_pass(board: &mut Board, state: &mut GameState, report: &mut TickReport, pass: u32) {
    let result = scoring::compute_score_delta(board);
    report.level_up = state.apply(&result);
    info!(
        pass,
        points = result.points,
        runs = result.runs.len(),
        score = state.score,
        "scored"
    );
    if report.level_up {
        info!(level = state.level, "level up");
    }
    report.scored = Some(result);
}
