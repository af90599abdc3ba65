//! Scoring: row/column run scan, points per run, level advancement.

use crate::board::{BOARD_SIZE, Board, Cell};

/// Cumulative score at which level 1 advances to level 2.
pub const LEVEL_TWO_SCORE: u32 = 100;

/// Score, moves and level for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub score: u32,
    pub moves: u32,
    pub level: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            score: 0,
            moves: 0,
            level: 1,
        }
    }
}

impl GameState {
    /// Add a scoring pass. Returns true if this pushed the level from 1 to 2.
    pub fn apply(&mut self, result: &ScoreResult) -> bool {
        self.score = self.score.saturating_add(result.points);
        self.advance_level()
    }

    /// One-shot: level 1 becomes 2 once the score reaches `LEVEL_TWO_SCORE`.
    pub fn advance_level(&mut self) -> bool {
        if self.level == 1 && self.score >= LEVEL_TWO_SCORE {
            self.level = 2;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// A maximal line of same-kind gems, at least 3 long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub axis: Axis,
    pub start: Cell,
    pub len: u8,
}

impl Run {
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.len).map(|i| match self.axis {
            Axis::Horizontal => Cell::new(self.start.row, self.start.col + i),
            Axis::Vertical => Cell::new(self.start.row + i, self.start.col),
        })
    }

    pub fn points(&self) -> u32 {
        points_for_run(self.len)
    }
}

/// Points for one run: 10 / 20 / 30, flat from length 5 up.
pub fn points_for_run(len: u8) -> u32 {
    match len {
        0..=2 => 0,
        3 => 10,
        4 => 20,
        _ => 30,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreResult {
    pub points: u32,
    pub runs: Vec<Run>,
}

/// All scoring runs: rows first (top to bottom), then columns (left to right).
pub fn find_runs(board: &Board) -> Vec<Run> {
    let mut runs = Vec::new();
    for row in 1..=BOARD_SIZE {
        let line: [Cell; BOARD_SIZE as usize] = std::array::from_fn(|i| Cell::new(row, i as u8 + 1));
        scan_line(board, &line, Axis::Horizontal, &mut runs);
    }
    for col in 1..=BOARD_SIZE {
        let line: [Cell; BOARD_SIZE as usize] = std::array::from_fn(|i| Cell::new(i as u8 + 1, col));
        scan_line(board, &line, Axis::Vertical, &mut runs);
    }
    runs
}

fn scan_line(board: &Board, line: &[Cell], axis: Axis, runs: &mut Vec<Run>) {
    let mut i = 0;
    while i < line.len() {
        let kind = board.kind(line[i]);
        let len = line[i..].iter().take_while(|&&c| board.kind(c) == kind).count();
        if len >= 3 {
            runs.push(Run {
                axis,
                start: line[i],
                len: len as u8,
            });
        }
        i += len;
    }
}

/// Score every run on the board and flag its cells as matched. Points are per run, so a
/// cell shared by a row run and a column run contributes to both awards.
pub fn compute_score_delta(board: &mut Board) -> ScoreResult {
    let runs = find_runs(board);
    for run in &runs {
        for cell in run.cells() {
            board.mark_matched(cell);
        }
    }
    ScoreResult {
        points: runs.iter().map(Run::points).sum(),
        runs,
    }
}
