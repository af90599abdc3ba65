//! Save file: score, moves, level, then the 64 gem kinds row-major, as whitespace-separated text.
//!
//! ```text
//! 120 14 2
//! 3 0 5 1 6 2 4 0 ...
//! ```

use crate::board::{BOARD_SIZE, Board, Cell, KIND_COUNT};
use crate::scoring::GameState;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const DIR_NAME: &str = "gemtui";
const FILENAME: &str = "save.txt";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("save file ends before {0}")]
    Truncated(String),
    #[error("invalid number {token:?} for {field}")]
    InvalidNumber { field: String, token: String },
    #[error("gem kind {kind} at {cell} is not below {KIND_COUNT}")]
    KindOutOfRange { kind: u32, cell: Cell },
    #[error("level {0} is not 1 or 2")]
    LevelOutOfRange(u32),
}

/// Default save location (config dir / gemtui / save.txt).
pub fn default_save_path() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join(DIR_NAME).join(FILENAME)
}

pub fn encode(state: &GameState, board: &Board) -> String {
    let kinds: Vec<String> = board.kinds().iter().flatten().map(u8::to_string).collect();
    format!(
        "{} {} {}\n{}\n",
        state.score,
        state.moves,
        state.level,
        kinds.join(" ")
    )
}

/// Write the save text for `state` and `board`.
pub fn write_to<W: Write>(mut out: W, state: &GameState, board: &Board) -> io::Result<()> {
    out.write_all(encode(state, board).as_bytes())?;
    out.flush()
}

/// Parse save text. Tokens are read strictly in order; anything after the 64th kind is ignored.
/// Loaded gems start at rest, unmatched and opaque.
pub fn decode(text: &str) -> Result<(GameState, Board), SaveError> {
    let mut tokens = text.split_whitespace();
    let mut next = |field: &str| -> Result<u32, SaveError> {
        let token = tokens
            .next()
            .ok_or_else(|| SaveError::Truncated(field.to_string()))?;
        token.parse::<u32>().map_err(|_| SaveError::InvalidNumber {
            field: field.to_string(),
            token: token.to_string(),
        })
    };

    let state = GameState {
        score: next("score")?,
        moves: next("moves")?,
        level: next("level")?,
    };
    if !(1..=2).contains(&state.level) {
        return Err(SaveError::LevelOutOfRange(state.level));
    }

    let mut kinds = [[0u8; BOARD_SIZE as usize]; BOARD_SIZE as usize];
    for cell in Cell::all() {
        let kind = next(&format!("kind of cell {cell}"))?;
        if kind >= u32::from(KIND_COUNT) {
            return Err(SaveError::KindOutOfRange { kind, cell });
        }
        kinds[cell.row as usize - 1][cell.col as usize - 1] = kind as u8;
    }
    Ok((state, Board::from_kinds(&kinds)))
}

/// Save to disk. Creates the parent directory if needed.
pub fn save(path: &Path, state: &GameState, board: &Board) -> Result<(), SaveError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let f = fs::File::create(path)?;
    write_to(io::BufWriter::new(f), state, board)?;
    Ok(())
}

/// Load from disk. A missing file is not an error: returns `Ok(None)`.
pub fn load(path: &Path) -> Result<Option<(GameState, Board)>, SaveError> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    decode(&text).map(Some)
}
