//! gemtui: match-three gem swapping puzzle in the terminal.

mod app;
mod board;
mod engine;
mod input;
mod save;
mod scoring;
mod session;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{Level, info, warn};

/// Options derived from CLI that affect the game and loop.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub seed: Option<u64>,
    pub save_path: PathBuf,
    pub tick_rate: f64,
    pub frame_rate: f64,
    pub cascade_scoring: bool,
    pub effects: bool,
    pub load_on_start: bool,
}

impl GameConfig {
    fn from_args(args: &Args) -> Self {
        Self {
            seed: args.seed,
            save_path: args
                .save_file
                .clone()
                .unwrap_or_else(save::default_save_path),
            tick_rate: args.tick_rate,
            frame_rate: args.frame_rate,
            cascade_scoring: !args.no_cascade_scoring,
            effects: !args.no_effects,
            load_on_start: args.load,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), args.verbose)?;

    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        warn!(error = %e, "theme not loaded, using defaults");
        let mut t = theme::Theme::default();
        t.apply_palette(args.palette);
        t
    });
    let config = GameConfig::from_args(&args);
    info!(?config, "starting");

    let mut app = App::new(config, theme);
    app.run()?;
    Ok(())
}

/// Terminal UI owns stdout/stderr, so logs only go to a file when one is given.
fn init_logging(path: Option<&Path>, verbose: bool) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .init();
    Ok(())
}

/// Match-three gem puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "gemtui",
    version,
    about = "Match-three gem puzzle in the terminal. Swap neighbouring gems to line up three or more.",
    long_about = "gemtui is a terminal match-three puzzle on an 8×8 board of seven gem kinds.\n\n\
        Click a gem, then click a neighbour to swap them. Rows or columns of three or more equal \
        gems score 10 (three), 20 (four) or 30 (five and up), fade out, and the gems above fall \
        into the gap while new ones drop in from the top. Reaching 100 points advances to level 2.\n\n\
        CONTROLS:\n  Mouse         Click two adjacent gems\n  Arrows/WASD   Move cursor    Enter/Space  Select\n  \
        K             Save           L            Load\n  P             Pause          Q / Esc      Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Seed the board and refills for a reproducible game.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Save file used by K/L. Defaults to $XDG_CONFIG_HOME/gemtui/save.txt.
    #[arg(long, value_name = "FILE")]
    pub save_file: Option<PathBuf>,

    /// Load the save file at startup.
    #[arg(long)]
    pub load: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Game logic ticks per second. Gems slide one animation pixel per tick.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Only score the runs made directly by a swap, not the cascades after the refill.
    #[arg(long)]
    pub no_cascade_scoring: bool,

    /// Disable score and level-up effects.
    #[arg(long)]
    pub no_effects: bool,

    /// Write logs to this file (the terminal is taken by the game).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log debug events (clicks, ignored input, settle) as well.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::try_parse_from(["gemtui"]).unwrap();
        let config = GameConfig::from_args(&args);
        assert_eq!(config.tick_rate, 60.0);
        assert_eq!(config.frame_rate, 60.0);
        assert!(config.cascade_scoring);
        assert!(config.effects);
        assert!(!config.load_on_start);
        assert_eq!(config.seed, None);
        assert!(config.save_path.ends_with("gemtui/save.txt"));
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "gemtui",
            "--seed",
            "9",
            "--save-file",
            "/tmp/g.txt",
            "--no-cascade-scoring",
            "--no-effects",
            "--load",
            "--palette",
            "contrast",
        ])
        .unwrap();
        let config = GameConfig::from_args(&args);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.save_path, PathBuf::from("/tmp/g.txt"));
        assert!(!config.cascade_scoring);
        assert!(!config.effects);
        assert!(config.load_on_start);
        assert_eq!(args.palette, Palette::HighContrast);
    }

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
