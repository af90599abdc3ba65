//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use crate::board::KIND_COUNT;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const GEMS: usize = KIND_COUNT as usize;

/// One Dark gem colours, in kind order: green, yellow, red, blue, magenta, cyan, orange.
const ONEDARK_GEMS: [Color; GEMS] = [
    Color::Rgb(0x98, 0xC3, 0x79),
    Color::Rgb(0xE5, 0xC0, 0x7B),
    Color::Rgb(0xE0, 0x6C, 0x75),
    Color::Rgb(0x61, 0xAF, 0xEF),
    Color::Rgb(0xC6, 0x78, 0xDD),
    Color::Rgb(0x56, 0xB6, 0xC2),
    Color::Rgb(0xD1, 0x9A, 0x66),
];

const HIGH_CONTRAST_GEMS: [Color; GEMS] = [
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0xFF, 0x00, 0xFF),
    Color::Rgb(0x00, 0xFF, 0xFF),
    Color::Rgb(0xFF, 0xFF, 0xFF),
];

// Tol "vibrant" set plus grey; gems also differ by glyph.
const COLORBLIND_GEMS: [Color; GEMS] = [
    Color::Rgb(0x00, 0x77, 0xBB),
    Color::Rgb(0xEE, 0x77, 0x33),
    Color::Rgb(0x00, 0x99, 0x88),
    Color::Rgb(0xCC, 0x33, 0x11),
    Color::Rgb(0xEE, 0x33, 0x77),
    Color::Rgb(0x33, 0xBB, 0xEE),
    Color::Rgb(0xBB, 0xBB, 0xBB),
];

/// Theme file keys feeding each gem colour, first hit wins.
const GEM_KEYS: [&[&str]; GEMS] = [
    &["mem_box", "cpu_start"],
    &["title", "cpu_mid"],
    &["cpu_end", "temp_end"],
    &["cpu_box"],
    &["net_box"],
    &["hi_fg", "proc_misc"],
    &["used_mid", "temp_mid"],
];

/// Gem and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Gem colour per kind.
    pub gems: [Color; GEMS],
    /// Board background; faded gems blend toward it.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, moves, level).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text: help lines, idle labels.
    pub inactive_fg: Color,
    /// Keyboard cursor brackets.
    pub cursor: Color,
    /// Pending swap origin.
    pub selected: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// Hardcoded One Dark defaults, exact hex values from onedark.theme.
    pub fn onedark_default() -> Self {
        Self {
            gems: ONEDARK_GEMS,
            bg: Color::Rgb(0x31, 0x35, 0x3F),          // meter_bg
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),    // div_line
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),     // main_fg
            title: Color::Rgb(0xE5, 0xC0, 0x7B),       // title
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70), // inactive_fg
            cursor: Color::Rgb(0xE0, 0x6C, 0x75),      // selected_bg
            selected: Color::Rgb(0xFF, 0xFF, 0xFF),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file does not exist.
    /// `palette` then overrides the gem colours for high-contrast or colorblind play.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))
            }
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.gems = HIGH_CONTRAST_GEMS;
                self.cursor = Color::Rgb(0xFF, 0x88, 0x00);
            }
            Palette::Colorblind => {
                self.gems = COLORBLIND_GEMS;
                self.cursor = Color::Rgb(0xFF, 0xFF, 0xFF);
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let fallback = Self::onedark_default();
        let mut gems = fallback.gems;
        for (gem, keys) in gems.iter_mut().zip(GEM_KEYS) {
            if let Some(c) = keys.iter().find_map(|&k| get(k)) {
                *gem = c;
            }
        }
        Self {
            gems,
            bg: get("meter_bg").unwrap_or(fallback.bg),
            div_line: get("div_line").unwrap_or(fallback.div_line),
            main_fg: get("main_fg").unwrap_or(fallback.main_fg),
            title: get("title").unwrap_or(fallback.title),
            inactive_fg: get("inactive_fg").unwrap_or(fallback.inactive_fg),
            cursor: get("selected_bg").unwrap_or(fallback.cursor),
            selected: get("selected_fg").unwrap_or(fallback.selected),
        }
    }

    #[inline]
    pub fn gem_color(&self, kind: u8) -> Color {
        self.gems[kind as usize % GEMS]
    }

    /// Gem colour blended toward the background by `fade` (255 = full colour).
    pub fn faded_gem_color(&self, kind: u8, fade: u8) -> Color {
        blend(self.gem_color(kind), self.bg, fade)
    }
}

/// Linear mix of two RGB colours; `alpha` 255 gives `fg`. Non-RGB colours are not blended.
pub fn blend(fg: Color, bg: Color, alpha: u8) -> Color {
    match (fg, bg) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let mix = |f: u8, b: u8| {
                let a = u16::from(alpha);
                ((u16::from(f) * a + u16::from(b) * (255 - a)) / 255) as u8
            };
            Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
        }
        _ if alpha < 128 => bg,
        _ => fg,
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
