//! Rendering: board tiles at their animated positions, sidebar with score and controls,
//! pause overlay and TachyonFX score/level effects.

use crate::board::{BOARD_SIZE, Cell, Piece, TILE_SIZE};
use crate::engine::Phase;
use crate::input::BoardGeometry;
use crate::session::GameSession;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Terminal cells per board tile.
pub const TILE_COLS: u16 = 6;
pub const TILE_ROWS: u16 = 3;

const SIDEBAR_WIDTH: u16 = 28;

/// One glyph per gem kind so kinds stay apart without colour.
const GLYPHS: [&str; 7] = ["◆", "●", "▲", "■", "★", "♥", "✚"];

const SCORE_PULSE_MS: u32 = 350;
const LEVEL_FLASH_MS: u32 = 700;

const BOARD_W: u16 = TILE_COLS * BOARD_SIZE as u16;
const BOARD_H: u16 = TILE_ROWS * BOARD_SIZE as u16;

/// Screen split for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Areas {
    /// Board including its border.
    board: Rect,
    sidebar: Rect,
}

/// Center board + sidebar in `area`. None if the terminal is too small for the board.
fn layout(area: Rect) -> Option<Areas> {
    let (bw, bh) = (BOARD_W + 2, BOARD_H + 2);
    let total_w = bw + SIDEBAR_WIDTH;
    if area.width < total_w || area.height < bh {
        return None;
    }

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bh),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    Some(Areas {
        board: inner[0],
        sidebar: inner[1],
    })
}

/// Geometry of the tile grid inside the bordered board rect.
fn board_geometry(board: Rect) -> BoardGeometry {
    BoardGeometry {
        x: board.x + 1,
        y: board.y + 1,
        tile_cols: TILE_COLS,
        tile_rows: TILE_ROWS,
    }
}

/// Short-lived TachyonFX effects: score pulse on the stats box and level-up flash on the board.
pub struct Effects {
    enabled: bool,
    score_pulse: Option<Effect>,
    level_flash: Option<Effect>,
    last_process: Option<Instant>,
}

impl Effects {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            score_pulse: None,
            level_flash: None,
            last_process: None,
        }
    }

    pub fn score_pulse(&mut self, theme: &Theme) {
        if self.enabled {
            self.score_pulse = Some(fx::fade_from(
                theme.title,
                theme.bg,
                (SCORE_PULSE_MS, Interpolation::Linear),
            ));
        }
    }

    pub fn level_flash(&mut self, theme: &Theme) {
        if self.enabled {
            self.level_flash = Some(fx::fade_from(
                theme.title,
                theme.title,
                (LEVEL_FLASH_MS, Interpolation::QuadOut),
            ));
        }
    }

    pub fn is_active(&self) -> bool {
        self.score_pulse.is_some() || self.level_flash.is_some()
    }

    fn render(&mut self, frame: &mut Frame, areas: Areas, stats: Rect, now: Instant) {
        let delta = self
            .last_process
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        let delta = TfxDuration::from_millis(delta.as_millis().min(u128::from(u32::MAX)) as u32);
        self.last_process = self.is_active().then_some(now);

        if let Some(effect) = &mut self.score_pulse {
            frame.render_effect(effect, stats, delta);
        }
        if let Some(effect) = &mut self.level_flash {
            frame.render_effect(effect, areas.board, delta);
        }
        if self.score_pulse.as_ref().is_some_and(Effect::done) {
            self.score_pulse = None;
        }
        if self.level_flash.as_ref().is_some_and(Effect::done) {
            self.level_flash = None;
        }
    }
}

/// Draw one frame. Returns where the board landed so mouse clicks can be mapped to cells,
/// or None when the terminal is too small to show it.
pub fn draw(
    frame: &mut Frame,
    session: &GameSession,
    theme: &Theme,
    paused: bool,
    status: Option<&str>,
    effects: &mut Effects,
    now: Instant,
) -> Option<BoardGeometry> {
    let area = frame.area();
    let Some(areas) = layout(area) else {
        draw_too_small(frame, theme, area);
        return None;
    };

    let geometry = board_geometry(areas.board);
    draw_board(frame.buffer_mut(), session, theme, areas.board, geometry);
    let stats = draw_sidebar(frame.buffer_mut(), session, theme, areas.sidebar, status);
    effects.render(frame, areas, stats, now);
    if paused {
        draw_pause_overlay(frame.buffer_mut(), theme, area);
    }
    Some(geometry)
}

fn draw_too_small(frame: &mut Frame, theme: &Theme, area: Rect) {
    let need = format!("{}×{}", BOARD_W + 2 + SIDEBAR_WIDTH, BOARD_H + 2);
    let lines = vec![
        Line::from(Span::styled("Terminal too small", Style::default().fg(theme.title))),
        Line::from(Span::styled(
            format!("need at least {need}"),
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(area, frame.buffer_mut());
}

fn draw_board(buf: &mut Buffer, session: &GameSession, theme: &Theme, outer: Rect, g: BoardGeometry) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .style(Style::default().bg(theme.bg))
        .title(Span::styled(" gemtui ", theme.title));
    let clip = block.inner(outer);
    block.render(outer, buf);

    for piece in session.board().pieces() {
        draw_piece(buf, theme, piece, g, clip);
    }

    if let Some(origin) = session.engine().pending_origin() {
        draw_origin_marker(buf, theme, origin, g);
    }
    draw_cursor(buf, theme, session.cursor().cell(), g, session.engine().accepts_input());
}

/// Screen rect of a tile whose top-left animation pixel is (px, py), in signed coordinates.
fn tile_origin(g: BoardGeometry, px: i32, py: i32) -> (i32, i32) {
    // animation pixels put cell (1, 1) one tile in from the origin
    g.pixel_to_screen(px - TILE_SIZE, py - TILE_SIZE)
}

fn set_cell(buf: &mut Buffer, clip: Rect, x: i32, y: i32, symbol: &str, style: Style) {
    let inside = x >= i32::from(clip.x)
        && y >= i32::from(clip.y)
        && x < i32::from(clip.right())
        && y < i32::from(clip.bottom());
    if inside {
        buf[(x as u16, y as u16)].set_symbol(symbol).set_style(style);
    }
}

fn draw_piece(buf: &mut Buffer, theme: &Theme, piece: &Piece, g: BoardGeometry, clip: Rect) {
    let (sx, sy) = tile_origin(g, piece.anim_x, piece.anim_y);
    let color = theme.faded_gem_color(piece.kind, piece.fade);
    let fill = Style::default().bg(color);
    let glyph_style = Style::default().fg(theme.bg).bg(color);
    let glyph = GLYPHS[piece.kind as usize % GLYPHS.len()];
    let (w, h) = (i32::from(TILE_COLS), i32::from(TILE_ROWS));
    for dy in 0..h {
        // one column of gutter either side
        for dx in 1..w - 1 {
            let (symbol, style) = if dy == h / 2 && dx == w / 2 {
                (glyph, glyph_style)
            } else {
                (" ", fill)
            };
            set_cell(buf, clip, sx + dx, sy + dy, symbol, style);
        }
    }
}

fn cell_screen_rect(g: BoardGeometry, cell: Cell) -> Rect {
    Rect {
        x: g.x + u16::from(cell.col - 1) * g.tile_cols,
        y: g.y + u16::from(cell.row - 1) * g.tile_rows,
        width: g.tile_cols,
        height: g.tile_rows,
    }
}

fn draw_origin_marker(buf: &mut Buffer, theme: &Theme, origin: Cell, g: BoardGeometry) {
    let r = cell_screen_rect(g, origin);
    let style = Style::default().fg(theme.selected).bg(theme.bg);
    for y in r.top()..r.bottom() {
        buf[(r.left(), y)].set_symbol("▐").set_style(style);
        buf[(r.right() - 1, y)].set_symbol("▌").set_style(style);
    }
}

/// Dimmed while the board is busy and clicks are ignored.
fn draw_cursor(buf: &mut Buffer, theme: &Theme, cursor: Cell, g: BoardGeometry, live: bool) {
    let r = cell_screen_rect(g, cursor);
    let fg = if live { theme.cursor } else { theme.inactive_fg };
    let style = Style::default().fg(fg).bg(theme.bg);
    let mid = r.y + r.height / 2;
    buf[(r.left(), mid)].set_symbol("[").set_style(style);
    buf[(r.right() - 1, mid)].set_symbol("]").set_style(style);
}

fn phase_label(phase: Phase, moving: bool) -> String {
    match phase {
        Phase::Idle if moving => "Settling".to_string(),
        Phase::Idle => "Pick a gem".to_string(),
        Phase::AwaitingSecond { origin } => format!("Swap {origin} with…"),
        Phase::Swapped { a, b } => format!("Swapping {a} {b}"),
        Phase::Settling { pass } => format!("Resolving, pass {pass}"),
    }
}

/// Draws the sidebar and returns the stats box, the target of the score pulse.
fn draw_sidebar(
    buf: &mut Buffer,
    session: &GameSession,
    theme: &Theme,
    area: Rect,
    status: Option<&str>,
) -> Rect {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let dim_style = Style::default().fg(theme.inactive_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Score, Moves, Level
            Constraint::Length(4), // Phase
            Constraint::Length(10), // Controls
            Constraint::Fill(1),   // Status
        ])
        .split(area);

    let boxed = |title: &'static str| {
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(title, title_style))
    };
    let stat = |label: &'static str, value: u32| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value.to_string(), fg_style),
        ])
    };

    let state = session.state();
    Paragraph::new(Text::from(vec![
        stat("Score: ", state.score),
        stat("Moves: ", state.moves),
        stat("Level: ", state.level),
    ]))
    .block(boxed(" Stats "))
    .render(chunks[0], buf);

    let engine = session.engine();
    let mut phase_lines = vec![Line::from(Span::styled(
        phase_label(engine.phase(), engine.is_moving()),
        fg_style,
    ))];
    if engine.ignored_clicks() > 0 {
        phase_lines.push(Line::from(Span::styled(
            format!("{} clicks ignored", engine.ignored_clicks()),
            dim_style,
        )));
    }
    Paragraph::new(phase_lines)
        .block(boxed(" Board "))
        .render(chunks[1], buf);

    let help = [
        ("Mouse", "click two gems"),
        ("WASD/←↑↓→", "move cursor"),
        ("Enter/Space", "select"),
        ("K", "save"),
        ("L", "load"),
        ("P", "pause"),
        ("Q/Esc", "quit"),
    ];
    let help_lines: Vec<Line> = help
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:<12}"), title_style),
                Span::styled(*what, dim_style),
            ])
        })
        .collect();
    Paragraph::new(help_lines)
        .block(boxed(" Controls "))
        .render(chunks[2], buf);

    if let Some(status) = status {
        Paragraph::new(Line::from(Span::styled(status, fg_style)))
            .wrap(ratatui::widgets::Wrap { trim: true })
            .render(chunks[3], buf);
    }

    chunks[0]
}

fn draw_pause_overlay(buf: &mut Buffer, theme: &Theme, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(theme.title),
        )),
        Line::from(Span::styled(
            " P Resume    Q Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, buf);
}
