//! Input mapping: key bindings, cursor navigation, pointer → board cell.

use crate::board::{BOARD_SIZE, Cell, TILE_SIZE};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// (drow, dcol) for one step.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }
}

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Cursor(Direction),
    /// Click the cell under the cursor.
    Select,
    Save,
    Load,
    Pause,
    Quit,
    None,
}

/// Map key event to game action. Arrows or WASD move the cursor, Enter/Space select,
/// K saves and L loads.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Up | KeyCode::Char('w' | 'W') => Action::Cursor(Direction::Up),
        KeyCode::Down | KeyCode::Char('s' | 'S') => Action::Cursor(Direction::Down),
        KeyCode::Left | KeyCode::Char('a' | 'A') => Action::Cursor(Direction::Left),
        KeyCode::Right | KeyCode::Char('d' | 'D') => Action::Cursor(Direction::Right),
        KeyCode::Enter | KeyCode::Char(' ') => Action::Select,
        KeyCode::Char('k' | 'K') => Action::Save,
        KeyCode::Char('l' | 'L') => Action::Load,
        _ => Action::None,
    }
}

/// Keyboard cursor, always on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    cell: Cell,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            cell: Cell::new(1, 1),
        }
    }
}

impl Cursor {
    pub fn cell(&self) -> Cell {
        self.cell
    }

    /// Move one cell; stays put at the board edge.
    pub fn step(&mut self, direction: Direction) {
        let (drow, dcol) = direction.delta();
        if let Some(next) = self.cell.offset(drow, dcol) {
            self.cell = next;
        }
    }
}

/// Board cell under an animation-space pixel: `floor(pixel / TILE_SIZE) + 1`, clamped per axis.
/// Pixel (0, 0) is the top-left corner of cell (1, 1).
pub fn cell_from_pixel(x: i32, y: i32) -> Cell {
    let axis = |p: i32| (p.div_euclid(TILE_SIZE) + 1).clamp(1, i32::from(BOARD_SIZE)) as u8;
    Cell::new(axis(y), axis(x))
}

/// Where the board sits on screen, as last drawn. Used to hit-test mouse clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardGeometry {
    /// Terminal column/row of cell (1, 1)'s top-left corner.
    pub x: u16,
    pub y: u16,
    /// Terminal cells per tile.
    pub tile_cols: u16,
    pub tile_rows: u16,
}

impl BoardGeometry {
    pub fn width(&self) -> u16 {
        self.tile_cols * u16::from(BOARD_SIZE)
    }

    pub fn height(&self) -> u16 {
        self.tile_rows * u16::from(BOARD_SIZE)
    }

    /// Terminal position → animation pixels, or None outside the board.
    pub fn pointer_to_pixel(&self, column: u16, row: u16) -> Option<(i32, i32)> {
        if column < self.x || row < self.y {
            return None;
        }
        let (dx, dy) = (column - self.x, row - self.y);
        if dx >= self.width() || dy >= self.height() {
            return None;
        }
        let px = i32::from(dx) * TILE_SIZE / i32::from(self.tile_cols);
        let py = i32::from(dy) * TILE_SIZE / i32::from(self.tile_rows);
        Some((px, py))
    }

    /// Board cell under a mouse click.
    pub fn cell_at(&self, column: u16, row: u16) -> Option<Cell> {
        self.pointer_to_pixel(column, row)
            .map(|(px, py)| cell_from_pixel(px, py))
    }

    /// Terminal position of an animation-space pixel (may lie off-board while gems fall in).
    pub fn pixel_to_screen(&self, px: i32, py: i32) -> (i32, i32) {
        (
            i32::from(self.x) + (px * i32::from(self.tile_cols)).div_euclid(TILE_SIZE),
            i32::from(self.y) + (py * i32::from(self.tile_rows)).div_euclid(TILE_SIZE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> BoardGeometry {
        BoardGeometry {
            x: 10,
            y: 5,
            tile_cols: 6,
            tile_rows: 3,
        }
    }

    #[test]
    fn test_movement_keys() {
        assert_eq!(
            key_to_action(KeyEvent::from(KeyCode::Left)),
            Action::Cursor(Direction::Left)
        );
        assert_eq!(
            key_to_action(KeyEvent::from(KeyCode::Char('w'))),
            Action::Cursor(Direction::Up)
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('D'), KeyModifiers::SHIFT)),
            Action::Cursor(Direction::Right)
        );
    }

    #[test]
    fn test_command_keys() {
        assert_eq!(key_to_action(KeyEvent::from(KeyCode::Char('k'))), Action::Save);
        assert_eq!(key_to_action(KeyEvent::from(KeyCode::Char('L'))), Action::Load);
        assert_eq!(key_to_action(KeyEvent::from(KeyCode::Enter)), Action::Select);
        assert_eq!(key_to_action(KeyEvent::from(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::ALT)),
            Action::None
        );
    }

    #[test]
    fn test_cursor_clamps_at_edges() {
        let mut cursor = Cursor::default();
        cursor.step(Direction::Up);
        cursor.step(Direction::Left);
        assert_eq!(cursor.cell(), Cell::new(1, 1));
        for _ in 0..20 {
            cursor.step(Direction::Down);
            cursor.step(Direction::Right);
        }
        assert_eq!(cursor.cell(), Cell::new(8, 8));
        cursor.step(Direction::Left);
        assert_eq!(cursor.cell(), Cell::new(8, 7));
    }

    #[test]
    fn test_cell_from_pixel() {
        assert_eq!(cell_from_pixel(0, 0), Cell::new(1, 1));
        assert_eq!(cell_from_pixel(TILE_SIZE - 1, TILE_SIZE), Cell::new(2, 1));
        assert_eq!(cell_from_pixel(3 * TILE_SIZE + 5, 7 * TILE_SIZE), Cell::new(8, 4));
        assert_eq!(cell_from_pixel(-5, 20 * TILE_SIZE), Cell::new(8, 1));
    }

    #[test]
    fn test_geometry_hit_test() {
        let g = geometry();
        assert_eq!(g.cell_at(10, 5), Some(Cell::new(1, 1)));
        assert_eq!(g.cell_at(15, 7), Some(Cell::new(1, 1)));
        assert_eq!(g.cell_at(16, 8), Some(Cell::new(2, 2)));
        assert_eq!(g.cell_at(10 + 47, 5 + 23), Some(Cell::new(8, 8)));
        assert_eq!(g.cell_at(9, 5), None);
        assert_eq!(g.cell_at(10 + 48, 5), None);
        assert_eq!(g.cell_at(10, 5 + 24), None);
    }

    #[test]
    fn test_pixel_to_screen_round_trip() {
        let g = geometry();
        for cell in Cell::all() {
            let (px, py) = cell.pixel();
            // cell pixels are offset by one tile from the screen origin
            let (sx, sy) = g.pixel_to_screen(px - TILE_SIZE, py - TILE_SIZE);
            assert_eq!(g.cell_at(sx as u16, sy as u16), Some(cell));
        }
        assert_eq!(g.pixel_to_screen(-TILE_SIZE, -TILE_SIZE), (4, 2));
    }
}
