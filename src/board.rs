//! Board: 8×8 grid of gems, swaps, match detection, slide/fade animation, gravity and refill.

use rand::Rng;
use std::fmt;
use thiserror::Error;

/// Board edge length in cells.
pub const BOARD_SIZE: u8 = 8;
/// Number of distinct gem kinds; kinds are `0..KIND_COUNT`.
pub const KIND_COUNT: u8 = 7;
/// Edge length of one tile in animation pixels. A piece slides 1 pixel per tick.
pub const TILE_SIZE: i32 = 54;
/// Fade value of a fully visible gem.
pub const FADE_OPAQUE: u8 = 255;

const FADE_STEP: u8 = 10;
/// Matched gems stop fading once at or below this value.
const FADE_FLOOR: u8 = 10;

const N: usize = BOARD_SIZE as usize;

/// Grid address, 1-based: `row` and `col` are both in `1..=BOARD_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: u8,
    pub col: u8,
}

impl Cell {
    pub const fn new(row: u8, col: u8) -> Self {
        debug_assert!(row >= 1 && row <= BOARD_SIZE && col >= 1 && col <= BOARD_SIZE);
        Self { row, col }
    }

    /// Cell at (row, col) if both are on the board.
    pub fn try_new(row: i32, col: i32) -> Option<Self> {
        let range = 1..=i32::from(BOARD_SIZE);
        (range.contains(&row) && range.contains(&col)).then(|| Self::new(row as u8, col as u8))
    }

    /// Neighbour shifted by (drow, dcol), if still on the board.
    pub fn offset(self, drow: i32, dcol: i32) -> Option<Self> {
        Self::try_new(i32::from(self.row) + drow, i32::from(self.col) + dcol)
    }

    pub fn manhattan(self, other: Self) -> u32 {
        u32::from(self.row.abs_diff(other.row)) + u32::from(self.col.abs_diff(other.col))
    }

    /// True if the two cells share an edge.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.manhattan(other) == 1
    }

    /// All 64 cells in row-major order: (1,1)..(1,8), (2,1)..(8,8).
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=BOARD_SIZE).flat_map(|row| (1..=BOARD_SIZE).map(move |col| Self::new(row, col)))
    }

    /// Pixel position a piece at this cell converges to.
    pub fn pixel(self) -> (i32, i32) {
        (i32::from(self.col) * TILE_SIZE, i32::from(self.row) * TILE_SIZE)
    }

    #[inline]
    fn index(self) -> (usize, usize) {
        (self.row as usize - 1, self.col as usize - 1)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// One gem: kind, logical address, animated pixel position, match counter and fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub kind: u8,
    pub row: u8,
    pub col: u8,
    pub anim_x: i32,
    pub anim_y: i32,
    /// Nonzero once the gem is part of a run; counts one per detection hit.
    pub matched: u32,
    /// Opacity, 255 = opaque. Drops toward 0 once matched.
    pub fade: u8,
}

impl Piece {
    /// Gem at rest on `cell`: animated position equals the logical one.
    pub fn new(kind: u8, cell: Cell) -> Self {
        let (anim_x, anim_y) = cell.pixel();
        Self {
            kind,
            row: cell.row,
            col: cell.col,
            anim_x,
            anim_y,
            matched: 0,
            fade: FADE_OPAQUE,
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.row, self.col)
    }

    #[inline]
    pub fn is_matched(&self) -> bool {
        self.matched != 0
    }

    pub fn is_at_rest(&self) -> bool {
        (self.anim_x, self.anim_y) == self.cell().pixel()
    }

    /// One linear step of 1 pixel per axis toward the logical position.
    /// Returns true if the piece was away from its target before the step.
    fn step_toward_target(&mut self) -> bool {
        let (tx, ty) = self.cell().pixel();
        let dx = self.anim_x - tx;
        let dy = self.anim_y - ty;
        self.anim_x -= dx.signum();
        self.anim_y -= dy.signum();
        dx != 0 || dy != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("cells {a} and {b} are not adjacent")]
    NotAdjacent { a: Cell, b: Cell },
}

/// Fixed 8×8 grid. Every address always holds exactly one piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// cells[row - 1][col - 1]
    cells: [[Piece; N]; N],
}

impl Board {
    /// Board with uniformly random kinds. May already contain runs.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut board = Self::from_kinds(&[[0; N]; N]);
        board.initialize(rng);
        board
    }

    /// Board at rest with the given kinds, indexed `kinds[row - 1][col - 1]`.
    pub fn from_kinds(kinds: &[[u8; N]; N]) -> Self {
        let cells = std::array::from_fn(|r| {
            std::array::from_fn(|c| Piece::new(kinds[r][c], Cell::new(r as u8 + 1, c as u8 + 1)))
        });
        Self { cells }
    }

    /// Re-roll every cell to a random kind with a fresh, resting piece.
    pub fn initialize<R: Rng>(&mut self, rng: &mut R) {
        for cell in Cell::all() {
            *self.piece_mut(cell) = Piece::new(rng.gen_range(0..KIND_COUNT), cell);
        }
    }

    /// Snapshot of the kinds, indexed `[row - 1][col - 1]`.
    pub fn kinds(&self) -> [[u8; N]; N] {
        std::array::from_fn(|r| std::array::from_fn(|c| self.cells[r][c].kind))
    }

    #[inline]
    pub fn piece(&self, cell: Cell) -> &Piece {
        let (r, c) = cell.index();
        &self.cells[r][c]
    }

    #[inline]
    fn piece_mut(&mut self, cell: Cell) -> &mut Piece {
        let (r, c) = cell.index();
        &mut self.cells[r][c]
    }

    #[inline]
    pub fn kind(&self, cell: Cell) -> u8 {
        self.piece(cell).kind
    }

    /// All pieces, row-major.
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.cells.iter().flatten()
    }

    fn pieces_mut(&mut self) -> impl Iterator<Item = &mut Piece> {
        self.cells.iter_mut().flatten()
    }

    pub fn has_matches(&self) -> bool {
        self.pieces().any(Piece::is_matched)
    }

    pub fn matched_count(&self) -> usize {
        self.pieces().filter(|p| p.is_matched()).count()
    }

    /// True if every piece sits on its logical position.
    pub fn is_at_rest(&self) -> bool {
        self.pieces().all(Piece::is_at_rest)
    }

    /// Flag a piece as matched without adding to an existing count.
    pub fn mark_matched(&mut self, cell: Cell) {
        let piece = self.piece_mut(cell);
        if piece.matched == 0 {
            piece.matched = 1;
        }
    }

    /// Exchange two edge-adjacent pieces. Logical positions and storage swap; the
    /// animated positions travel with the pieces so both visibly slide to their new cell.
    pub fn swap_cells(&mut self, a: Cell, b: Cell) -> Result<(), BoardError> {
        if !a.is_adjacent(b) {
            return Err(BoardError::NotAdjacent { a, b });
        }
        self.exchange(a, b);
        Ok(())
    }

    fn exchange(&mut self, a: Cell, b: Cell) {
        let mut pa = *self.piece(a);
        let mut pb = *self.piece(b);
        (pa.row, pa.col) = (b.row, b.col);
        (pb.row, pb.col) = (a.row, a.col);
        *self.piece_mut(a) = pb;
        *self.piece_mut(b) = pa;
    }

    /// Flag every 3-window centred on a cell whose two neighbours on one axis share its kind.
    /// Longer runs are covered because each inner member triggers its own window; a cell
    /// qualifying on both axes is counted twice. Off-board neighbours never match.
    pub fn detect_matches(&mut self) {
        for cell in Cell::all() {
            let kind = self.kind(cell);
            for (drow, dcol) in [(1, 0), (0, 1)] {
                let (Some(before), Some(after)) = (cell.offset(-drow, -dcol), cell.offset(drow, dcol))
                else {
                    continue;
                };
                if self.kind(before) == kind && self.kind(after) == kind {
                    for c in [before, cell, after] {
                        let piece = self.piece_mut(c);
                        piece.matched = piece.matched.saturating_add(1);
                    }
                }
            }
        }
    }

    /// Move every piece 1 pixel per axis toward its cell. Returns whether anything moved.
    pub fn advance_animation(&mut self) -> bool {
        let mut moving = false;
        for piece in self.pieces_mut() {
            moving |= piece.step_toward_target();
        }
        moving
    }

    /// Fade matched pieces one step. Returns whether any piece faded.
    pub fn advance_fade(&mut self) -> bool {
        let mut faded = false;
        for piece in self.pieces_mut().filter(|p| p.is_matched() && p.fade > FADE_FLOOR) {
            piece.fade -= FADE_STEP;
            faded = true;
        }
        faded
    }

    /// Gravity for one column: bottom to top, each matched cell pulls down the nearest
    /// unmatched piece above it. Matched pieces end up stacked at the top.
    pub fn compact_column(&mut self, col: u8) {
        for row in (1..=BOARD_SIZE).rev() {
            let hole = Cell::new(row, col);
            if !self.piece(hole).is_matched() {
                continue;
            }
            let donor = (1..row)
                .rev()
                .map(|r| Cell::new(r, col))
                .find(|&c| !self.piece(c).is_matched());
            if let Some(donor) = donor {
                self.exchange(hole, donor);
            }
        }
    }

    /// Replace every matched piece in the column with a new random gem. The n-th refill
    /// counted from the bottom starts `n` tiles above the top edge so new gems fall in staggered.
    /// Returns the number of refilled cells.
    pub fn refill_column<R: Rng>(&mut self, col: u8, rng: &mut R) -> usize {
        let mut n = 0;
        for row in (1..=BOARD_SIZE).rev() {
            let cell = Cell::new(row, col);
            if self.piece(cell).is_matched() {
                let mut piece = Piece::new(rng.gen_range(0..KIND_COUNT), cell);
                piece.anim_y = -TILE_SIZE * n;
                *self.piece_mut(cell) = piece;
                n += 1;
            }
        }
        n as usize
    }

    /// Compact and refill all columns.
    pub fn compact_and_refill<R: Rng>(&mut self, rng: &mut R) -> usize {
        (1..=BOARD_SIZE)
            .map(|col| {
                self.compact_column(col);
                self.refill_column(col, rng)
            })
            .sum()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Kinds 2..=5 in a 2×2 tiling: no two equal neighbours on either axis, kinds 0, 1, 6 unused.
    pub(crate) fn quiet_kinds() -> [[u8; N]; N] {
        std::array::from_fn(|r| std::array::from_fn(|c| 2 + (r as u8 % 2) * 2 + (c as u8 % 2)))
    }

    fn longest_run_through(board: &Board, cell: Cell, drow: i32, dcol: i32) -> usize {
        let kind = board.kind(cell);
        let mut len = 1;
        for sign in [-1, 1] {
            let mut cur = cell;
            while let Some(next) = cur.offset(sign * drow, sign * dcol) {
                if board.kind(next) != kind {
                    break;
                }
                len += 1;
                cur = next;
            }
        }
        len
    }

    #[test]
    fn test_random_board_is_resting_and_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let board = Board::random(&mut rng);
        for cell in Cell::all() {
            let p = board.piece(cell);
            assert!(p.kind < KIND_COUNT);
            assert_eq!(p.cell(), cell);
            assert!(p.is_at_rest());
            assert_eq!(p.matched, 0);
            assert_eq!(p.fade, FADE_OPAQUE);
        }
    }

    #[test]
    fn test_cell_adjacency() {
        let a = Cell::new(1, 1);
        assert!(a.is_adjacent(Cell::new(1, 2)));
        assert!(a.is_adjacent(Cell::new(2, 1)));
        assert!(!a.is_adjacent(Cell::new(2, 2)));
        assert!(!a.is_adjacent(Cell::new(1, 3)));
        assert!(!a.is_adjacent(a));
        assert_eq!(Cell::try_new(0, 1), None);
        assert_eq!(Cell::try_new(8, 9), None);
        assert_eq!(Cell::new(8, 8).offset(1, 0), None);
    }

    #[test]
    fn test_swap_is_involution() {
        let mut rng = StdRng::seed_from_u64(11);
        let original = Board::random(&mut rng);
        let mut board = original.clone();
        let (a, b) = (Cell::new(4, 4), Cell::new(4, 5));
        board.swap_cells(a, b).unwrap();
        assert_ne!(board, original);
        board.swap_cells(a, b).unwrap();
        assert_eq!(board, original);
    }

    #[test]
    fn test_swap_moves_logical_position_only() {
        let mut board = Board::from_kinds(&quiet_kinds());
        let (a, b) = (Cell::new(2, 3), Cell::new(3, 3));
        let (ka, kb) = (board.kind(a), board.kind(b));
        board.swap_cells(a, b).unwrap();
        assert_eq!(board.kind(a), kb);
        assert_eq!(board.kind(b), ka);
        assert_eq!(board.piece(b).cell(), b);
        // animated position still at the old cell
        assert_eq!((board.piece(b).anim_x, board.piece(b).anim_y), a.pixel());
        assert!(!board.is_at_rest());
        for _ in 0..TILE_SIZE {
            assert!(board.advance_animation());
        }
        assert!(!board.advance_animation());
        assert!(board.is_at_rest());
    }

    #[test]
    fn test_swap_rejects_non_adjacent() {
        let mut board = Board::from_kinds(&quiet_kinds());
        let before = board.clone();
        let err = board.swap_cells(Cell::new(1, 1), Cell::new(1, 3)).unwrap_err();
        assert_eq!(err, BoardError::NotAdjacent { a: Cell::new(1, 1), b: Cell::new(1, 3) });
        assert_eq!(board, before);
    }

    #[test]
    fn test_detect_ignores_pairs() {
        let mut kinds = quiet_kinds();
        kinds[0][0] = 1;
        kinds[0][1] = 1;
        kinds[2][5] = 6;
        kinds[3][5] = 6;
        let mut board = Board::from_kinds(&kinds);
        board.detect_matches();
        assert!(!board.has_matches());
    }

    #[test]
    fn test_detect_flags_run_of_three() {
        let mut kinds = quiet_kinds();
        for c in 1..4 {
            kinds[3][c] = 1;
        }
        let mut board = Board::from_kinds(&kinds);
        board.detect_matches();
        assert_eq!(board.matched_count(), 3);
        for col in 2..=4 {
            assert!(board.piece(Cell::new(4, col)).is_matched());
        }
    }

    #[test]
    fn test_detect_flags_whole_long_run_at_board_edge() {
        let mut kinds = quiet_kinds();
        for r in 3..8 {
            kinds[r][7] = 0;
        }
        let mut board = Board::from_kinds(&kinds);
        board.detect_matches();
        assert_eq!(board.matched_count(), 5);
        assert_eq!(board.piece(Cell::new(4, 8)).matched, 1);
        assert_eq!(board.piece(Cell::new(6, 8)).matched, 3);
        assert_eq!(board.piece(Cell::new(8, 8)).matched, 1);
    }

    #[test]
    fn test_detect_counts_both_axes() {
        let mut kinds = quiet_kinds();
        // plus shape centred on (5,5)
        for (r, c) in [(4, 4), (3, 4), (5, 4), (4, 3), (4, 5)] {
            kinds[r][c] = 1;
        }
        let mut board = Board::from_kinds(&kinds);
        board.detect_matches();
        assert_eq!(board.matched_count(), 5);
        assert_eq!(board.piece(Cell::new(5, 5)).matched, 2);
    }

    #[test]
    fn test_detect_never_flags_short_runs_on_random_boards() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut board = Board::random(&mut rng);
            board.detect_matches();
            for cell in Cell::all() {
                if board.piece(cell).is_matched() {
                    let longest = longest_run_through(&board, cell, 0, 1)
                        .max(longest_run_through(&board, cell, 1, 0));
                    assert!(longest >= 3, "seed {seed}: {cell} flagged in a run of {longest}");
                }
            }
        }
    }

    #[test]
    fn test_fade_stops_at_floor() {
        let mut kinds = quiet_kinds();
        for c in 0..3 {
            kinds[0][c] = 1;
        }
        let mut board = Board::from_kinds(&kinds);
        board.detect_matches();
        let mut steps = 0;
        while board.advance_fade() {
            steps += 1;
        }
        assert_eq!(steps, 25);
        assert_eq!(board.piece(Cell::new(1, 1)).fade, 5);
        assert_eq!(board.piece(Cell::new(2, 1)).fade, FADE_OPAQUE);
    }

    #[test]
    fn test_resting_board_stays_put() {
        let mut board = Board::from_kinds(&quiet_kinds());
        let before = board.clone();
        for _ in 0..10 {
            board.detect_matches();
            assert!(!board.advance_animation());
            assert!(!board.advance_fade());
        }
        assert_eq!(board, before);
    }

    #[test]
    fn test_compact_keeps_fall_order() {
        let mut kinds = quiet_kinds();
        for r in 0..8 {
            kinds[r][2] = r as u8 % 3 + 2;
        }
        let mut board = Board::from_kinds(&kinds);
        let above: Vec<u8> = (1..=6).map(|r| board.kind(Cell::new(r, 3))).collect();
        board.mark_matched(Cell::new(7, 3));
        board.mark_matched(Cell::new(8, 3));
        board.compact_column(3);
        let fallen: Vec<u8> = (3..=8).map(|r| board.kind(Cell::new(r, 3))).collect();
        assert_eq!(fallen, above);
        assert!(board.piece(Cell::new(1, 3)).is_matched());
        assert!(board.piece(Cell::new(2, 3)).is_matched());
        for row in 3..=8 {
            assert!(!board.piece(Cell::new(row, 3)).is_matched());
            assert_eq!(board.piece(Cell::new(row, 3)).cell(), Cell::new(row, 3));
        }
    }

    #[test]
    fn test_compact_fills_gap_in_middle() {
        let mut board = Board::from_kinds(&quiet_kinds());
        let top = board.kind(Cell::new(1, 1));
        let bottom = board.kind(Cell::new(8, 1));
        board.mark_matched(Cell::new(4, 1));
        board.compact_column(1);
        assert!(board.piece(Cell::new(1, 1)).is_matched());
        assert_eq!(board.kind(Cell::new(2, 1)), top);
        assert_eq!(board.kind(Cell::new(8, 1)), bottom);
        // fallen piece keeps its old animated position and slides down
        assert_eq!(board.piece(Cell::new(2, 1)).anim_y, TILE_SIZE);
    }

    #[test]
    fn test_refill_staggers_new_gems() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut board = Board::from_kinds(&quiet_kinds());
        for row in 1..=3 {
            board.mark_matched(Cell::new(row, 6));
        }
        assert_eq!(board.refill_column(6, &mut rng), 3);
        assert!(!board.has_matches());
        assert_eq!(board.piece(Cell::new(3, 6)).anim_y, 0);
        assert_eq!(board.piece(Cell::new(2, 6)).anim_y, -TILE_SIZE);
        assert_eq!(board.piece(Cell::new(1, 6)).anim_y, -2 * TILE_SIZE);
        for row in 1..=3 {
            let p = board.piece(Cell::new(row, 6));
            assert!(p.kind < KIND_COUNT);
            assert_eq!(p.fade, FADE_OPAQUE);
            assert_eq!(p.anim_x, 6 * TILE_SIZE);
        }
    }

    #[test]
    fn test_compact_and_refill_leaves_no_holes() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut board = Board::random(&mut rng);
        board.detect_matches();
        let matched = board.matched_count();
        assert_eq!(board.compact_and_refill(&mut rng), matched);
        assert!(!board.has_matches());
        for cell in Cell::all() {
            assert_eq!(board.piece(cell).cell(), cell);
        }
    }
}
