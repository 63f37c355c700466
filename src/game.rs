//! Game state: board, placement, line clears, scoring, tray and drag-to-snap.

use crate::GameConfig;
use crate::shape::{Shape, ShapeKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

/// Board is BOARD_SIZE x BOARD_SIZE cells.
pub const BOARD_SIZE: usize = 10;

/// Pieces offered at once.
pub const TRAY_SLOTS: usize = 3;

/// Bonus per cleared row or column.
pub const LINE_BONUS: u32 = 10;

/// Occupancy grid. `cells[row][col]`, row 0 is top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    cells: [[bool; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, occupied: bool) {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            self.cells[row][col] = occupied;
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&c| c).count()
    }

    /// True if every cell of `shape` anchored at (row, col) is on the board and empty.
    pub fn can_place(&self, shape: &Shape, row: i32, col: i32) -> bool {
        shape.cells().iter().all(|&(dr, dc)| {
            let (r, c) = (row + dr, col + dc);
            (0..BOARD_SIZE as i32).contains(&r)
                && (0..BOARD_SIZE as i32).contains(&c)
                && !self.cells[r as usize][c as usize]
        })
    }

    /// Copy of the board with the shape's cells filled. Anchor must satisfy `can_place`.
    pub fn place(&self, shape: &Shape, row: usize, col: usize) -> Self {
        let mut next = *self;
        for &(dr, dc) in shape.cells() {
            next.set(row + dr as usize, col + dc as usize, true);
        }
        next
    }

    /// Full rows and full columns, both measured on this board.
    pub fn full_lines(&self) -> ClearedLines {
        let rows = (0..BOARD_SIZE)
            .filter(|&r| self.cells[r].iter().all(|&c| c))
            .collect();
        let cols = (0..BOARD_SIZE)
            .filter(|&c| (0..BOARD_SIZE).all(|r| self.cells[r][c]))
            .collect();
        ClearedLines { rows, cols }
    }

    /// Copy of the board with every listed row and column emptied.
    pub fn clear_lines(&self, lines: &ClearedLines) -> Self {
        let mut next = *self;
        for &r in &lines.rows {
            for c in 0..BOARD_SIZE {
                next.set(r, c, false);
            }
        }
        for &c in &lines.cols {
            for r in 0..BOARD_SIZE {
                next.set(r, c, false);
            }
        }
        next
    }

    /// Anchors (row, col) where `shape` fits, in row-major order.
    pub fn valid_anchors<'a>(&'a self, shape: &'a Shape) -> impl Iterator<Item = (usize, usize)> + 'a {
        (0..BOARD_SIZE)
            .flat_map(|r| (0..BOARD_SIZE).map(move |c| (r, c)))
            .filter(move |&(r, c)| self.can_place(shape, r as i32, c as i32))
    }

    /// True if any of the shapes fits anywhere.
    pub fn any_moves_left<'a, I>(&self, shapes: I) -> bool
    where
        I: IntoIterator<Item = &'a Shape>,
    {
        shapes
            .into_iter()
            .any(|shape| self.valid_anchors(shape).next().is_some())
    }
}

/// Row and column indices removed by a clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearedLines {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

impl ClearedLines {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.cols.is_empty()
    }

    pub fn count(&self) -> usize {
        self.rows.len() + self.cols.len()
    }

    /// Every cell covered by the cleared lines, each once.
    pub fn cells(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for r in 0..BOARD_SIZE {
            for c in 0..BOARD_SIZE {
                if self.rows.contains(&r) || self.cols.contains(&c) {
                    out.push((r, c));
                }
            }
        }
        out
    }
}

/// Rotation direction for the selected piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
}

impl Turn {
    fn quarter_turns(self) -> i32 {
        match self {
            Self::Right => 1,
            Self::Left => 3,
        }
    }
}

/// A tray piece: base kind, rotation 0..4 and the shape in that orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: ShapeKind,
    pub rotation: u8,
    pub shape: Shape,
}

impl Piece {
    pub fn new(kind: ShapeKind, rotation: u8) -> Self {
        Self {
            kind,
            rotation: rotation % 4,
            shape: kind.shape().rotated(i32::from(rotation)),
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        let kind = ShapeKind::ALL[rng.gen_range(0..ShapeKind::ALL.len())];
        Self::new(kind, rng.gen_range(0..4))
    }

    /// Rotate from the current orientation.
    pub fn turn(&mut self, turn: Turn) {
        let k = turn.quarter_turns();
        self.shape = self.shape.rotated(k);
        self.rotation = (self.rotation + k as u8) % 4;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraySlot {
    pub piece: Piece,
    pub used: bool,
}

/// The three offered pieces. Refilled as a whole once every slot is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tray {
    slots: [TraySlot; TRAY_SLOTS],
}

impl Tray {
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            slots: std::array::from_fn(|_| TraySlot {
                piece: Piece::random(rng),
                used: false,
            }),
        }
    }

    #[cfg(test)]
    pub fn from_pieces(pieces: [Piece; TRAY_SLOTS]) -> Self {
        Self {
            slots: pieces.map(|piece| TraySlot { piece, used: false }),
        }
    }

    #[inline]
    pub fn slots(&self) -> &[TraySlot; TRAY_SLOTS] {
        &self.slots
    }

    /// Unused piece in `slot`, if any.
    pub fn active(&self, slot: usize) -> Option<&Piece> {
        self.slots.get(slot).filter(|s| !s.used).map(|s| &s.piece)
    }

    pub fn active_shapes(&self) -> impl Iterator<Item = &Shape> {
        self.slots.iter().filter(|s| !s.used).map(|s| &s.piece.shape)
    }

    pub fn all_used(&self) -> bool {
        self.slots.iter().all(|s| s.used)
    }
}

/// Where board cells sit in pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapGrid {
    pub left: f64,
    pub top: f64,
    /// Distance between neighbouring cell origins.
    pub step_x: f64,
    pub step_y: f64,
    /// Drawn size of one cell (step minus gap).
    pub cell_w: f64,
    pub cell_h: f64,
}

impl SnapGrid {
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.left + col as f64 * self.step_x + self.cell_w / 2.0,
            self.top + row as f64 * self.step_y + self.cell_h / 2.0,
        )
    }
}

/// Valid anchor whose cell centre is closest to `point`; ties keep the first in row-major order.
pub fn nearest_valid_cell(
    board: &Board,
    shape: &Shape,
    point: (f64, f64),
    grid: &SnapGrid,
) -> Option<(usize, usize)> {
    let mut best: Option<((usize, usize), f64)> = None;
    for (r, c) in board.valid_anchors(shape) {
        let (cx, cy) = grid.cell_center(r, c);
        let (dx, dy) = (point.0 - cx, point.1 - cy);
        let d = dx * dx + dy * dy;
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some(((r, c), d));
        }
    }
    best.map(|(cell, _)| cell)
}

/// In-progress drag of a tray piece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub slot: usize,
    pub pointer: (f64, f64),
    /// Board placement the target was snapped against.
    pub grid: SnapGrid,
    /// Snapped anchor for the current pointer, None if the piece fits nowhere.
    pub target: Option<(usize, usize)>,
    /// False until the pointer moves; a release before that is a plain click.
    pub moved: bool,
}

/// Preview of where the active piece would land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ghost {
    pub cells: Vec<(usize, usize)>,
    pub valid: bool,
}

/// Result of a successful placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOutcome {
    pub cells_placed: usize,
    pub cleared: ClearedLines,
    pub points: u32,
    pub refilled: bool,
    pub game_over: bool,
}

/// Whole game: board, tray, score, selection and drag.
#[derive(Debug)]
pub struct GameState {
    pub board: Board,
    pub tray: Tray,
    pub score: u32,
    pub game_over: bool,
    pub selected: Option<usize>,
    pub drag: Option<Drag>,
    /// Keyboard placement anchor.
    pub cursor: (usize, usize),
    /// Whether the keyboard cursor drives the ghost preview.
    pub keyboard_active: bool,
    pub lines_cleared: u32,
    pub pieces_placed: u32,
    /// Cells emptied by the latest clear; drained by the renderer.
    pub flash: Vec<(usize, usize)>,
    rng: StdRng,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let tray = Tray::random(&mut rng);
        info!(seed = ?config.seed, "new game");
        Self {
            board: Board::new(),
            tray,
            score: 0,
            game_over: false,
            selected: None,
            drag: None,
            cursor: (0, 0),
            keyboard_active: false,
            lines_cleared: 0,
            pieces_placed: 0,
            flash: Vec::new(),
            rng,
        }
    }

    /// Start over: empty board, new tray, score 0.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.tray = Tray::random(&mut self.rng);
        self.score = 0;
        self.game_over = false;
        self.selected = None;
        self.drag = None;
        self.cursor = (0, 0);
        self.keyboard_active = false;
        self.lines_cleared = 0;
        self.pieces_placed = 0;
        self.flash.clear();
        info!("game reset");
    }

    /// Mark an unused slot as selected.
    pub fn select(&mut self, slot: usize) -> bool {
        if self.game_over || self.tray.active(slot).is_none() {
            return false;
        }
        self.selected = Some(slot);
        true
    }

    /// Select the next unused slot after the current selection.
    pub fn select_next(&mut self) -> bool {
        let start = self.selected.map_or(0, |s| s + 1);
        (0..TRAY_SLOTS)
            .map(|i| (start + i) % TRAY_SLOTS)
            .find(|&slot| self.tray.active(slot).is_some())
            .is_some_and(|slot| self.select(slot))
    }

    /// Rotate the selected piece; no-op without a selection. A drag on that piece re-snaps.
    pub fn rotate_selected(&mut self, turn: Turn) -> bool {
        if self.game_over {
            return false;
        }
        let Some(slot) = self.selected else {
            return false;
        };
        let Some(entry) = self.tray.slots.get_mut(slot).filter(|s| !s.used) else {
            return false;
        };
        entry.piece.turn(turn);
        trace!(slot, kind = ?entry.piece.kind, rotation = entry.piece.rotation, "rotated");
        if let Some(drag) = self.drag.filter(|d| d.slot == slot) {
            self.drag = Some(Drag {
                target: self.snap(slot, drag.pointer, &drag.grid),
                ..drag
            });
        }
        true
    }

    /// Press on a tray slot: select it and start tracking the pointer.
    pub fn begin_drag(&mut self, slot: usize, pointer: (f64, f64), grid: &SnapGrid) -> bool {
        if !self.select(slot) {
            return false;
        }
        self.keyboard_active = false;
        let target = self.snap(slot, pointer, grid);
        self.drag = Some(Drag {
            slot,
            pointer,
            grid: *grid,
            target,
            moved: false,
        });
        true
    }

    /// Pointer moved while dragging: re-snap to the nearest valid cell.
    pub fn drag_to(&mut self, pointer: (f64, f64), grid: &SnapGrid) {
        let Some(drag) = self.drag else {
            return;
        };
        let target = self.snap(drag.slot, pointer, grid);
        self.drag = Some(Drag {
            slot: drag.slot,
            pointer,
            grid: *grid,
            target,
            moved: drag.moved || pointer != drag.pointer,
        });
    }

    /// Release: place at the last snapped target. A release without movement only selects.
    pub fn end_drag(&mut self) -> Option<PlaceOutcome> {
        let drag = self.drag.take()?;
        if !drag.moved {
            return None;
        }
        match drag.target {
            Some((row, col)) => self.place_at(drag.slot, row, col),
            None => {
                debug!(slot = drag.slot, "drop with no valid target");
                None
            }
        }
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    fn snap(&self, slot: usize, pointer: (f64, f64), grid: &SnapGrid) -> Option<(usize, usize)> {
        let piece = self.tray.active(slot)?;
        let target = nearest_valid_cell(&self.board, &piece.shape, pointer, grid);
        trace!(slot, ?pointer, ?target, "snap");
        target
    }

    pub fn move_cursor(&mut self, d_row: i32, d_col: i32) {
        let clamp = |v: usize, d: i32| (v as i32 + d).clamp(0, BOARD_SIZE as i32 - 1) as usize;
        self.cursor = (clamp(self.cursor.0, d_row), clamp(self.cursor.1, d_col));
        self.keyboard_active = true;
    }

    /// Place the selected piece with its anchor on the cursor.
    pub fn place_selected_at_cursor(&mut self) -> Option<PlaceOutcome> {
        let slot = self.selected?;
        let (row, col) = self.cursor;
        self.place_at(slot, row, col)
    }

    /// Place the piece in `slot` at (row, col), then clear, score, refill and check for game over.
    /// Returns None (and changes nothing) if the slot is used or the piece does not fit.
    pub fn place_at(&mut self, slot: usize, row: usize, col: usize) -> Option<PlaceOutcome> {
        if self.game_over {
            return None;
        }
        let shape = self.tray.active(slot)?.shape.clone();
        if !self.board.can_place(&shape, row as i32, col as i32) {
            return None;
        }

        let placed = self.board.place(&shape, row, col);
        self.tray.slots[slot].used = true;
        self.selected = None;
        self.drag = None;
        self.pieces_placed += 1;

        let mut points = shape.len() as u32;
        let cleared = placed.full_lines();
        self.board = if cleared.is_empty() {
            placed
        } else {
            points += LINE_BONUS * cleared.count() as u32;
            self.lines_cleared += cleared.count() as u32;
            self.flash = cleared.cells();
            debug!(rows = ?cleared.rows, cols = ?cleared.cols, "lines cleared");
            placed.clear_lines(&cleared)
        };
        self.score += points;
        debug!(
            slot,
            row,
            col,
            points,
            score = self.score,
            filled = self.board.occupied_count(),
            "placed"
        );

        let refilled = self.tray.all_used();
        if refilled {
            self.tray = Tray::random(&mut self.rng);
            debug!("tray refilled");
        }

        if !self.board.any_moves_left(self.tray.active_shapes()) {
            self.game_over = true;
            info!(score = self.score, pieces = self.pieces_placed, "game over");
        }

        Some(PlaceOutcome {
            cells_placed: shape.len(),
            cleared,
            points,
            refilled,
            game_over: self.game_over,
        })
    }

    /// Where the active piece would land: the drag target, or the keyboard cursor.
    pub fn ghost(&self) -> Option<Ghost> {
        let (slot, (row, col), valid) = match self.drag {
            Some(drag) => (drag.slot, drag.target?, true),
            None if self.keyboard_active => {
                let slot = self.selected?;
                let piece = self.tray.active(slot)?;
                let (r, c) = self.cursor;
                (slot, self.cursor, self.board.can_place(&piece.shape, r as i32, c as i32))
            }
            None => return None,
        };
        let piece = self.tray.active(slot)?;
        let cells = piece
            .shape
            .cells()
            .iter()
            .map(|&(dr, dc)| (row as i32 + dr, col as i32 + dc))
            .filter(|&(r, c)| (0..BOARD_SIZE as i32).contains(&r) && (0..BOARD_SIZE as i32).contains(&c))
            .map(|(r, c)| (r as usize, c as usize))
            .collect();
        Some(Ghost { cells, valid })
    }
}
