//! Layout and drawing: header, board with snap preview, tray, help line, game over.

use crate::game::{BOARD_SIZE, GameState, SnapGrid, TRAY_SLOTS};
use crate::shape::Shape;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count};

/// Terminal rows are about twice as tall as columns are wide; pointer y is in half-rows.
pub const ROW_ASPECT: f64 = 2.0;

/// Duration of the clear fade in ms.
const CLEAR_FADE_MS: u32 = 400;

/// Tray slot box: 5 mini cells of 2 columns each, plus border.
const SLOT_W: u16 = 12;
const SLOT_H: u16 = 7;
const MINI_CELL_W: u16 = 2;

const HEADER_H: u16 = 1;
const HELP_H: u16 = 1;
const RESET_LABEL: &str = " [ Reset ] ";

/// How one board cell is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellSize {
    /// Columns from one cell to the next.
    step_x: u16,
    /// Rows from one cell to the next.
    step_y: u16,
    /// Drawn columns (the rest is gap).
    draw_w: u16,
    /// Large cells use a half-block second row, leaving half a row of gap.
    half_block_row: bool,
}

const LARGE: CellSize = CellSize {
    step_x: 4,
    step_y: 2,
    draw_w: 3,
    half_block_row: true,
};

const COMPACT: CellSize = CellSize {
    step_x: 3,
    step_y: 1,
    draw_w: 2,
    half_block_row: false,
};

impl CellSize {
    fn board_outer(&self) -> (u16, u16) {
        let n = BOARD_SIZE as u16;
        let inner_w = n * self.step_x - (self.step_x - self.draw_w);
        let inner_h = n * self.step_y;
        (inner_w + 2, inner_h + 2)
    }

    fn column_size(&self) -> (u16, u16) {
        let (bw, bh) = self.board_outer();
        let w = bw.max(SLOT_W * TRAY_SLOTS as u16);
        (w, HEADER_H + bh + SLOT_H + HELP_H)
    }
}

/// Where everything sits on screen for one frame. Also used for mouse hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub header: Rect,
    pub reset: Rect,
    pub board_outer: Rect,
    /// Board cells only (inside the border).
    pub board: Rect,
    pub slots: [Rect; TRAY_SLOTS],
    pub help: Rect,
    pub compact: bool,
    cell: CellSize,
}

impl Geometry {
    /// Lay out the game centred in `area`. Large cells when they fit, unless `force_compact`.
    pub fn compute(area: Rect, force_compact: bool) -> Self {
        let (lw, lh) = LARGE.column_size();
        let compact = force_compact || area.width < lw || area.height < lh;
        let cell = if compact { COMPACT } else { LARGE };
        let (col_w, col_h) = cell.column_size();
        let x = area.x + area.width.saturating_sub(col_w) / 2;
        let y = area.y + area.height.saturating_sub(col_h) / 2;

        let header = Rect::new(x, y, col_w, HEADER_H);
        let reset_w = RESET_LABEL.len() as u16;
        let reset = Rect::new(x + col_w.saturating_sub(reset_w), y, reset_w, HEADER_H);

        let (bw, bh) = cell.board_outer();
        let board_outer = Rect::new(x + (col_w - bw) / 2, y + HEADER_H, bw, bh);
        let board = Rect::new(board_outer.x + 1, board_outer.y + 1, bw - 2, bh - 2);

        let tray_w = SLOT_W * TRAY_SLOTS as u16;
        let tray_x = x + (col_w - tray_w) / 2;
        let tray_y = board_outer.y + bh;
        let slots = std::array::from_fn(|i| Rect::new(tray_x + i as u16 * SLOT_W, tray_y, SLOT_W, SLOT_H));
        let help = Rect::new(x, tray_y + SLOT_H, col_w, HELP_H);

        let clip = |r: Rect| r.intersection(area);
        Self {
            header: clip(header),
            reset: clip(reset),
            board_outer: clip(board_outer),
            board: clip(board),
            slots: slots.map(clip),
            help: clip(help),
            compact,
            cell,
        }
    }

    /// Board cells in pointer units (see `pointer_position`).
    pub fn snap_grid(&self) -> SnapGrid {
        let drawn_rows = if self.cell.half_block_row { 1.5 } else { 1.0 };
        SnapGrid {
            left: f64::from(self.board.x),
            top: f64::from(self.board.y) * ROW_ASPECT,
            step_x: f64::from(self.cell.step_x),
            step_y: f64::from(self.cell.step_y) * ROW_ASPECT,
            cell_w: f64::from(self.cell.draw_w),
            cell_h: drawn_rows * ROW_ASPECT,
        }
    }

    /// Tray slot under the terminal cell, if any.
    pub fn slot_at(&self, column: u16, row: u16) -> Option<usize> {
        let pos = Position::new(column, row);
        self.slots.iter().position(|r| r.contains(pos))
    }

    pub fn is_reset(&self, column: u16, row: u16) -> bool {
        self.reset.contains(Position::new(column, row))
    }

    /// Screen area of board cell (row, col), including its gap.
    fn cell_rect(&self, row: usize, col: usize) -> Rect {
        Rect::new(
            self.board.x + col as u16 * self.cell.step_x,
            self.board.y + row as u16 * self.cell.step_y,
            self.cell.draw_w,
            self.cell.step_y,
        )
    }
}

/// Pointer position for a terminal cell: its centre, in columns and half-rows.
pub fn pointer_position(column: u16, row: u16) -> (f64, f64) {
    (f64::from(column) + 0.5, (f64::from(row) + 0.5) * ROW_ASPECT)
}

/// Draw the whole game. While `state.flash` is non-empty and `animate` is set, fades the
/// cleared cells out with a TachyonFX effect kept in `clear_effect`.
pub fn draw(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    geometry: &Geometry,
    clear_effect: &mut Option<Effect>,
    clear_effect_time: &mut Option<Instant>,
    now: Instant,
    animate: bool,
) {
    let area = frame.area();
    frame
        .buffer_mut()
        .set_style(area, Style::default().bg(theme.bg).fg(theme.main_fg));

    draw_header(frame.buffer_mut(), state, theme, geometry);
    draw_board(frame.buffer_mut(), state, theme, geometry, animate);
    draw_tray(frame.buffer_mut(), state, theme, geometry);
    draw_help(frame.buffer_mut(), theme, geometry);

    if animate && !state.flash.is_empty() {
        apply_clear_effect(frame, state, theme, geometry, clear_effect, clear_effect_time, now);
    }
    if state.game_over {
        draw_game_over(frame.buffer_mut(), state, theme, geometry);
    }
}

fn draw_header(buf: &mut Buffer, state: &GameState, theme: &Theme, geometry: &Geometry) {
    let line = Line::from(vec![
        Span::styled("IZZY BLOCK", Style::default().fg(theme.title).bold()),
        Span::styled("  Score: ", Style::default().fg(theme.main_fg)),
        Span::styled(state.score.to_string(), Style::default().fg(theme.main_fg).bold()),
    ]);
    Paragraph::new(line).render(geometry.header, buf);
    Paragraph::new(Span::styled(
        RESET_LABEL,
        Style::default().fg(theme.main_fg).bg(theme.div_line),
    ))
    .render(geometry.reset, buf);
}

fn draw_board(buf: &mut Buffer, state: &GameState, theme: &Theme, geometry: &Geometry, animate: bool) {
    let title = format!(" Lines {}  Pieces {} ", state.lines_cleared, state.pieces_placed);
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.inactive_fg)))
        .render(geometry.board_outer, buf);

    let ghost = state.ghost();
    let ghost_cells: HashSet<(usize, usize)> = ghost
        .as_ref()
        .map(|g| g.cells.iter().copied().collect())
        .unwrap_or_default();
    let ghost_color = match ghost {
        Some(ref g) if !g.valid => theme.ghost_blocked,
        _ => theme.ghost,
    };
    let flash: HashSet<(usize, usize)> = if animate {
        state.flash.iter().copied().collect()
    } else {
        HashSet::new()
    };
    let cursor = (state.keyboard_active && state.selected.is_none()).then_some(state.cursor);

    for r in 0..BOARD_SIZE {
        for c in 0..BOARD_SIZE {
            let color = if state.board.is_occupied(r, c) {
                theme.block
            } else if ghost_cells.contains(&(r, c)) || cursor == Some((r, c)) {
                ghost_color
            } else if flash.contains(&(r, c)) {
                theme.flash
            } else {
                theme.empty
            };
            paint_cell(buf, geometry, r, c, color, theme.bg);
        }
    }
}

fn paint_cell(buf: &mut Buffer, geometry: &Geometry, row: usize, col: usize, color: Color, bg: Color) {
    let rect = geometry.cell_rect(row, col);
    for dx in 0..rect.width {
        let x = rect.x + dx;
        if let Some(cell) = buf.cell_mut((x, rect.y)) {
            cell.set_symbol("█").set_style(Style::default().fg(color).bg(bg));
        }
        if geometry.cell.half_block_row {
            if let Some(cell) = buf.cell_mut((x, rect.y + 1)) {
                cell.set_symbol("▀").set_style(Style::default().fg(color).bg(bg));
            }
        }
    }
}

fn draw_tray(buf: &mut Buffer, state: &GameState, theme: &Theme, geometry: &Geometry) {
    for (i, (slot, rect)) in state.tray.slots().iter().zip(geometry.slots).enumerate() {
        let dragging = state.drag.is_some_and(|d| d.slot == i);
        let (border, piece_color) = if slot.used {
            (theme.div_line, theme.inactive_fg)
        } else if state.selected == Some(i) {
            (theme.title, if dragging { theme.ghost } else { theme.block })
        } else {
            (theme.div_line, theme.block)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border).bg(theme.bg))
            .title(Span::styled(format!(" {} ", i + 1), Style::default().fg(border)));
        let inner = block.inner(rect);
        block.render(rect, buf);
        draw_mini_shape(buf, &slot.piece.shape, inner, piece_color, theme.bg);
    }
}

/// Draw a shape centred in `area`, 2 columns per cell.
fn draw_mini_shape(buf: &mut Buffer, shape: &Shape, area: Rect, color: Color, bg: Color) {
    let (h, w) = shape.bounds();
    let off_x = area.width.saturating_sub(w as u16 * MINI_CELL_W) / 2;
    let off_y = area.height.saturating_sub(h as u16) / 2;
    for &(r, c) in shape.cells() {
        let x = area.x + off_x + c as u16 * MINI_CELL_W;
        let y = area.y + off_y + r as u16;
        if y >= area.y + area.height {
            continue;
        }
        for dx in 0..MINI_CELL_W {
            if x + dx >= area.x + area.width {
                continue;
            }
            if let Some(cell) = buf.cell_mut((x + dx, y)) {
                cell.set_symbol("█").set_style(Style::default().fg(color).bg(bg));
            }
        }
    }
}

fn draw_help(buf: &mut Buffer, theme: &Theme, geometry: &Geometry) {
    let text = if geometry.compact {
        "Q/E rotate  1-3 pick  R reset  Esc"
    } else {
        "Drag a piece onto the board  Q/E rotate  1-3 select  arrows+Enter place  R reset  Esc quit"
    };
    Paragraph::new(Span::styled(text, Style::default().fg(theme.inactive_fg)))
        .alignment(Alignment::Center)
        .render(geometry.help, buf);
}

fn draw_game_over(buf: &mut Buffer, state: &GameState, theme: &Theme, geometry: &Geometry) {
    let board = geometry.board_outer;
    let popup_w = 30u16.min(board.width);
    let popup_h = 6u16.min(board.height);
    let popup = Rect::new(
        board.x + board.width.saturating_sub(popup_w) / 2,
        board.y + board.height.saturating_sub(popup_h) / 2,
        popup_w,
        popup_h,
    );
    let lines = vec![
        Line::from(Span::styled(
            " Game over. No moves left. ",
            Style::default().fg(Color::White).bg(theme.danger).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", state.score),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            " R restart    Esc quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.danger).bg(theme.bg)),
        )
        .style(Style::default().bg(theme.bg))
        .render(popup, buf);
}

/// Buffer positions covered by the flashing cells.
fn flash_positions(geometry: &Geometry, cells: &[(usize, usize)]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &(r, c) in cells {
        let rect = geometry.cell_rect(r, c);
        for x in rect.x..rect.x + rect.width {
            for y in rect.y..rect.y + rect.height {
                set.insert((x, y));
            }
        }
    }
    set
}

/// Create the fade on first use, then advance it by the time since the last frame.
fn apply_clear_effect(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    geometry: &Geometry,
    clear_effect: &mut Option<Effect>,
    clear_effect_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = clear_effect_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *clear_effect_time = Some(now);

    if clear_effect.is_none() {
        let positions = flash_positions(geometry, &state.flash);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            positions.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_to(theme.empty, theme.bg, (CLEAR_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(geometry.board);
        *clear_effect = Some(effect);
    }

    if let Some(effect) = clear_effect {
        frame.render_effect(effect, geometry.board, TfxDuration::from_millis(delta_ms));
    }
}
