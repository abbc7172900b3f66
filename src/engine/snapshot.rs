//! Read-only view of the engine for the renderer.

use super::cascade::Phase;
use super::grid::{GemKind, Pos};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellView {
    pub kind: GemKind,
    pub pos: Pos,
    /// Row to draw at; fractional while falling.
    pub visual_row: f32,
    pub scale: f32,
    pub falling: bool,
    pub just_spawned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapView {
    pub a: Pos,
    pub b: Pos,
    /// 0 at the start of the swap, 1 when it lands.
    pub progress: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridView {
    pub rows: usize,
    pub cols: usize,
    /// Row-major, `None` for an empty slot.
    pub cells: Vec<Option<CellView>>,
    pub selection: Option<Pos>,
    pub swap: Option<SwapView>,
    pub phase: Phase,
    pub input_enabled: bool,
    pub score: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub moves: u32,
}

impl GridView {
    pub fn cell(&self, pos: Pos) -> Option<&CellView> {
        if pos.row >= self.rows || pos.col >= self.cols {
            return None;
        }
        self.cells[pos.row * self.cols + pos.col].as_ref()
    }

    /// Horizontal and vertical draw offsets, in cells, for a gem mid-swap.
    /// The grid already holds the swapped contents, so each gem slides in from its partner's slot.
    pub fn swap_offset(&self, pos: Pos) -> (f32, f32) {
        let Some(swap) = self.swap else {
            return (0.0, 0.0);
        };
        let from = if pos == swap.a {
            swap.b
        } else if pos == swap.b {
            swap.a
        } else {
            return (0.0, 0.0);
        };
        let remaining = 1.0 - swap.progress;
        (
            (from.row as f32 - pos.row as f32) * remaining,
            (from.col as f32 - pos.col as f32) * remaining,
        )
    }
}
