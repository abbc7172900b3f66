//! Swap validation and the two-click selection that feeds it.

use super::error::SwapRejection;
use super::grid::{Grid, Pos};

/// Outcome of feeding one selected cell to the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// First cell stored; waiting for a second.
    Pending(Pos),
    /// Second cell formed a valid pair. The selection is already cleared.
    Pair(Pos, Pos),
    /// Selection dropped. `None` when there was simply nothing selected to pair with.
    Cleared(Option<SwapRejection>),
}

#[derive(Debug, Clone, Default)]
pub struct SwapValidator {
    selection: Option<Pos>,
}

impl SwapValidator {
    pub fn selection(&self) -> Option<Pos> {
        self.selection
    }

    pub fn clear(&mut self) {
        self.selection = None;
    }

    /// Check a pair without touching the grid.
    pub fn validate(grid: &Grid, a: Pos, b: Pos) -> Result<(), SwapRejection> {
        for pos in [a, b] {
            if !grid.contains(pos) {
                return Err(SwapRejection::OutOfBounds(pos));
            }
        }
        if !a.is_adjacent(b) {
            return Err(SwapRejection::NotAdjacent(a, b));
        }
        for pos in [a, b] {
            if grid.get(pos).is_none() {
                return Err(SwapRejection::EmptyCell(pos));
            }
        }
        Ok(())
    }

    /// Feed one selected cell. A second cell never becomes the new selection: it either pairs or clears.
    pub fn select(&mut self, grid: &Grid, pos: Pos) -> Selection {
        if !grid.contains(pos) {
            self.selection = None;
            return Selection::Cleared(Some(SwapRejection::OutOfBounds(pos)));
        }
        match self.selection.take() {
            None => {
                if grid.get(pos).is_none() {
                    return Selection::Cleared(Some(SwapRejection::EmptyCell(pos)));
                }
                self.selection = Some(pos);
                Selection::Pending(pos)
            }
            Some(first) => match Self::validate(grid, first, pos) {
                Ok(()) => Selection::Pair(first, pos),
                Err(reason) => Selection::Cleared(Some(reason)),
            },
        }
    }

    /// Validate and perform the provisional swap.
    pub fn apply(&mut self, grid: &mut Grid, a: Pos, b: Pos) -> Result<(), SwapRejection> {
        self.selection = None;
        Self::validate(grid, a, b)?;
        grid.swap(a, b)
    }

    /// Undo a provisional swap: the same exchange issued a second time.
    pub fn revert(&mut self, grid: &mut Grid, a: Pos, b: Pos) {
        self.selection = None;
        let reverted = grid.swap(a, b);
        debug_assert!(reverted.is_ok(), "revert of an accepted swap failed: {reverted:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grid::GemKind;
    use test_log::test;

    fn grid() -> Grid {
        Grid::parse(
            "RGB
             GBR
             BRG",
        )
        .unwrap()
    }

    #[test]
    fn test_two_adjacent_clicks_form_pair() {
        let grid = grid();
        let mut v = SwapValidator::default();
        assert_eq!(v.select(&grid, Pos::new(1, 1)), Selection::Pending(Pos::new(1, 1)));
        assert_eq!(v.selection(), Some(Pos::new(1, 1)));
        assert_eq!(
            v.select(&grid, Pos::new(1, 2)),
            Selection::Pair(Pos::new(1, 1), Pos::new(1, 2))
        );
        assert_eq!(v.selection(), None);
    }

    #[test]
    fn test_non_adjacent_second_click_clears() {
        let grid = grid();
        let mut v = SwapValidator::default();
        v.select(&grid, Pos::new(0, 0));
        assert_eq!(
            v.select(&grid, Pos::new(2, 2)),
            Selection::Cleared(Some(SwapRejection::NotAdjacent(Pos::new(0, 0), Pos::new(2, 2))))
        );
        assert_eq!(v.selection(), None);

        // Clicking the same cell twice deselects it.
        v.select(&grid, Pos::new(0, 0));
        assert!(matches!(v.select(&grid, Pos::new(0, 0)), Selection::Cleared(Some(_))));
        assert_eq!(v.selection(), None);
    }

    #[test]
    fn test_out_of_bounds_click_clears() {
        let grid = grid();
        let mut v = SwapValidator::default();
        v.select(&grid, Pos::new(0, 0));
        assert_eq!(
            v.select(&grid, Pos::new(5, 0)),
            Selection::Cleared(Some(SwapRejection::OutOfBounds(Pos::new(5, 0))))
        );
        assert_eq!(v.selection(), None);
    }

    #[test]
    fn test_apply_then_revert_restores_grid() {
        let mut grid = grid();
        let before = grid.kinds();
        let mut v = SwapValidator::default();
        v.apply(&mut grid, Pos::new(2, 0), Pos::new(1, 0)).unwrap();
        assert_eq!(grid.kind_at(Pos::new(2, 0)), Some(GemKind::Green));
        v.revert(&mut grid, Pos::new(2, 0), Pos::new(1, 0));
        assert_eq!(grid.kinds(), before);
    }

    #[test]
    fn test_empty_cell_is_rejected() {
        let mut grid = grid();
        grid.take(Pos::new(0, 1));
        let mut v = SwapValidator::default();
        assert_eq!(
            v.apply(&mut grid, Pos::new(0, 0), Pos::new(0, 1)),
            Err(SwapRejection::EmptyCell(Pos::new(0, 1)))
        );
    }
}
