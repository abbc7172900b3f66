//! Match detection: maximal runs of three or more same-kind gems, rows then columns.

use super::grid::{GemKind, Grid, Pos};

/// Minimum run length that counts as a match.
pub const MIN_RUN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// A maximal run of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub kind: GemKind,
    pub axis: Axis,
    pub start: Pos,
    pub len: usize,
}

impl Run {
    pub fn cells(&self) -> impl Iterator<Item = Pos> + use<> {
        let Run {
            axis, start, len, ..
        } = *self;
        (0..len).map(move |i| match axis {
            Axis::Horizontal => Pos::new(start.row, start.col + i),
            Axis::Vertical => Pos::new(start.row + i, start.col),
        })
    }
}

/// Result of one marking pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchReport {
    pub runs: Vec<Run>,
    /// Union of run cells, row-major, each cell once.
    pub cells: Vec<Pos>,
    /// Cells whose `matched` flag went from false to true in this pass.
    pub newly_marked: usize,
}

impl MatchReport {
    pub fn has_match(&self) -> bool {
        !self.runs.is_empty()
    }
}

/// Every maximal run on the board. Rows are scanned left to right, then columns top to bottom.
pub fn scan(grid: &Grid) -> Vec<Run> {
    let mut runs = Vec::new();
    for row in 0..grid.rows() {
        collect_runs(grid.cols(), |i| grid.kind_at(Pos::new(row, i)), |start, len, kind| {
            runs.push(Run {
                kind,
                axis: Axis::Horizontal,
                start: Pos::new(row, start),
                len,
            });
        });
    }
    for col in 0..grid.cols() {
        collect_runs(grid.rows(), |i| grid.kind_at(Pos::new(i, col)), |start, len, kind| {
            runs.push(Run {
                kind,
                axis: Axis::Vertical,
                start: Pos::new(start, col),
                len,
            });
        });
    }
    runs
}

fn collect_runs(
    len: usize,
    kind_at: impl Fn(usize) -> Option<GemKind>,
    mut emit: impl FnMut(usize, usize, GemKind),
) {
    let mut i = 0;
    while i < len {
        let Some(kind) = kind_at(i) else {
            i += 1;
            continue;
        };
        let mut end = i + 1;
        while end < len && kind_at(end) == Some(kind) {
            end += 1;
        }
        if end - i >= MIN_RUN {
            emit(i, end - i, kind);
        }
        i = end;
    }
}

/// Scan and flag every run cell as `matched`.
pub fn mark(grid: &mut Grid) -> MatchReport {
    let runs = scan(grid);
    let mut cells: Vec<Pos> = runs.iter().flat_map(Run::cells).collect();
    cells.sort_unstable();
    cells.dedup();

    let mut newly_marked = 0;
    for &pos in &cells {
        if let Some(gem) = grid.get_mut(pos) {
            debug_assert!(!gem.falling, "gem {pos} matched while still falling");
            if !gem.matched {
                gem.matched = true;
                newly_marked += 1;
            }
        }
    }
    MatchReport {
        runs,
        cells,
        newly_marked,
    }
}

/// First adjacent swap (scanning row-major, right neighbour before down neighbour) that would form a run.
pub fn find_legal_move(grid: &Grid) -> Option<(Pos, Pos)> {
    let rows = grid.rows();
    let cols = grid.cols();
    let mut kinds = grid.kinds();
    let at = |kinds: &[Option<GemKind>], r: usize, c: usize| kinds[r * cols + c];

    let forms_run = |kinds: &[Option<GemKind>], pos: Pos| -> bool {
        let Some(kind) = at(kinds, pos.row, pos.col) else {
            return false;
        };
        let same = |r: usize, c: usize| at(kinds, r, c) == Some(kind);
        let left = (0..pos.col).rev().take_while(|&c| same(pos.row, c)).count();
        let right = (pos.col + 1..cols).take_while(|&c| same(pos.row, c)).count();
        let up = (0..pos.row).rev().take_while(|&r| same(r, pos.col)).count();
        let down = (pos.row + 1..rows).take_while(|&r| same(r, pos.col)).count();
        left + right + 1 >= MIN_RUN || up + down + 1 >= MIN_RUN
    };

    for row in 0..rows {
        for col in 0..cols {
            let a = Pos::new(row, col);
            for b in [Pos::new(row, col + 1), Pos::new(row + 1, col)] {
                if !grid.contains(b) {
                    continue;
                }
                let (ia, ib) = (row * cols + col, b.row * cols + b.col);
                if kinds[ia].is_none() || kinds[ib].is_none() || kinds[ia] == kinds[ib] {
                    continue;
                }
                kinds.swap(ia, ib);
                let found = forms_run(&kinds, a) || forms_run(&kinds, b);
                kinds.swap(ia, ib);
                if found {
                    return Some((a, b));
                }
            }
        }
    }
    None
}

pub fn has_legal_move(grid: &Grid) -> bool {
    find_legal_move(grid).is_some()
}
