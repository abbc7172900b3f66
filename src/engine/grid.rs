//! Grid state: the authoritative rows x cols matrix of gems.

use super::error::{EngineError, SwapRejection};
use std::fmt;

/// Cell coordinate. Row 0 is the top of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    #[inline]
    pub fn manhattan(self, other: Self) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    #[inline]
    pub fn is_adjacent(self, other: Self) -> bool {
        self.manhattan(other) == 1
    }

    /// Neighbour in the given direction, if it does not underflow. Upper bounds are the grid's job.
    pub fn offset(self, d_row: isize, d_col: isize) -> Option<Self> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        Some(Self { row, col })
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Gem kinds. A session plays with the first `gem_kinds` of [`GemKind::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GemKind {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Orange,
    White,
}

impl GemKind {
    pub const ALL: [Self; 7] = [
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::Yellow,
        Self::Purple,
        Self::Orange,
        Self::White,
    ];

    /// Palette of the first `count` kinds (clamped to 1..=7).
    pub fn palette(count: u8) -> &'static [Self] {
        &Self::ALL[..(count as usize).clamp(1, Self::ALL.len())]
    }

    /// Index 0..7, used by the theme for colours.
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Red => 'R',
            Self::Green => 'G',
            Self::Blue => 'B',
            Self::Yellow => 'Y',
            Self::Purple => 'P',
            Self::Orange => 'O',
            Self::White => 'W',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_char() == c.to_ascii_uppercase())
    }
}

/// One gem record. Animation state lives here rather than in a side table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gem {
    pub kind: GemKind,
    /// Logical slot; rewritten by [`Grid::set`] and [`Grid::swap`].
    pub pos: Pos,
    /// Continuous row used for fall interpolation. Equals `pos.row` once settled.
    pub visual_row: f32,
    pub matched: bool,
    pub falling: bool,
    pub just_spawned: bool,
    /// Pop-in factor 0..=1, purely presentational.
    pub scale: f32,
}

impl Gem {
    /// A resting gem at full scale.
    pub fn settled(kind: GemKind, pos: Pos) -> Self {
        Self {
            kind,
            pos,
            visual_row: pos.row as f32,
            matched: false,
            falling: false,
            just_spawned: false,
            scale: 1.0,
        }
    }

    /// A freshly created gem that drops in from `start_row` (negative = above the board).
    pub fn spawned(kind: GemKind, pos: Pos, start_row: f32) -> Self {
        Self {
            kind,
            pos,
            visual_row: start_row,
            matched: false,
            falling: true,
            just_spawned: true,
            scale: 0.0,
        }
    }

    /// Tag the gem as falling from its previous visual slot toward its logical row.
    pub fn begin_fall(&mut self, from_row: f32) {
        debug_assert!(!self.matched, "matched gem {} cannot fall", self.pos);
        self.visual_row = from_row;
        self.falling = true;
    }

    pub fn settle(&mut self) {
        self.visual_row = self.pos.row as f32;
        self.falling = false;
    }
}

/// Fixed-size board. Cells are stored row-major in a single arena; the grid is the only owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<Gem>>,
}

impl Grid {
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    /// Settled board from a row-major kind list.
    pub fn from_kinds(rows: usize, cols: usize, kinds: &[GemKind]) -> Result<Self, EngineError> {
        if kinds.len() != rows * cols {
            return Err(EngineError::LayoutSize {
                got: kinds.len(),
                expected: rows * cols,
            });
        }
        let mut grid = Self::empty(rows, cols);
        for (i, &kind) in kinds.iter().enumerate() {
            let pos = Pos::new(i / cols, i % cols);
            grid.set(pos, Some(Gem::settled(kind, pos)));
        }
        Ok(grid)
    }

    /// Parse a layout of gem letters (`R G B Y P O W`), one line per row.
    /// Whitespace inside a line is ignored, blank lines are skipped.
    pub fn parse(layout: &str) -> Result<Self, EngineError> {
        let mut kinds = Vec::new();
        let mut cols = None;
        let mut rows = 0;
        for line in layout.lines() {
            let row: Vec<GemKind> = line
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| GemKind::from_char(c).ok_or(EngineError::UnknownGem(c)))
                .collect::<Result<_, _>>()?;
            if row.is_empty() {
                continue;
            }
            match cols {
                None => cols = Some(row.len()),
                Some(w) if w != row.len() => return Err(EngineError::RaggedLayout),
                Some(_) => {}
            }
            kinds.extend(row);
            rows += 1;
        }
        Self::from_kinds(rows, cols.unwrap_or(0), &kinds)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    #[inline]
    fn index(&self, pos: Pos) -> Option<usize> {
        self.contains(pos).then(|| pos.row * self.cols + pos.col)
    }

    /// Current occupant, or `None` for an empty or out-of-bounds cell.
    #[inline]
    pub fn get(&self, pos: Pos) -> Option<&Gem> {
        self.index(pos).and_then(|i| self.cells[i].as_ref())
    }

    #[inline]
    pub fn get_mut(&mut self, pos: Pos) -> Option<&mut Gem> {
        self.index(pos).and_then(|i| self.cells[i].as_mut())
    }

    #[inline]
    pub fn kind_at(&self, pos: Pos) -> Option<GemKind> {
        self.get(pos).map(|g| g.kind)
    }

    /// Replace a slot. Returns false (and does nothing) when `pos` is out of bounds.
    pub fn set(&mut self, pos: Pos, gem: Option<Gem>) -> bool {
        let Some(i) = self.index(pos) else {
            return false;
        };
        self.cells[i] = gem.map(|mut g| {
            g.pos = pos;
            g
        });
        true
    }

    /// Remove and return the occupant of a slot.
    pub fn take(&mut self, pos: Pos) -> Option<Gem> {
        let i = self.index(pos)?;
        self.cells[i].take()
    }

    /// Exchange the contents of two orthogonally adjacent cells.
    pub fn swap(&mut self, a: Pos, b: Pos) -> Result<(), SwapRejection> {
        let ia = self.index(a).ok_or(SwapRejection::OutOfBounds(a))?;
        let ib = self.index(b).ok_or(SwapRejection::OutOfBounds(b))?;
        if !a.is_adjacent(b) {
            return Err(SwapRejection::NotAdjacent(a, b));
        }
        self.cells.swap(ia, ib);
        for (i, pos) in [(ia, a), (ib, b)] {
            if let Some(gem) = self.cells[i].as_mut() {
                gem.pos = pos;
                if !gem.falling {
                    gem.visual_row = pos.row as f32;
                }
            }
        }
        Ok(())
    }

    /// Row-major kind snapshot; `None` for empty cells.
    pub fn kinds(&self) -> Vec<Option<GemKind>> {
        self.cells.iter().map(|c| c.map(|g| g.kind)).collect()
    }

    /// Kinds of one column from top to bottom.
    pub fn column_kinds(&self, col: usize) -> Vec<Option<GemKind>> {
        (0..self.rows)
            .map(|row| self.kind_at(Pos::new(row, col)))
            .collect()
    }

    /// Every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let cols = self.cols;
        (0..self.rows * cols).map(move |i| Pos::new(i / cols, i % cols))
    }

    pub fn gems(&self) -> impl Iterator<Item = &Gem> {
        self.cells.iter().flatten()
    }

    pub fn gems_mut(&mut self) -> impl Iterator<Item = &mut Gem> {
        self.cells.iter_mut().flatten()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn falling_count(&self) -> usize {
        self.gems().filter(|g| g.falling).count()
    }
}
