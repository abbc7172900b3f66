//! Engine error types: configuration problems and rejected swaps.

use super::grid::Pos;
use thiserror::Error;

/// Smallest board edge on which a run of three fits.
pub const MIN_EDGE: usize = 3;
/// Largest board edge the engine accepts.
pub const MAX_EDGE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{axis} must be between 3 and 32, got {got}")]
    Dimension { axis: &'static str, got: usize },
    #[error("gem kinds must be between 3 and 7, got {0}")]
    GemKinds(u8),
    #[error("base points must be positive")]
    BasePoints,
    #[error("{0} must be positive")]
    Timing(&'static str),
    #[error("layout has {got} cells, expected {expected}")]
    LayoutSize { got: usize, expected: usize },
    #[error("layout rows have differing widths")]
    RaggedLayout,
    #[error("unknown gem symbol {0:?}")]
    UnknownGem(char),
}

/// Why a swap request was dropped. Rejections are expected outcomes, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SwapRejection {
    #[error("cell {0} is outside the board")]
    OutOfBounds(Pos),
    #[error("cells {0} and {1} are not orthogonally adjacent")]
    NotAdjacent(Pos, Pos),
    #[error("cell {0} is empty")]
    EmptyCell(Pos),
    #[error("input is blocked while the board resolves")]
    Busy,
}
