//! Events emitted by the engine for the input, render and effects layers.

use super::error::SwapRejection;
use super::grid::{GemKind, Pos};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    Selected(Pos),
    SelectionCleared,
    SwapRejected(SwapRejection),
    SwapStarted { a: Pos, b: Pos },
    /// The first evaluation after a swap found a match; the swap stands.
    SwapCommitted { a: Pos, b: Pos },
    /// The swap produced no match and was undone.
    SwapReverted { a: Pos, b: Pos },
    /// Sent for every gem just before it leaves the grid.
    GemRemoved { kind: GemKind, pos: Pos, depth: u32 },
    /// One resolved cascade step. `origin` is the first removed cell, row-major.
    ScoreAwarded {
        delta: u32,
        depth: u32,
        gems: usize,
        origin: Pos,
    },
    /// The board settled with no further match.
    CascadeFinished { depth: u32, moves: u32 },
    /// The settled board had no legal move and was regenerated.
    Reshuffled { playable: bool },
}

/// What a `select` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Dropped because the engine is not idle.
    Ignored,
    Selected(Pos),
    Deselected(Option<SwapRejection>),
    SwapStarted(Pos, Pos),
}
