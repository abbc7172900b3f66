//! Gem sources: where fill and refill kinds come from.
//!
//! The engine never touches ambient randomness; a source is handed to the constructor so a
//! seeded generator (or a fixed script) reproduces a session exactly.

use super::grid::GemKind;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Picks the kind of every newly created gem.
pub trait GemSource {
    /// Next kind, drawn from `palette` (never empty).
    fn next_gem(&mut self, palette: &[GemKind]) -> GemKind;
}

impl<R: Rng + ?Sized> GemSource for R {
    fn next_gem(&mut self, palette: &[GemKind]) -> GemKind {
        palette[self.gen_range(0..palette.len())]
    }
}

/// Replays a fixed sequence of kinds, then falls back to a seeded generator.
///
/// Scripted kinds are returned as-is even when they are outside the palette, which lets a
/// test force a specific refill.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    script: VecDeque<GemKind>,
    fallback: SmallRng,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = GemKind>, seed: u64) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback: SmallRng::seed_from_u64(seed),
        }
    }
}

impl GemSource for ScriptedSource {
    fn next_gem(&mut self, palette: &[GemKind]) -> GemKind {
        match self.script.pop_front() {
            Some(kind) => kind,
            None => self.fallback.next_gem(palette),
        }
    }
}
