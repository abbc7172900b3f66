//! Cascade resolution: the phase machine that turns a swap into remove, compact, refill, re-detect.

use super::clock::AnimationClock;
use super::event::EngineEvent;
use super::grid::{Gem, GemKind, Grid, Pos};
use super::matcher;
use super::score::ScoreTracker;
use super::source::GemSource;
use super::swap::SwapValidator;

/// Board regeneration gives up (keeping the last attempt) after this many tries.
pub const MAX_GENERATION_ATTEMPTS: usize = 64;

/// Resolver phase. Depth is the 1-based combo depth of the chain in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Swapping,
    Evaluating,
    Resolving(u32),
    Falling(u32),
}

/// Everything the resolver mutates during one drive, borrowed from the engine.
pub struct Board<'a, S: GemSource + ?Sized> {
    pub grid: &'a mut Grid,
    pub clock: &'a mut AnimationClock,
    pub score: &'a mut ScoreTracker,
    pub validator: &'a mut SwapValidator,
    pub source: &'a mut S,
    pub palette: &'a [GemKind],
    pub ensure_playable: bool,
}

#[derive(Debug, Clone)]
pub struct CascadeResolver {
    phase: Phase,
    depth: u32,
    pending: Option<(Pos, Pos)>,
    iterations: usize,
}

impl Default for CascadeResolver {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            depth: 0,
            pending: None,
            iterations: 0,
        }
    }
}

impl CascadeResolver {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Resolve passes run since the last swap began.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn enter(&mut self, phase: Phase) {
        log::trace!("phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// A provisional swap was applied; wait for its animation.
    pub fn begin_swap(&mut self, a: Pos, b: Pos) {
        debug_assert!(self.is_idle(), "swap accepted outside Idle");
        self.pending = Some((a, b));
        self.depth = 0;
        self.iterations = 0;
        self.enter(Phase::Swapping);
    }

    pub fn swap_landed(&mut self) {
        if self.phase == Phase::Swapping {
            self.enter(Phase::Evaluating);
        }
    }

    /// Drop all in-progress state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Run every phase that needs no further time, stopping at Idle, Swapping, or an unfinished fall.
    pub fn drive<S: GemSource + ?Sized>(
        &mut self,
        board: &mut Board<'_, S>,
        events: &mut Vec<EngineEvent>,
    ) {
        loop {
            match self.phase {
                Phase::Idle | Phase::Swapping => return,
                Phase::Falling(_) => {
                    if board.clock.is_animating() {
                        return;
                    }
                    self.enter(Phase::Evaluating);
                }
                Phase::Evaluating => self.evaluate(board, events),
                Phase::Resolving(depth) => self.resolve(board, depth, events),
            }
        }
    }

    fn evaluate<S: GemSource + ?Sized>(
        &mut self,
        board: &mut Board<'_, S>,
        events: &mut Vec<EngineEvent>,
    ) {
        debug_assert!(!board.clock.is_animating(), "detection ran on an unsettled board");
        let report = matcher::mark(board.grid);

        if report.has_match() {
            if let Some((a, b)) = self.pending.take() {
                log::debug!("swap {a} <-> {b} committed ({} runs)", report.runs.len());
                events.push(EngineEvent::SwapCommitted { a, b });
            }
            self.depth += 1;
            board.score.set_combo(self.depth);
            self.enter(Phase::Resolving(self.depth));
        } else if self.depth == 0 {
            if let Some((a, b)) = self.pending.take() {
                board.validator.revert(board.grid, a, b);
                log::debug!("swap {a} <-> {b} made no match, reverted");
                events.push(EngineEvent::SwapReverted { a, b });
            }
            board.score.reset_combo();
            self.enter(Phase::Idle);
        } else {
            let depth = self.depth;
            board.score.finish_chain();
            log::debug!(
                "cascade settled at depth {depth} after {} passes, score {}",
                self.iterations,
                board.score.score()
            );
            events.push(EngineEvent::CascadeFinished {
                depth,
                moves: board.score.moves(),
            });
            self.depth = 0;
            if board.ensure_playable && !matcher::has_legal_move(board.grid) {
                let playable = reshuffle(board);
                events.push(EngineEvent::Reshuffled { playable });
            }
            self.enter(Phase::Idle);
        }
    }

    fn resolve<S: GemSource + ?Sized>(
        &mut self,
        board: &mut Board<'_, S>,
        depth: u32,
        events: &mut Vec<EngineEvent>,
    ) {
        self.iterations += 1;
        debug_assert!(
            self.iterations <= board.grid.rows() * board.grid.cols(),
            "cascade exceeded one pass per cell"
        );

        // Effects hear about every gem before it leaves the grid.
        let matched: Vec<(GemKind, Pos)> = board
            .grid
            .gems()
            .filter(|g| g.matched)
            .map(|g| (g.kind, g.pos))
            .collect();
        for &(kind, pos) in &matched {
            events.push(EngineEvent::GemRemoved { kind, pos, depth });
        }
        let removed = remove_matched(board.grid);
        debug_assert_eq!(removed.len(), matched.len());

        let delta = board.score.award(removed.len(), depth);
        if let Some(&(_, origin)) = removed.first() {
            events.push(EngineEvent::ScoreAwarded {
                delta,
                depth,
                gems: removed.len(),
                origin,
            });
        }

        let moved = compact(board.grid);
        let spawned = refill(board.grid, board.source, board.palette);
        board.clock.track_falls(board.grid);
        log::debug!(
            "depth {depth}: removed {}, moved {moved}, spawned {spawned}, +{delta}",
            removed.len()
        );
        self.enter(Phase::Falling(depth));
    }
}

/// Take every matched gem off the grid. Returns what was removed, row-major.
pub fn remove_matched(grid: &mut Grid) -> Vec<(GemKind, Pos)> {
    let mut removed = Vec::new();
    for pos in grid.positions() {
        if grid.get(pos).is_some_and(|g| g.matched) {
            if let Some(gem) = grid.take(pos) {
                removed.push((gem.kind, pos));
            }
        }
    }
    removed
}

/// Gravity: per column, stack surviving gems against the bottom in their original order.
/// Every gem that changes row is tagged falling from its old slot. Returns how many moved.
pub fn compact(grid: &mut Grid) -> usize {
    let mut moved = 0;
    for col in 0..grid.cols() {
        let mut write = grid.rows();
        for row in (0..grid.rows()).rev() {
            let Some(mut gem) = grid.take(Pos::new(row, col)) else {
                continue;
            };
            write -= 1;
            if write != row {
                gem.begin_fall(row as f32);
                moved += 1;
            }
            grid.set(Pos::new(write, col), Some(gem));
        }
    }
    moved
}

/// Fill the empty top slots of every column with new gems that drop in from above the board.
pub fn refill<S: GemSource + ?Sized>(grid: &mut Grid, source: &mut S, palette: &[GemKind]) -> usize {
    let mut spawned = 0;
    for col in 0..grid.cols() {
        let empty = (0..grid.rows())
            .filter(|&row| grid.get(Pos::new(row, col)).is_none())
            .count();
        let mut fill = 0;
        for row in 0..grid.rows() {
            let pos = Pos::new(row, col);
            if grid.get(pos).is_some() {
                continue;
            }
            let kind = source.next_gem(palette);
            let start = fill as f32 - empty as f32;
            grid.set(pos, Some(Gem::spawned(kind, pos, start)));
            fill += 1;
            spawned += 1;
        }
    }
    spawned
}

/// Kinds that would complete a run of three with the two cells to the left or the two above.
fn forbidden_kinds(grid: &Grid, pos: Pos) -> [Option<GemKind>; 2] {
    let pair = |a: Option<Pos>, b: Option<Pos>| {
        let ka = a.and_then(|p| grid.kind_at(p))?;
        let kb = b.and_then(|p| grid.kind_at(p))?;
        (ka == kb).then_some(ka)
    };
    [
        pair(pos.offset(0, -1), pos.offset(0, -2)),
        pair(pos.offset(-1, 0), pos.offset(-2, 0)),
    ]
}

/// Fill the whole grid with settled gems so that no run exists and, when `ensure_playable`,
/// at least one legal move does. Returns false if the attempts ran out.
pub fn populate<S: GemSource + ?Sized>(
    grid: &mut Grid,
    source: &mut S,
    palette: &[GemKind],
    ensure_playable: bool,
) -> bool {
    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        for pos in grid.positions() {
            let forbidden = forbidden_kinds(grid, pos);
            let allowed: Vec<GemKind> = palette
                .iter()
                .copied()
                .filter(|k| !forbidden.contains(&Some(*k)))
                .collect();
            let choices = if allowed.is_empty() { palette } else { &allowed };
            let kind = source.next_gem(choices);
            grid.set(pos, Some(Gem::settled(kind, pos)));
        }

        if !matcher::scan(grid).is_empty() {
            log::debug!("generated board {attempt} has a run, retrying");
            continue;
        }
        if !ensure_playable || matcher::has_legal_move(grid) {
            return true;
        }
        log::debug!("generated board {attempt} has no legal move, retrying");
    }
    log::warn!("no playable board after {MAX_GENERATION_ATTEMPTS} attempts, keeping the last one");
    false
}

/// Regenerate a dead board in place; the new gems pop in.
fn reshuffle<S: GemSource + ?Sized>(board: &mut Board<'_, S>) -> bool {
    let playable = populate(board.grid, board.source, board.palette, true);
    for gem in board.grid.gems_mut() {
        gem.scale = 0.0;
        gem.just_spawned = true;
    }
    board.clock.track_falls(board.grid);
    log::debug!("board had no legal move, reshuffled (playable: {playable})");
    playable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::source::ScriptedSource;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use test_log::test;

    #[test]
    fn test_compact_preserves_column_order() {
        let mut grid = Grid::parse(
            "RG
             BY
             PO
             WR",
        )
        .unwrap();
        grid.take(Pos::new(1, 0));
        grid.take(Pos::new(3, 0));
        let moved = compact(&mut grid);

        assert_eq!(grid.column_kinds(0), vec![
            None,
            None,
            Some(GemKind::Red),
            Some(GemKind::Purple)
        ]);
        // R moved 0 -> 2, P moved 2 -> 3; column 1 untouched.
        assert_eq!(moved, 2);
        let red = grid.get(Pos::new(2, 0)).unwrap();
        assert!(red.falling);
        assert_eq!(red.visual_row, 0.0);
        assert!(grid.gems().filter(|g| g.pos.col == 1).all(|g| !g.falling));
    }

    #[test]
    fn test_refill_leaves_no_gaps() {
        let mut grid = Grid::parse(
            "RGB
             GBR
             BRG",
        )
        .unwrap();
        grid.take(Pos::new(2, 1));
        grid.take(Pos::new(1, 1));
        compact(&mut grid);
        let mut source = ScriptedSource::new([GemKind::Yellow, GemKind::Purple], 0);
        let spawned = refill(&mut grid, &mut source, GemKind::palette(5));

        assert_eq!(spawned, 2);
        assert!(grid.is_full());
        let top = grid.get(Pos::new(0, 1)).unwrap();
        let second = grid.get(Pos::new(1, 1)).unwrap();
        assert_eq!((top.kind, top.visual_row), (GemKind::Yellow, -2.0));
        assert_eq!((second.kind, second.visual_row), (GemKind::Purple, -1.0));
        assert!(top.falling && top.just_spawned && top.scale == 0.0);
        // The surviving G dropped from row 0 to row 2.
        let survivor = grid.get(Pos::new(2, 1)).unwrap();
        assert_eq!(survivor.kind, GemKind::Green);
        assert!(survivor.falling);
    }

    #[test]
    fn test_remove_matched_takes_only_flagged() {
        let mut grid = Grid::parse(
            "RRRG
             GBYB",
        )
        .unwrap();
        matcher::mark(&mut grid);
        let removed = remove_matched(&mut grid);
        assert_eq!(removed, vec![
            (GemKind::Red, Pos::new(0, 0)),
            (GemKind::Red, Pos::new(0, 1)),
            (GemKind::Red, Pos::new(0, 2)),
        ]);
        assert!(grid.get(Pos::new(0, 3)).is_some());
    }

    #[test]
    fn test_populate_has_no_runs_and_a_move() {
        for seed in 0..20 {
            let mut grid = Grid::empty(8, 8);
            let mut rng = SmallRng::seed_from_u64(seed);
            assert!(populate(&mut grid, &mut rng, GemKind::palette(5), true));
            assert!(grid.is_full());
            assert!(matcher::scan(&grid).is_empty(), "seed {seed} produced a run");
            assert!(matcher::has_legal_move(&grid), "seed {seed} is dead");
        }
    }

    #[test]
    fn test_populate_with_three_kinds() {
        let mut grid = Grid::empty(6, 6);
        let mut rng = SmallRng::seed_from_u64(3);
        populate(&mut grid, &mut rng, GemKind::palette(3), true);
        assert!(matcher::scan(&grid).is_empty());
    }
}
