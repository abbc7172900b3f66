//! The match-3 engine: grid, match detection, swap validation, cascade resolution, scoring and
//! animation pacing, behind a single [`Engine`] facade.
//!
//! The engine is frame-stepped. The front-end feeds it selections, calls [`Engine::step`] once
//! per frame with the elapsed time, and draws from [`Engine::snapshot`].

pub mod cascade;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod grid;
pub mod matcher;
pub mod score;
pub mod snapshot;
pub mod source;
pub mod swap;

pub use cascade::Phase;
pub use config::EngineConfig;
pub use error::{EngineError, SwapRejection};
pub use event::{EngineEvent, SelectOutcome};
pub use grid::{Gem, GemKind, Grid, Pos};
pub use score::SessionSummary;
pub use snapshot::{CellView, GridView, SwapView};
pub use source::{GemSource, ScriptedSource};

use cascade::{Board, CascadeResolver};
use clock::AnimationClock;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use score::ScoreTracker;
use std::time::Duration;
use swap::{Selection, SwapValidator};

pub struct Engine<S: GemSource = SmallRng> {
    config: EngineConfig,
    palette: &'static [GemKind],
    grid: Grid,
    validator: SwapValidator,
    resolver: CascadeResolver,
    score: ScoreTracker,
    clock: AnimationClock,
    source: S,
    /// Events raised by input calls, handed out with the next `step`.
    events: Vec<EngineEvent>,
}

impl Engine<SmallRng> {
    /// A freshly generated board driven by a seeded generator.
    pub fn new(config: EngineConfig, seed: u64) -> Result<Self, EngineError> {
        Self::with_source(config, SmallRng::seed_from_u64(seed))
    }
}

impl<S: GemSource> Engine<S> {
    pub fn with_source(config: EngineConfig, mut source: S) -> Result<Self, EngineError> {
        config.validate()?;
        let palette = GemKind::palette(config.gem_kinds);
        let mut grid = Grid::empty(config.rows, config.cols);
        let playable = cascade::populate(&mut grid, &mut source, palette, config.ensure_playable);
        log::debug!(
            "generated {}x{} board with {} kinds (playable: {playable})",
            config.rows,
            config.cols,
            config.gem_kinds
        );
        Ok(Self::assemble(config, grid, source))
    }

    /// Start from a fixed layout, used as-is. Board dimensions come from the grid.
    pub fn from_grid(config: EngineConfig, grid: Grid, source: S) -> Result<Self, EngineError> {
        let config = EngineConfig {
            rows: grid.rows(),
            cols: grid.cols(),
            ..config
        };
        config.validate()?;
        Ok(Self::assemble(config, grid, source))
    }

    fn assemble(config: EngineConfig, grid: Grid, source: S) -> Self {
        Self {
            palette: GemKind::palette(config.gem_kinds),
            clock: AnimationClock::new(&config),
            score: ScoreTracker::new(config.base_points),
            validator: SwapValidator::default(),
            resolver: CascadeResolver::default(),
            events: Vec::new(),
            config,
            grid,
            source,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn phase(&self) -> Phase {
        self.resolver.phase()
    }

    /// Input is accepted only while idle with nothing in flight.
    pub fn is_input_enabled(&self) -> bool {
        self.resolver.is_idle() && !self.clock.is_animating()
    }

    pub fn summary(&self) -> SessionSummary {
        self.score.summary()
    }

    /// Resolve passes run by the most recent swap.
    pub fn last_cascade_passes(&self) -> usize {
        self.resolver.iterations()
    }

    /// Feed one clicked cell through the two-click selection.
    pub fn select(&mut self, pos: Pos) -> SelectOutcome {
        if !self.is_input_enabled() {
            log::trace!("select {pos} ignored in {:?}", self.phase());
            return SelectOutcome::Ignored;
        }
        match self.validator.select(&self.grid, pos) {
            Selection::Pending(pos) => {
                self.events.push(EngineEvent::Selected(pos));
                SelectOutcome::Selected(pos)
            }
            Selection::Pair(a, b) => match self.start_swap(a, b) {
                Ok(()) => SelectOutcome::SwapStarted(a, b),
                Err(reason) => SelectOutcome::Deselected(Some(reason)),
            },
            Selection::Cleared(reason) => {
                if let Some(reason) = reason {
                    log::debug!("selection cleared: {reason}");
                    self.events.push(EngineEvent::SwapRejected(reason));
                }
                self.events.push(EngineEvent::SelectionCleared);
                SelectOutcome::Deselected(reason)
            }
        }
    }

    /// Ask for a swap directly, bypassing the selection.
    pub fn request_swap(&mut self, a: Pos, b: Pos) -> Result<(), SwapRejection> {
        if !self.is_input_enabled() {
            log::debug!("swap {a} <-> {b} rejected: busy in {:?}", self.phase());
            self.events.push(EngineEvent::SwapRejected(SwapRejection::Busy));
            return Err(SwapRejection::Busy);
        }
        self.start_swap(a, b)
    }

    fn start_swap(&mut self, a: Pos, b: Pos) -> Result<(), SwapRejection> {
        if let Err(reason) = self.validator.apply(&mut self.grid, a, b) {
            log::debug!("swap {a} <-> {b} rejected: {reason}");
            self.events.push(EngineEvent::SwapRejected(reason));
            return Err(reason);
        }
        log::debug!("swap {a} <-> {b} started");
        self.clock.start_swap(a, b);
        self.resolver.begin_swap(a, b);
        self.events.push(EngineEvent::SwapStarted { a, b });
        Ok(())
    }

    /// Advance by `dt` of real time. Logic runs once per fixed tick, interleaved with animation.
    pub fn step(&mut self, dt: Duration) -> Vec<EngineEvent> {
        let mut events = std::mem::take(&mut self.events);
        for _ in 0..self.clock.accumulate(dt) {
            let report = self.clock.tick(&mut self.grid);
            if report.swap_finished.is_some() {
                self.resolver.swap_landed();
            }
            let mut board = Board {
                grid: &mut self.grid,
                clock: &mut self.clock,
                score: &mut self.score,
                validator: &mut self.validator,
                source: &mut self.source,
                palette: self.palette,
                ensure_playable: self.config.ensure_playable,
            };
            self.resolver.drive(&mut board, &mut events);
        }
        events
    }

    pub fn snapshot(&self) -> GridView {
        let cells = self
            .grid
            .positions()
            .map(|pos| {
                self.grid.get(pos).map(|gem| CellView {
                    kind: gem.kind,
                    pos,
                    visual_row: gem.visual_row,
                    scale: gem.scale,
                    falling: gem.falling,
                    just_spawned: gem.just_spawned,
                })
            })
            .collect();
        GridView {
            rows: self.grid.rows(),
            cols: self.grid.cols(),
            cells,
            selection: self.validator.selection(),
            swap: self.clock.swap().map(|s| SwapView {
                a: s.a,
                b: s.b,
                progress: s.progress(),
            }),
            phase: self.phase(),
            input_enabled: self.is_input_enabled(),
            score: self.score.score(),
            combo: self.score.combo(),
            max_combo: self.score.max_combo(),
            moves: self.score.moves(),
        }
    }

    /// A swap that would match, when input is open.
    pub fn hint(&self) -> Option<(Pos, Pos)> {
        if !self.is_input_enabled() {
            return None;
        }
        matcher::find_legal_move(&self.grid)
    }

    /// Drop whatever is in flight and hand back the session totals.
    pub fn abort(&mut self) -> SessionSummary {
        self.resolver.reset();
        self.clock.reset(&mut self.grid);
        self.validator.clear();
        self.score.reset_combo();
        self.events.clear();
        let summary = self.score.summary();
        log::debug!(
            "session aborted: score {}, best combo {}, moves {}",
            summary.score,
            summary.max_combo,
            summary.moves
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn config() -> EngineConfig {
        EngineConfig {
            ensure_playable: false,
            ..EngineConfig::default()
        }
    }

    fn engine(layout: &str, script: &[GemKind]) -> Engine<ScriptedSource> {
        let grid = Grid::parse(layout).unwrap();
        Engine::from_grid(config(), grid, ScriptedSource::new(script.iter().copied(), 7)).unwrap()
    }

    fn run_until_idle<S: GemSource>(engine: &mut Engine<S>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        for _ in 0..600 {
            events.extend(engine.step(clock::TICK));
            if engine.is_input_enabled() {
                return events;
            }
        }
        panic!("engine never settled");
    }

    const QUIET: &str = "RGBR
                         GRYG
                         BYRB
                         YBGY";

    #[test]
    fn test_non_matching_swap_reverts() {
        let mut engine = engine(QUIET, &[]);
        let before = engine.grid().kinds();

        assert_eq!(engine.select(Pos::new(0, 0)), SelectOutcome::Selected(Pos::new(0, 0)));
        assert_eq!(
            engine.select(Pos::new(0, 1)),
            SelectOutcome::SwapStarted(Pos::new(0, 0), Pos::new(0, 1))
        );
        assert_eq!(engine.phase(), Phase::Swapping);
        assert_eq!(engine.select(Pos::new(2, 2)), SelectOutcome::Ignored);

        let events = run_until_idle(&mut engine);
        assert!(events.contains(&EngineEvent::SwapReverted {
            a: Pos::new(0, 0),
            b: Pos::new(0, 1)
        }));
        assert_eq!(engine.grid().kinds(), before);
        assert_eq!(engine.summary(), SessionSummary::default());
    }

    #[test]
    fn test_matching_swap_scores_and_refills() {
        let mut engine = engine(
            "RRGR
             GBYB
             BYBG
             YGRY",
            &[GemKind::Yellow, GemKind::Purple, GemKind::Orange],
        );
        engine.request_swap(Pos::new(0, 2), Pos::new(0, 3)).unwrap();
        assert_eq!(
            engine.request_swap(Pos::new(1, 0), Pos::new(1, 1)),
            Err(SwapRejection::Busy)
        );

        let events = run_until_idle(&mut engine);
        assert!(events.contains(&EngineEvent::SwapCommitted {
            a: Pos::new(0, 2),
            b: Pos::new(0, 3)
        }));
        let removed = events
            .iter()
            .filter(|e| matches!(e, EngineEvent::GemRemoved { depth: 1, .. }))
            .count();
        assert_eq!(removed, 3);
        assert!(events.contains(&EngineEvent::ScoreAwarded {
            delta: 30,
            depth: 1,
            gems: 3,
            origin: Pos::new(0, 0)
        }));
        assert!(events.contains(&EngineEvent::CascadeFinished { depth: 1, moves: 1 }));

        let view = engine.snapshot();
        assert_eq!(view.score, 30);
        assert_eq!(view.moves, 1);
        assert_eq!(view.max_combo, 1);
        assert_eq!(view.combo, 0);
        assert_eq!(view.cell(Pos::new(0, 1)).map(|c| c.kind), Some(GemKind::Purple));
        assert_eq!(view.cell(Pos::new(0, 3)).map(|c| c.kind), Some(GemKind::Green));
        assert!(engine.grid().is_full());
    }

    #[test]
    fn test_rejections_clear_selection() {
        let mut engine = engine(QUIET, &[]);
        engine.select(Pos::new(0, 0));
        assert_eq!(
            engine.select(Pos::new(3, 3)),
            SelectOutcome::Deselected(Some(SwapRejection::NotAdjacent(
                Pos::new(0, 0),
                Pos::new(3, 3)
            )))
        );
        assert_eq!(engine.snapshot().selection, None);
        let events = engine.step(Duration::ZERO);
        assert!(events.contains(&EngineEvent::SelectionCleared));
        assert_eq!(
            engine.request_swap(Pos::new(3, 3), Pos::new(3, 4)),
            Err(SwapRejection::OutOfBounds(Pos::new(3, 4)))
        );
    }

    #[test]
    fn test_abort_settles_mid_cascade() {
        let mut engine = engine(
            "RRGR
             GBYB
             BYBG
             YGRY",
            &[GemKind::Yellow, GemKind::Purple, GemKind::Orange],
        );
        engine.request_swap(Pos::new(0, 2), Pos::new(0, 3)).unwrap();
        // Swap lands after 12 ticks; refilled gems are still falling after 14.
        for _ in 0..14 {
            engine.step(clock::TICK);
        }
        assert!(matches!(engine.phase(), Phase::Falling(1)));

        let summary = engine.abort();
        assert_eq!(summary.score, 30);
        assert_eq!(engine.phase(), Phase::Idle);
        assert!(engine.is_input_enabled());
        assert!(engine.grid().gems().all(|g| !g.falling));
        assert!(engine.step(Duration::ZERO).is_empty());
    }

    #[test]
    fn test_hint_points_at_a_match() {
        let engine = engine(
            "RRGR
             GBYB
             BYBG
             YGRY",
            &[],
        );
        let (a, b) = engine.hint().unwrap();
        let mut grid = engine.grid().clone();
        grid.swap(a, b).unwrap();
        assert!(!matcher::scan(&grid).is_empty());
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = EngineConfig {
            rows: 2,
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::new(config, 1),
            Err(EngineError::Dimension { axis: "rows", got: 2 })
        ));
    }

    #[test]
    fn test_seeded_sessions_repeat() {
        let a = Engine::new(EngineConfig::default(), 42).unwrap();
        let b = Engine::new(EngineConfig::default(), 42).unwrap();
        assert_eq!(a.grid().kinds(), b.grid().kinds());
    }
}
