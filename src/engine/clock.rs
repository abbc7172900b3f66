//! Animation clock: fixed-timestep pacing of swaps, falls and pop-in.

use super::config::EngineConfig;
use super::grid::{Grid, Pos};
use std::time::Duration;

pub const TICKS_PER_SECOND: u32 = 60;
/// One logical step.
pub const TICK: Duration = Duration::from_nanos(1_000_000_000 / TICKS_PER_SECOND as u64);
/// Upper bound on ticks run for one `step`, so a stalled frame cannot spiral.
const MAX_CATCH_UP_TICKS: u32 = 30;

/// An in-flight swap. The grid already holds the swapped contents; this only paces the visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapAnimation {
    pub a: Pos,
    pub b: Pos,
    elapsed: u32,
    total: u32,
}

impl SwapAnimation {
    pub fn progress(&self) -> f32 {
        (self.elapsed as f32 / self.total as f32).min(1.0)
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockReport {
    pub swap_finished: Option<(Pos, Pos)>,
}

#[derive(Debug, Clone)]
pub struct AnimationClock {
    swap_ticks: u32,
    fall_per_tick: f32,
    pop_per_tick: f32,
    accumulator: Duration,
    swap: Option<SwapAnimation>,
    falling: usize,
}

impl AnimationClock {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            swap_ticks: config.swap_ticks,
            fall_per_tick: config.fall_speed / TICKS_PER_SECOND as f32,
            pop_per_tick: config.pop_in_speed / TICKS_PER_SECOND as f32,
            accumulator: Duration::ZERO,
            swap: None,
            falling: 0,
        }
    }

    pub fn start_swap(&mut self, a: Pos, b: Pos) {
        self.swap = Some(SwapAnimation {
            a,
            b,
            elapsed: 0,
            total: self.swap_ticks,
        });
    }

    pub fn swap(&self) -> Option<SwapAnimation> {
        self.swap
    }

    /// Recount falling gems after the resolver tagged new ones.
    pub fn track_falls(&mut self, grid: &Grid) {
        self.falling = grid.falling_count();
    }

    /// True while a swap is in flight or any gem is still falling.
    pub fn is_animating(&self) -> bool {
        self.swap.is_some() || self.falling > 0
    }

    /// Bank `dt` and return how many whole ticks are due now.
    pub fn accumulate(&mut self, dt: Duration) -> u32 {
        self.accumulator += dt;
        let mut due = 0;
        while self.accumulator >= TICK && due < MAX_CATCH_UP_TICKS {
            self.accumulator -= TICK;
            due += 1;
        }
        if due == MAX_CATCH_UP_TICKS {
            self.accumulator = Duration::ZERO;
        }
        due
    }

    /// Run one fixed tick of every active animation.
    pub fn tick(&mut self, grid: &mut Grid) -> ClockReport {
        let mut report = ClockReport::default();

        if let Some(anim) = self.swap.as_mut() {
            anim.elapsed += 1;
            if anim.elapsed >= anim.total {
                report.swap_finished = Some((anim.a, anim.b));
                self.swap = None;
            }
        }

        let mut still_falling = 0;
        for gem in grid.gems_mut() {
            if gem.falling {
                gem.visual_row += self.fall_per_tick;
                if gem.visual_row >= gem.pos.row as f32 {
                    gem.settle();
                } else {
                    still_falling += 1;
                }
            }
            if gem.scale < 1.0 {
                gem.scale = (gem.scale + self.pop_per_tick).min(1.0);
                if gem.scale >= 1.0 {
                    gem.just_spawned = false;
                }
            }
        }
        self.falling = still_falling;
        report
    }

    /// Drop every animation and put every gem at rest.
    pub fn reset(&mut self, grid: &mut Grid) {
        self.swap = None;
        self.accumulator = Duration::ZERO;
        for gem in grid.gems_mut() {
            gem.settle();
            gem.scale = 1.0;
            gem.just_spawned = false;
        }
        self.falling = 0;
    }
}
