//! Removal flashes (TachyonFX) and floating score popups, driven by engine events.

use crate::ui;
use gemtui::engine::{EngineEvent, Pos};
use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Style, Stylize};
use std::collections::HashSet;
use std::time::Duration;
use tachyonfx::{CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count};

/// Removal flash fade length.
const FLASH_MS: u32 = 350;
/// Popups rise one terminal row per step and vanish after their lifetime.
const POPUP_STEP: Duration = Duration::from_millis(150);
const POPUP_LIFETIME: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorePopup {
    pub origin: Pos,
    pub amount: u32,
    pub depth: u32,
    pub age: Duration,
}

impl ScorePopup {
    pub fn label(&self) -> String {
        if self.depth > 1 {
            format!("+{} x{}", self.amount, self.depth)
        } else {
            format!("+{}", self.amount)
        }
    }

    /// Rows risen so far.
    pub fn rise(&self) -> u16 {
        (self.age.as_millis() / POPUP_STEP.as_millis()) as u16
    }
}

/// Visual feedback only: nothing here feeds back into the engine.
#[derive(Default)]
pub struct Effects {
    flashes_enabled: bool,
    /// Cells removed since the last render, waiting for a flash.
    pending: Vec<Pos>,
    flashes: Vec<Effect>,
    popups: Vec<ScorePopup>,
}

impl Effects {
    pub fn new(flashes_enabled: bool) -> Self {
        Self {
            flashes_enabled,
            ..Self::default()
        }
    }

    pub fn on_event(&mut self, event: &EngineEvent) {
        match *event {
            EngineEvent::GemRemoved { pos, .. } if self.flashes_enabled => self.pending.push(pos),
            EngineEvent::ScoreAwarded {
                delta,
                depth,
                origin,
                ..
            } => self.popups.push(ScorePopup {
                origin,
                amount: delta,
                depth,
                age: Duration::ZERO,
            }),
            _ => {}
        }
    }

    /// Age popups by one frame.
    pub fn tick(&mut self, dt: Duration) {
        self.popups.retain_mut(|p| {
            p.age += dt;
            p.age < POPUP_LIFETIME
        });
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.flashes.clear();
        self.popups.clear();
    }

    /// Start flashes for newly removed cells and run every active one.
    pub fn render_flashes(&mut self, frame: &mut Frame, board: Rect, dt: Duration) {
        if !self.pending.is_empty() {
            let cells: HashSet<(u16, u16)> = self
                .pending
                .drain(..)
                .flat_map(|pos| ui::cell_rect(board, pos).positions())
                .map(|p| (p.x, p.y))
                .collect();
            let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
                cells.contains(&(pos.x, pos.y))
            }));
            let effect = fx::fade_from(Color::White, Color::White, (FLASH_MS, Interpolation::QuadOut))
                .with_filter(filter)
                .with_area(board);
            self.flashes.push(effect);
        }

        let delta = TfxDuration::from_millis(dt.as_millis().min(u32::MAX as u128) as u32);
        for effect in &mut self.flashes {
            frame.render_effect(effect, board, delta);
        }
        self.flashes.retain(|e| !e.done());
    }

    /// Popups from rows below a clipped board edge are skipped.
    pub fn render_popups(&self, frame: &mut Frame, board: Rect, bg: Color) {
        let visible = board.intersection(frame.area());
        for popup in &self.popups {
            let cell = ui::cell_rect(board, popup.origin);
            let Some(y) = cell.y.checked_sub(popup.rise()) else {
                continue;
            };
            if !visible.contains(Position::new(cell.x, y)) {
                continue;
            }
            let style = Style::default().fg(Color::Yellow).bg(bg).bold();
            frame.buffer_mut().set_string(cell.x, y, popup.label(), style);
        }
    }
}
