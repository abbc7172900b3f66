//! Engine tuning: board size, palette, points and animation pacing.

use super::error::{EngineError, MAX_EDGE, MIN_EDGE};

/// Everything the engine needs to know up front. Defaults match the classic 8x8, five-colour board.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub rows: usize,
    pub cols: usize,
    /// Number of gem kinds in play (3..=7).
    pub gem_kinds: u8,
    /// Points per removed gem at combo depth 1.
    pub base_points: u32,
    /// Swap animation length in fixed ticks (60 per second).
    pub swap_ticks: u32,
    /// Fall speed in rows per second.
    pub fall_speed: f32,
    /// Pop-in growth per second for freshly spawned gems.
    pub pop_in_speed: f32,
    /// Regenerate boards that have no legal move.
    pub ensure_playable: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rows: 8,
            cols: 8,
            gem_kinds: 5,
            base_points: 10,
            swap_ticks: 12,
            fall_speed: 10.0,
            pop_in_speed: 5.0,
            ensure_playable: true,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        for (axis, got) in [("rows", self.rows), ("cols", self.cols)] {
            if !(MIN_EDGE..=MAX_EDGE).contains(&got) {
                return Err(EngineError::Dimension { axis, got });
            }
        }
        if !(3..=7).contains(&self.gem_kinds) {
            return Err(EngineError::GemKinds(self.gem_kinds));
        }
        if self.base_points == 0 {
            return Err(EngineError::BasePoints);
        }
        if self.swap_ticks == 0 {
            return Err(EngineError::Timing("swap_ticks"));
        }
        if self.fall_speed.is_nan() || self.fall_speed <= 0.0 {
            return Err(EngineError::Timing("fall_speed"));
        }
        if self.pop_in_speed.is_nan() || self.pop_in_speed <= 0.0 {
            return Err(EngineError::Timing("pop_in_speed"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_values() {
        let small = EngineConfig {
            rows: 2,
            ..EngineConfig::default()
        };
        assert_eq!(
            small.validate(),
            Err(EngineError::Dimension { axis: "rows", got: 2 })
        );

        let kinds = EngineConfig {
            gem_kinds: 8,
            ..EngineConfig::default()
        };
        assert_eq!(kinds.validate(), Err(EngineError::GemKinds(8)));

        let still = EngineConfig {
            fall_speed: 0.0,
            ..EngineConfig::default()
        };
        assert_eq!(still.validate(), Err(EngineError::Timing("fall_speed")));
    }
}
