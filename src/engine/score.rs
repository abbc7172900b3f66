//! Score tracking: points per removed gem scaled by combo depth.

/// Session totals kept for the engine's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub score: u32,
    pub max_combo: u32,
    pub moves: u32,
}

#[derive(Debug, Clone)]
pub struct ScoreTracker {
    base_points: u32,
    score: u32,
    combo: u32,
    max_combo: u32,
    moves: u32,
}

impl ScoreTracker {
    pub fn new(base_points: u32) -> Self {
        Self {
            base_points,
            score: 0,
            combo: 0,
            max_combo: 0,
            moves: 0,
        }
    }

    /// Add `base_points * depth * gem_count` and return the delta.
    pub fn award(&mut self, gem_count: usize, depth: u32) -> u32 {
        let delta = self
            .base_points
            .saturating_mul(depth)
            .saturating_mul(u32::try_from(gem_count).unwrap_or(u32::MAX));
        self.score = self.score.saturating_add(delta);
        delta
    }

    /// Record the depth of the chain currently resolving.
    pub fn set_combo(&mut self, depth: u32) {
        self.combo = depth;
    }

    /// A cascade settled with no further match: count the move and reset the chain.
    pub fn finish_chain(&mut self) {
        self.moves += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.combo = 0;
    }

    /// A swap failed to match.
    pub fn reset_combo(&mut self) {
        self.combo = 0;
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            score: self.score,
            max_combo: self.max_combo,
            moves: self.moves,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_award_scales_with_depth_and_count() {
        let mut score = ScoreTracker::new(10);
        assert_eq!(score.award(3, 1), 30);
        assert_eq!(score.award(4, 2), 80);
        assert_eq!(score.award(0, 3), 0);
        assert_eq!(score.score(), 110);
    }

    #[test]
    fn test_max_combo_survives_reset() {
        let mut score = ScoreTracker::new(10);
        score.set_combo(1);
        score.set_combo(2);
        score.set_combo(3);
        score.finish_chain();
        score.set_combo(1);
        score.finish_chain();
        assert_eq!(score.summary(), SessionSummary {
            score: 0,
            max_combo: 3,
            moves: 2,
        });
        assert_eq!(score.combo(), 0);
    }

    #[test]
    fn test_award_saturates() {
        let mut score = ScoreTracker::new(u32::MAX);
        score.award(2, 2);
        assert_eq!(score.score(), u32::MAX);
    }
}
