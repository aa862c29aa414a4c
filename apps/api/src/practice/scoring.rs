//! Score and confidence arithmetic for practice sessions.
//!
//! All adjustments are additive against a running `u32` total, with the one
//! subtraction (skipping) saturating at zero. A session's final score depends
//! only on the sequence of transitions applied, never on wall-clock timing.

/// Seconds allowed per question before the countdown forces a transition.
pub const QUESTION_TIME_LIMIT_SECS: u16 = 120;

/// Deducted when the candidate explicitly skips a question.
pub const SKIP_PENALTY: u32 = 50;

/// Base points for moving past a question that received feedback.
pub const ADVANCE_BASE_BONUS: u32 = 100;

/// Awarded once per question for marking its feedback as helpful.
pub const HELPFUL_RATING_BONUS: u32 = 10;

/// Points per point of the analysis `overall` rating.
pub const RATING_POINTS_PER_OVERALL: u32 = 20;

pub const MIN_CONFIDENCE: u8 = 1;
pub const MAX_CONFIDENCE: u8 = 5;
/// Every question starts at the scale midpoint until an analysis says otherwise.
pub const INITIAL_CONFIDENCE: u8 = 3;

/// Points earned when an answer analysis lands: `overall` (1-5) times 20.
pub fn rating_points(overall: u8) -> u32 {
    overall as u32 * RATING_POINTS_PER_OVERALL
}

/// Bonus for advancing past a question with feedback:
/// 100 base + 1 point per 10 seconds left on the clock + 5 per confidence point.
pub fn advance_bonus(time_remaining: u16, confidence: u8) -> u32 {
    ADVANCE_BASE_BONUS + time_remaining as u32 / 10 + confidence as u32 * 5
}

/// Applies the skip penalty without letting the total go negative.
pub fn apply_skip_penalty(score: u32) -> u32 {
    score.saturating_sub(SKIP_PENALTY)
}

/// Clamps a confidence value onto the 1-5 scale.
pub fn clamp_confidence(value: u8) -> u8 {
    value.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_points_scale() {
        assert_eq!(rating_points(1), 20);
        assert_eq!(rating_points(3), 60);
        assert_eq!(rating_points(5), 100);
    }

    #[test]
    fn test_advance_bonus_time_component_truncates() {
        // 115 seconds left contributes 11 points, not 11.5
        assert_eq!(advance_bonus(115, 3), 100 + 11 + 15);
    }

    #[test]
    fn test_advance_bonus_full_clock() {
        assert_eq!(advance_bonus(QUESTION_TIME_LIMIT_SECS, 5), 100 + 12 + 25);
    }

    #[test]
    fn test_advance_bonus_empty_clock() {
        assert_eq!(advance_bonus(0, 1), 105);
    }

    #[test]
    fn test_skip_penalty_floors_at_zero() {
        assert_eq!(apply_skip_penalty(0), 0);
        assert_eq!(apply_skip_penalty(49), 0);
        assert_eq!(apply_skip_penalty(50), 0);
        assert_eq!(apply_skip_penalty(130), 80);
    }

    #[test]
    fn test_clamp_confidence_bounds() {
        assert_eq!(clamp_confidence(0), 1);
        assert_eq!(clamp_confidence(3), 3);
        assert_eq!(clamp_confidence(6), 5);
    }
}
