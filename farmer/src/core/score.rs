//! Score owed for holding a normal zone to completion.

/// Base score that is shifted left by the zone difficulty.
const BASE_SCORE: u32 = 300;

/// Score to report for a completed zone: 600, 1200 or 2400.
///
/// Returns `None` for difficulties the service never assigns to normal zones.
pub fn score_for_difficulty(difficulty: u8) -> Option<u32> {
    (1..=3)
        .contains(&difficulty)
        .then(|| BASE_SCORE << difficulty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_doubles_per_difficulty() {
        assert_eq!(score_for_difficulty(1), Some(600));
        assert_eq!(score_for_difficulty(2), Some(1200));
        assert_eq!(score_for_difficulty(3), Some(2400));
    }

    #[test]
    fn out_of_range_difficulty_has_no_score() {
        assert_eq!(score_for_difficulty(0), None);
        assert_eq!(score_for_difficulty(4), None);
    }
}
