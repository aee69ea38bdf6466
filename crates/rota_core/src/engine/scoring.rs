//! Effective-score computation for assignment ranking.
//!
//! # Responsibility
//! - Keep the whole ranking rule in one pure function.
//!
//! # Invariants
//! - Lower score ranks first and therefore receives harder duty.
//! - Inputs are read-only; ranking never mutates ledger state.

use crate::engine::load_ledger::LoadRecord;
use serde::{Deserialize, Serialize};

/// Default effective-load reduction applied per recorded skip.
pub const DEFAULT_SKIP_BONUS_PER_SKIP: f64 = 2.0;
/// Default effective-load increase while a return bonus is armed.
pub const DEFAULT_VACATION_RETURN_BONUS: f64 = 6.0;

/// Weights for the ranking rule.
///
/// Sized against the 1..=5 difficulty scale: two skips outweigh the hardest
/// single chore, one return bonus outweighs a full hard week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Subtracted from effective load once per recorded skip, pushing
    /// frequent skippers toward harder duty instead of excusing them.
    pub skip_bonus_per_skip: f64,
    /// Added to effective load while a participant's return bonus is armed,
    /// steering recent returners toward easier or no duty.
    pub vacation_return_bonus: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            skip_bonus_per_skip: DEFAULT_SKIP_BONUS_PER_SKIP,
            vacation_return_bonus: DEFAULT_VACATION_RETURN_BONUS,
        }
    }
}

/// Computes the ranking score for one participant.
///
/// The score is a ranking value only; it may go negative and is never
/// stored. `cumulative_difficulty` remains the sole persisted load figure.
pub fn effective_score(
    record: &LoadRecord,
    return_bonus_active: bool,
    config: &ScoringConfig,
) -> f64 {
    let skip_bonus = record.skips as f64 * config.skip_bonus_per_skip;
    let return_bonus = if return_bonus_active {
        config.vacation_return_bonus
    } else {
        0.0
    };
    record.cumulative_difficulty - skip_bonus + return_bonus
}

#[cfg(test)]
mod tests {
    use super::{effective_score, ScoringConfig};
    use crate::engine::load_ledger::LoadRecord;
    use uuid::Uuid;

    fn record(cumulative: f64, skips: u64) -> LoadRecord {
        let mut record = LoadRecord::empty(Uuid::new_v4());
        record.cumulative_difficulty = cumulative;
        record.skips = skips;
        record
    }

    #[test]
    fn zero_record_scores_zero() {
        let config = ScoringConfig::default();
        assert_eq!(effective_score(&record(0.0, 0), false, &config), 0.0);
    }

    #[test]
    fn skips_lower_the_score() {
        let config = ScoringConfig::default();
        let plain = effective_score(&record(10.0, 0), false, &config);
        let skipper = effective_score(&record(10.0, 2), false, &config);
        assert!(skipper < plain);
        assert_eq!(skipper, 10.0 - 2.0 * config.skip_bonus_per_skip);
    }

    #[test]
    fn armed_return_bonus_raises_the_score() {
        let config = ScoringConfig::default();
        let plain = effective_score(&record(4.0, 0), false, &config);
        let returned = effective_score(&record(4.0, 0), true, &config);
        assert_eq!(returned, plain + config.vacation_return_bonus);
    }

    #[test]
    fn score_may_go_negative() {
        let config = ScoringConfig::default();
        assert!(effective_score(&record(1.0, 3), false, &config) < 0.0);
    }
}
