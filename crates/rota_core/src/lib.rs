//! Core domain logic for the rota chore rotation system.
//! This crate is the single source of truth for scheduling invariants.

pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use engine::assignment::{AssignmentEngine, ReassignOutcome};
pub use engine::completion::{ChoreOutcome, CompletionProcessor, SignalEffect};
pub use engine::exclusion::{ExclusionPlanner, ExclusionSet};
pub use engine::load_ledger::{LoadLedger, LoadRecord};
pub use engine::scoring::{effective_score, ScoringConfig};
pub use engine::vacation::{VacationState, VacationTracker};
pub use engine::voting::{DifficultyVotes, VoteSession};
pub use engine::{EngineError, EngineResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::chore::{Chore, ChoreId};
pub use model::participant::{Participant, ParticipantId};
pub use model::rota::{Assignment, AssignmentStatus, CycleId, WeeklyRota};
pub use repo::roster_repo::{RosterRepository, SqliteRosterRepository};
pub use repo::state_repo::{RotationStateRepository, SqliteRotationStateRepository};
pub use service::roster_service::{RosterService, RosterServiceError};
pub use service::rotation_service::{RotationConfig, RotationService, RotationServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
