//! Weekly rota model.
//!
//! # Responsibility
//! - Define one generated cycle's assignment set and its lifecycle states.
//!
//! # Invariants
//! - `cycle` values strictly increase across generations and are never
//!   reused, so supersession is observable without timing races.
//! - Each chore appears at most once per rota.
//! - The assignment set is fixed at generation; afterwards only `status`,
//!   and `participant_uuid` on reassignment, may change.

use crate::model::chore::ChoreId;
use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};

/// Monotonic identifier for one weekly scheduling period.
pub type CycleId = u64;

/// Lifecycle state of one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Waiting for a completion or skip signal.
    Pending,
    /// Signalled done; load credit has been recorded.
    Completed,
    /// Skipped with nobody eligible to take over.
    Skipped,
}

/// One chore↔participant pairing inside a rota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned chore.
    pub chore_uuid: ChoreId,
    /// Current assignee; changes only through reassignment.
    pub participant_uuid: ParticipantId,
    /// Difficulty agreed at generation time. Later admin edits to the chore
    /// apply from the next cycle, never to an active rota.
    pub difficulty: u8,
    /// Lifecycle state.
    pub status: AssignmentStatus,
}

/// One generated cycle: the active weekly schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyRota {
    /// Cycle this rota was generated for.
    pub cycle: CycleId,
    /// Unix epoch milliseconds at generation.
    pub created_at: i64,
    /// Assignments in placement order (hardest chores first).
    pub assignments: Vec<Assignment>,
}

impl WeeklyRota {
    /// Looks up the assignment for one chore.
    pub fn assignment(&self, chore_uuid: ChoreId) -> Option<&Assignment> {
        self.assignments
            .iter()
            .find(|assignment| assignment.chore_uuid == chore_uuid)
    }

    /// Mutable lookup for status/participant transitions.
    pub fn assignment_mut(&mut self, chore_uuid: ChoreId) -> Option<&mut Assignment> {
        self.assignments
            .iter_mut()
            .find(|assignment| assignment.chore_uuid == chore_uuid)
    }

    /// Assignments still waiting for a signal.
    pub fn pending(&self) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|assignment| assignment.status == AssignmentStatus::Pending)
            .collect()
    }

    /// Summed difficulty of one participant's pending assignments.
    ///
    /// Used to keep mid-cycle reassignment spreading work: completed load is
    /// already in the cumulative ledger, so only pending load needs adding.
    pub fn pending_load(&self, participant_uuid: ParticipantId) -> f64 {
        self.assignments
            .iter()
            .filter(|assignment| {
                assignment.participant_uuid == participant_uuid
                    && assignment.status == AssignmentStatus::Pending
            })
            .map(|assignment| f64::from(assignment.difficulty))
            .sum()
    }
}
