//! Completion and skip signal processing.
//!
//! # Responsibility
//! - Turn one completion/skip signal into ledger and rota mutations.
//! - Trigger the engine's reassignment path after a skip.
//!
//! # Invariants
//! - All validation precedes any mutation; a rejected signal changes
//!   nothing.
//! - Completion credits the actor, who may be a helper, never the assignee
//!   by default.
//! - A reassigned chore starts over at pending with no cascading stats.

use crate::engine::assignment::{AssignmentEngine, ReassignOutcome};
use crate::engine::load_ledger::LoadLedger;
use crate::engine::vacation::VacationTracker;
use crate::engine::{EngineError, EngineResult};
use crate::model::chore::ChoreId;
use crate::model::participant::{Participant, ParticipantId};
use crate::model::rota::{AssignmentStatus, WeeklyRota};

/// Signalled outcome of one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoreOutcome {
    /// The chore was done.
    Completed,
    /// The assignee declines the chore this cycle.
    Skipped,
}

/// What one processed signal did to the rota and the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEffect {
    /// The assignment completed; `credited` received the load.
    Completed {
        chore_uuid: ChoreId,
        credited: ParticipantId,
    },
    /// The skipped chore moved to another participant.
    Reassigned {
        chore_uuid: ChoreId,
        from: ParticipantId,
        to: ParticipantId,
    },
    /// The skipper keeps the chore; nobody else was eligible.
    SkipRetained {
        chore_uuid: ChoreId,
        participant: ParticipantId,
    },
    /// The skipped chore stays unassigned for this cycle.
    SkipUnfilled {
        chore_uuid: ChoreId,
        participant: ParticipantId,
    },
}

/// Converts completion/skip signals into state mutations.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionProcessor {
    engine: AssignmentEngine,
}

impl CompletionProcessor {
    /// Creates a processor sharing the engine's ranking weights.
    pub fn new(engine: AssignmentEngine) -> Self {
        Self { engine }
    }

    /// Applies one signal against the active rota.
    ///
    /// Skips are restricted to the current assignee; completions accept any
    /// known participant, crediting the helper when the actor differs from
    /// the assignee.
    pub fn on_signal(
        &self,
        rota: &mut WeeklyRota,
        chore_uuid: ChoreId,
        actor: ParticipantId,
        outcome: ChoreOutcome,
        participants: &[Participant],
        ledger: &mut LoadLedger,
        vacations: &VacationTracker,
    ) -> EngineResult<SignalEffect> {
        let (assignee, difficulty, status) = {
            let assignment = rota
                .assignment(chore_uuid)
                .ok_or(EngineError::UnknownChore(chore_uuid))?;
            (
                assignment.participant_uuid,
                assignment.difficulty,
                assignment.status,
            )
        };

        if status != AssignmentStatus::Pending {
            return Err(EngineError::AssignmentNotPending(chore_uuid));
        }
        let actor_known = participants.iter().any(|participant| participant.uuid == actor)
            && ledger.contains(actor);
        if !actor_known {
            return Err(EngineError::UnknownParticipant(actor));
        }

        match outcome {
            ChoreOutcome::Completed => {
                ledger.record_completion(actor, difficulty)?;
                let assignment = rota
                    .assignment_mut(chore_uuid)
                    .ok_or(EngineError::UnknownChore(chore_uuid))?;
                assignment.status = AssignmentStatus::Completed;
                Ok(SignalEffect::Completed {
                    chore_uuid,
                    credited: actor,
                })
            }
            ChoreOutcome::Skipped => {
                if actor != assignee {
                    return Err(EngineError::NotCurrentAssignee { chore_uuid, actor });
                }
                ledger.record_skip(actor)?;
                {
                    let assignment = rota
                        .assignment_mut(chore_uuid)
                        .ok_or(EngineError::UnknownChore(chore_uuid))?;
                    assignment.status = AssignmentStatus::Skipped;
                }
                let outcome = self.engine.reassign(
                    rota,
                    chore_uuid,
                    actor,
                    participants,
                    ledger,
                    vacations,
                )?;
                match outcome {
                    ReassignOutcome::Moved { from, to } => {
                        ledger.record_reassignment(to)?;
                        Ok(SignalEffect::Reassigned {
                            chore_uuid,
                            from,
                            to,
                        })
                    }
                    ReassignOutcome::Retained(participant) => Ok(SignalEffect::SkipRetained {
                        chore_uuid,
                        participant,
                    }),
                    ReassignOutcome::Unfilled(participant) => Ok(SignalEffect::SkipUnfilled {
                        chore_uuid,
                        participant,
                    }),
                }
            }
        }
    }
}
