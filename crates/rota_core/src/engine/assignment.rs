//! Deterministic weekly assignment and mid-cycle reassignment.
//!
//! # Responsibility
//! - Turn a filtered participant pool and a due chore list into one rota.
//! - Re-run the selection rule for a single chore after a skip.
//!
//! # Invariants
//! - Identical inputs produce an identical rota.
//! - Vacationers never receive an assignment, overrides notwithstanding.
//! - A failed generation leaves every input untouched.

use crate::engine::exclusion::ExclusionSet;
use crate::engine::load_ledger::{LoadLedger, LoadRecord};
use crate::engine::scoring::{effective_score, ScoringConfig};
use crate::engine::vacation::VacationTracker;
use crate::engine::{EngineError, EngineResult};
use crate::model::chore::{Chore, ChoreId};
use crate::model::participant::{Participant, ParticipantId};
use crate::model::rota::{Assignment, AssignmentStatus, CycleId, WeeklyRota};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Result of one skip-triggered reassignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassignOutcome {
    /// The chore moved to another participant and is pending again.
    Moved {
        from: ParticipantId,
        to: ParticipantId,
    },
    /// The skipper was the only eligible candidate and keeps the chore.
    Retained(ParticipantId),
    /// Nobody is eligible; the assignment stays skipped.
    Unfilled(ParticipantId),
}

/// The fairness core: greedy lowest-effective-score assignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignmentEngine {
    scoring: ScoringConfig,
}

impl AssignmentEngine {
    /// Creates an engine with the given ranking weights.
    pub fn new(scoring: ScoringConfig) -> Self {
        Self { scoring }
    }

    /// Active ranking weights.
    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Generates the rota for one cycle.
    ///
    /// Eligibility is checked before dueness, so an all-vacationing roster
    /// reports `NoEligibleParticipants` even when no chores are due. An
    /// empty or fully not-yet-due chore list yields an empty rota.
    #[allow(clippy::too_many_arguments)]
    pub fn generate(
        &self,
        cycle: CycleId,
        now_ms: i64,
        participants: &[Participant],
        chores: &[Chore],
        last_scheduled: &BTreeMap<ChoreId, CycleId>,
        ledger: &LoadLedger,
        vacations: &VacationTracker,
        exclusions: &ExclusionSet,
    ) -> EngineResult<WeeklyRota> {
        let pool = eligible_pool(participants, vacations, exclusions);
        if pool.is_empty() {
            return Err(EngineError::NoEligibleParticipants);
        }

        let mut due: Vec<&Chore> = chores
            .iter()
            .filter(|chore| is_due(chore, cycle, last_scheduled))
            .collect();
        due.sort_by(|a, b| {
            b.difficulty
                .cmp(&a.difficulty)
                .then_with(|| a.uuid.cmp(&b.uuid))
        });

        // In-cycle working scores: seeded from the persisted ledger, then
        // bumped per placement so one cycle spreads across people. Discarded
        // after generation.
        let mut scores: BTreeMap<ParticipantId, f64> = pool
            .iter()
            .map(|participant| {
                (
                    participant.uuid,
                    self.score_for(participant.uuid, ledger, vacations),
                )
            })
            .collect();

        let mut assignments = Vec::with_capacity(due.len());
        for chore in due {
            let winner = lowest_score(&scores).ok_or(EngineError::NoEligibleParticipants)?;
            assignments.push(Assignment {
                chore_uuid: chore.uuid,
                participant_uuid: winner,
                difficulty: chore.difficulty,
                status: AssignmentStatus::Pending,
            });
            if let Some(score) = scores.get_mut(&winner) {
                *score += f64::from(chore.difficulty);
            }
        }

        Ok(WeeklyRota {
            cycle,
            created_at: now_ms,
            assignments,
        })
    }

    /// Re-runs the selection rule for one chore after a skip.
    ///
    /// The skipper is excluded for this chore only; vacationers stay
    /// excluded; the consumed exclusion set does not re-apply mid-cycle.
    /// Candidate ranking adds pending in-cycle load on top of the effective
    /// score so reassignment keeps spreading work.
    pub fn reassign(
        &self,
        rota: &mut WeeklyRota,
        chore_uuid: ChoreId,
        excluding: ParticipantId,
        participants: &[Participant],
        ledger: &LoadLedger,
        vacations: &VacationTracker,
    ) -> EngineResult<ReassignOutcome> {
        if rota.assignment(chore_uuid).is_none() {
            return Err(EngineError::UnknownChore(chore_uuid));
        }

        let candidates: BTreeMap<ParticipantId, f64> = participants
            .iter()
            .filter(|participant| {
                participant.uuid != excluding && !is_away(participant, vacations)
            })
            .map(|participant| {
                let base = self.score_for(participant.uuid, ledger, vacations);
                (participant.uuid, base + rota.pending_load(participant.uuid))
            })
            .collect();

        let assignment = rota
            .assignment_mut(chore_uuid)
            .ok_or(EngineError::UnknownChore(chore_uuid))?;

        if let Some(winner) = lowest_score(&candidates) {
            let from = assignment.participant_uuid;
            assignment.participant_uuid = winner;
            assignment.status = AssignmentStatus::Pending;
            return Ok(ReassignOutcome::Moved { from, to: winner });
        }

        let skipper_available = participants
            .iter()
            .any(|participant| participant.uuid == excluding && !is_away(participant, vacations));
        if skipper_available {
            assignment.status = AssignmentStatus::Pending;
            return Ok(ReassignOutcome::Retained(excluding));
        }

        Ok(ReassignOutcome::Unfilled(assignment.participant_uuid))
    }

    fn score_for(
        &self,
        participant_uuid: ParticipantId,
        ledger: &LoadLedger,
        vacations: &VacationTracker,
    ) -> f64 {
        let fallback = LoadRecord::empty(participant_uuid);
        let record = ledger.record(participant_uuid).unwrap_or(&fallback);
        effective_score(
            record,
            vacations.return_bonus_active(participant_uuid),
            &self.scoring,
        )
    }
}

fn eligible_pool<'a>(
    participants: &'a [Participant],
    vacations: &VacationTracker,
    exclusions: &ExclusionSet,
) -> Vec<&'a Participant> {
    participants
        .iter()
        .filter(|participant| {
            if is_away(participant, vacations) {
                return false;
            }
            exclusions.included(participant.uuid).unwrap_or(true)
        })
        .collect()
}

fn is_away(participant: &Participant, vacations: &VacationTracker) -> bool {
    participant.on_vacation || vacations.is_on_vacation(participant.uuid)
}

fn is_due(chore: &Chore, cycle: CycleId, last_scheduled: &BTreeMap<ChoreId, CycleId>) -> bool {
    if chore.frequency == 1 {
        return true;
    }
    match last_scheduled.get(&chore.uuid) {
        None => true,
        Some(last) => cycle.saturating_sub(*last) >= CycleId::from(chore.frequency),
    }
}

/// Minimum by `(score, id)`; the id tie-break keeps selection reproducible.
fn lowest_score(scores: &BTreeMap<ParticipantId, f64>) -> Option<ParticipantId> {
    scores
        .iter()
        .min_by(|(id_a, score_a), (id_b, score_b)| {
            score_a
                .partial_cmp(score_b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| id_a.cmp(id_b))
        })
        .map(|(participant_uuid, _)| *participant_uuid)
}
