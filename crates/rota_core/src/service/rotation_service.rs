//! Rotation orchestration service.
//!
//! # Responsibility
//! - Hydrate the engine leaves from persisted state, run the pure logic,
//!   persist the outcome.
//! - Own the cycle counter and the active-rota pointer semantics.
//!
//! # Invariants
//! - Mutating operations take `&mut self`; in-process single-writer flows
//!   from the borrow checker.
//! - A failed operation persists nothing; pending overrides survive an
//!   aborted generation untouched.

use crate::engine::assignment::AssignmentEngine;
use crate::engine::completion::{ChoreOutcome, CompletionProcessor, SignalEffect};
use crate::engine::exclusion::ExclusionPlanner;
use crate::engine::load_ledger::{LoadLedger, LoadRecord};
use crate::engine::scoring::ScoringConfig;
use crate::engine::vacation::{VacationTracker, DEFAULT_RETURN_BONUS_CYCLES};
use crate::engine::EngineError;
use crate::model::chore::ChoreId;
use crate::model::participant::{Participant, ParticipantId};
use crate::model::rota::{Assignment, AssignmentStatus, WeeklyRota};
use crate::repo::state_repo::{RotationStateRepository, StateRepoError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Tunable weights for one rotation deployment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationConfig {
    /// Ranking weights handed to the assignment engine.
    pub scoring: ScoringConfig,
    /// Generations a vacation-return bonus stays armed.
    pub return_bonus_cycles: u32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            return_bonus_cycles: DEFAULT_RETURN_BONUS_CYCLES,
        }
    }
}

pub type RotationServiceResult<T> = Result<T, RotationServiceError>;

/// Errors from rotation service operations.
#[derive(Debug)]
pub enum RotationServiceError {
    /// Engine-level rejection (eligibility, lifecycle, unknown ids).
    Engine(EngineError),
    /// Persistence-layer failure.
    Repo(StateRepoError),
    /// Manual reassignment target is currently away.
    AssigneeOnVacation(ParticipantId),
}

impl Display for RotationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::AssigneeOnVacation(id) => {
                write!(f, "participant {id} is on vacation and cannot be assigned")
            }
        }
    }
}

impl Error for RotationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::AssigneeOnVacation(_) => None,
        }
    }
}

impl From<EngineError> for RotationServiceError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<StateRepoError> for RotationServiceError {
    fn from(value: StateRepoError) -> Self {
        Self::Repo(value)
    }
}

/// Orchestrates cycle generation and signal processing over one repository.
pub struct RotationService<R: RotationStateRepository> {
    repo: R,
    engine: AssignmentEngine,
    processor: CompletionProcessor,
    return_bonus_cycles: u32,
}

impl<R: RotationStateRepository> RotationService<R> {
    /// Creates a service with default weights.
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, RotationConfig::default())
    }

    /// Creates a service with explicit weights.
    pub fn with_config(repo: R, config: RotationConfig) -> Self {
        let engine = AssignmentEngine::new(config.scoring);
        Self {
            repo,
            engine,
            processor: CompletionProcessor::new(engine),
            return_bonus_cycles: config.return_bonus_cycles,
        }
    }

    /// Generates and persists the rota for the next cycle.
    ///
    /// Consumes the pending override set on success; on failure nothing is
    /// persisted and the overrides remain pending.
    pub fn run_cycle(&mut self, now_ms: i64) -> RotationServiceResult<WeeklyRota> {
        let started_at = Instant::now();
        info!("event=cycle_generate module=rotation status=start");
        match self.run_cycle_inner(now_ms) {
            Ok(rota) => {
                info!(
                    "event=cycle_generate module=rotation status=ok cycle={} assignments={} duration_ms={}",
                    rota.cycle,
                    rota.assignments.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(rota)
            }
            Err(err) => {
                error!(
                    "event=cycle_generate module=rotation status=error duration_ms={} error_code=cycle_generate_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Applies one completion/skip signal against the active rota.
    pub fn signal(
        &mut self,
        chore_uuid: ChoreId,
        actor: ParticipantId,
        outcome: ChoreOutcome,
    ) -> RotationServiceResult<SignalEffect> {
        let started_at = Instant::now();
        match self.signal_inner(chore_uuid, actor, outcome) {
            Ok(effect) => {
                info!(
                    "event=signal module=rotation status=ok chore={} actor={} duration_ms={}",
                    chore_uuid,
                    actor,
                    started_at.elapsed().as_millis()
                );
                Ok(effect)
            }
            Err(err) => {
                error!(
                    "event=signal module=rotation status=error chore={} actor={} duration_ms={} error_code=signal_rejected error={}",
                    chore_uuid,
                    actor,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Hands one pending or unfilled assignment to an explicit participant.
    ///
    /// Completed assignments are final; vacationers cannot receive work.
    pub fn reassign_manual(
        &mut self,
        chore_uuid: ChoreId,
        to: ParticipantId,
    ) -> RotationServiceResult<()> {
        let mut rota = self.active_rota_required()?;
        let participants = self.repo.participants()?;
        let target = participants
            .iter()
            .find(|participant| participant.uuid == to)
            .ok_or(EngineError::UnknownParticipant(to))?;
        if target.on_vacation {
            return Err(RotationServiceError::AssigneeOnVacation(to));
        }

        let assignment = rota
            .assignment_mut(chore_uuid)
            .ok_or(EngineError::UnknownChore(chore_uuid))?;
        if assignment.status == AssignmentStatus::Completed {
            return Err(EngineError::AssignmentNotPending(chore_uuid).into());
        }
        assignment.participant_uuid = to;
        assignment.status = AssignmentStatus::Pending;
        let assignment = *assignment;
        self.repo.update_assignment(rota.cycle, &assignment)?;
        Ok(())
    }

    /// Applies one vacation transition and persists the new state.
    pub fn set_vacation(
        &mut self,
        participant_uuid: ParticipantId,
        active: bool,
        now_ms: i64,
    ) -> RotationServiceResult<()> {
        let participants = self.repo.participants()?;
        let mut vacations = self.hydrate_vacations(&participants)?;
        vacations.set_vacation(participant_uuid, active, now_ms)?;
        let state = *vacations
            .state(participant_uuid)
            .ok_or(EngineError::UnknownParticipant(participant_uuid))?;
        self.repo.save_vacation_state(participant_uuid, &state)?;
        Ok(())
    }

    /// Flips one participant's pending next-cycle override.
    pub fn toggle_exclusion(
        &mut self,
        participant_uuid: ParticipantId,
    ) -> RotationServiceResult<bool> {
        let participants = self.repo.participants()?;
        if !participants
            .iter()
            .any(|participant| participant.uuid == participant_uuid)
        {
            return Err(EngineError::UnknownParticipant(participant_uuid).into());
        }

        let mut planner = ExclusionPlanner::from_overrides(self.repo.exclusion_overrides()?);
        let included = planner.toggle(participant_uuid);
        let overrides: Vec<(ParticipantId, bool)> = planner.pending().iter().collect();
        self.repo.save_exclusion_overrides(&overrides)?;
        Ok(included)
    }

    /// Zeroes one participant's load record, or every record. Admin-only.
    pub fn reset_stats(&mut self, target: Option<ParticipantId>) -> RotationServiceResult<()> {
        let participants = self.repo.participants()?;
        let mut ledger = self.hydrate_ledger(&participants)?;
        match target {
            Some(participant_uuid) => ledger.reset(participant_uuid)?,
            None => ledger.reset_all(),
        }
        let records: Vec<LoadRecord> = ledger.records().cloned().collect();
        self.repo.save_load_records(&records)?;
        Ok(())
    }

    /// Drops the active-rota pointer; stored history is untouched.
    pub fn clear_rota(&mut self) -> RotationServiceResult<()> {
        self.repo.clear_active_rota()?;
        Ok(())
    }

    /// The currently active rota, if any.
    pub fn active_rota(&self) -> RotationServiceResult<Option<WeeklyRota>> {
        Ok(self.repo.active_rota()?)
    }

    /// Load records for every roster participant, zeroed where unrecorded.
    pub fn load_snapshot(&self) -> RotationServiceResult<Vec<LoadRecord>> {
        let participants = self.repo.participants()?;
        let ledger = self.hydrate_ledger(&participants)?;
        Ok(ledger.records().cloned().collect())
    }

    /// Assignments in the active rota still waiting for a signal.
    pub fn pending_assignments(&self) -> RotationServiceResult<Vec<Assignment>> {
        let Some(rota) = self.repo.active_rota()? else {
            return Ok(Vec::new());
        };
        Ok(rota.pending().into_iter().copied().collect())
    }

    fn run_cycle_inner(&mut self, now_ms: i64) -> RotationServiceResult<WeeklyRota> {
        let participants = self.repo.participants()?;
        let chores = self.repo.chores()?;
        let ledger = self.hydrate_ledger(&participants)?;
        let mut vacations = self.hydrate_vacations(&participants)?;
        let mut planner = ExclusionPlanner::from_overrides(self.repo.exclusion_overrides()?);
        let last_scheduled = self.repo.last_scheduled_cycles()?;
        let cycle = self.repo.next_cycle()?;

        let exclusions = planner.consume();
        let rota = self.engine.generate(
            cycle,
            now_ms,
            &participants,
            &chores,
            &last_scheduled,
            &ledger,
            &vacations,
            &exclusions,
        )?;

        vacations.finish_cycle();
        let vacation_states: Vec<_> = vacations
            .states()
            .map(|(participant_uuid, state)| (*participant_uuid, *state))
            .collect();
        let records: Vec<LoadRecord> = ledger.records().cloned().collect();
        self.repo
            .commit_generation(&rota, cycle + 1, &vacation_states, &records)?;
        Ok(rota)
    }

    fn signal_inner(
        &mut self,
        chore_uuid: ChoreId,
        actor: ParticipantId,
        outcome: ChoreOutcome,
    ) -> RotationServiceResult<SignalEffect> {
        let mut rota = self.active_rota_required()?;
        let participants = self.repo.participants()?;
        let mut ledger = self.hydrate_ledger(&participants)?;
        let vacations = self.hydrate_vacations(&participants)?;

        let effect = self.processor.on_signal(
            &mut rota,
            chore_uuid,
            actor,
            outcome,
            &participants,
            &mut ledger,
            &vacations,
        )?;

        let assignment = *rota
            .assignment(chore_uuid)
            .ok_or(EngineError::UnknownChore(chore_uuid))?;
        let records: Vec<LoadRecord> = ledger.records().cloned().collect();
        self.repo.commit_signal(rota.cycle, &assignment, &records)?;
        Ok(effect)
    }

    fn active_rota_required(&self) -> RotationServiceResult<WeeklyRota> {
        self.repo
            .active_rota()?
            .ok_or(EngineError::NoActiveRota.into())
    }

    fn hydrate_ledger(&self, participants: &[Participant]) -> RotationServiceResult<LoadLedger> {
        let mut ledger = LoadLedger::from_records(self.repo.load_records()?);
        for participant in participants {
            ledger.register(participant.uuid);
        }
        Ok(ledger)
    }

    fn hydrate_vacations(
        &self,
        participants: &[Participant],
    ) -> RotationServiceResult<VacationTracker> {
        let mut vacations =
            VacationTracker::from_states(self.repo.vacation_states()?, self.return_bonus_cycles);
        for participant in participants {
            vacations.register(participant.uuid);
        }
        Ok(vacations)
    }
}
