//! Vacation tracking with return-bonus bookkeeping.
//!
//! # Responsibility
//! - Own vacation transitions and the armed return-bonus window.
//!
//! # Invariants
//! - Enabling vacation clears any armed return bonus.
//! - `finish_cycle` runs exactly once per successful generation; the cycle
//!   driver owns that call.

use crate::engine::{EngineError, EngineResult};
use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of generations a return bonus stays armed.
pub const DEFAULT_RETURN_BONUS_CYCLES: u32 = 2;

/// Per-participant vacation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationState {
    /// Currently away.
    pub on_vacation: bool,
    /// Unix epoch milliseconds of the most recent return.
    pub returned_at: Option<i64>,
    /// Generations left with the return bonus applied.
    pub bonus_cycles_left: u32,
}

/// Tracks who is away and who recently came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VacationTracker {
    states: BTreeMap<ParticipantId, VacationState>,
    return_bonus_cycles: u32,
}

impl Default for VacationTracker {
    fn default() -> Self {
        Self::new(DEFAULT_RETURN_BONUS_CYCLES)
    }
}

impl VacationTracker {
    /// Creates an empty tracker arming `return_bonus_cycles` generations of
    /// bonus per return.
    pub fn new(return_bonus_cycles: u32) -> Self {
        Self {
            states: BTreeMap::new(),
            return_bonus_cycles,
        }
    }

    /// Rebuilds a tracker from persisted state.
    pub fn from_states(
        states: Vec<(ParticipantId, VacationState)>,
        return_bonus_cycles: u32,
    ) -> Self {
        Self {
            states: states.into_iter().collect(),
            return_bonus_cycles,
        }
    }

    /// Registers a participant as available. Idempotent.
    pub fn register(&mut self, participant_uuid: ParticipantId) {
        self.states.entry(participant_uuid).or_default();
    }

    /// Drops a participant's state, if present.
    pub fn remove(&mut self, participant_uuid: ParticipantId) {
        self.states.remove(&participant_uuid);
    }

    /// Read access to one participant's state.
    pub fn state(&self, participant_uuid: ParticipantId) -> Option<&VacationState> {
        self.states.get(&participant_uuid)
    }

    /// All states in deterministic id order.
    pub fn states(&self) -> impl Iterator<Item = (&ParticipantId, &VacationState)> {
        self.states.iter()
    }

    /// Whether this participant is currently away. Unknown participants
    /// count as available.
    pub fn is_on_vacation(&self, participant_uuid: ParticipantId) -> bool {
        self.states
            .get(&participant_uuid)
            .is_some_and(|state| state.on_vacation)
    }

    /// Whether the return bonus applies to this participant right now.
    pub fn return_bonus_active(&self, participant_uuid: ParticipantId) -> bool {
        self.states
            .get(&participant_uuid)
            .is_some_and(|state| !state.on_vacation && state.bonus_cycles_left > 0)
    }

    /// Applies one vacation transition.
    ///
    /// Turning vacation off stamps the return time and arms the bonus;
    /// turning it on clears any armed bonus. Repeating the current state is
    /// a no-op and does not re-arm anything.
    pub fn set_vacation(
        &mut self,
        participant_uuid: ParticipantId,
        active: bool,
        now_ms: i64,
    ) -> EngineResult<()> {
        let state = self
            .states
            .get_mut(&participant_uuid)
            .ok_or(EngineError::UnknownParticipant(participant_uuid))?;
        if state.on_vacation == active {
            return Ok(());
        }
        if active {
            state.on_vacation = true;
            state.returned_at = None;
            state.bonus_cycles_left = 0;
        } else {
            state.on_vacation = false;
            state.returned_at = Some(now_ms);
            state.bonus_cycles_left = self.return_bonus_cycles;
        }
        Ok(())
    }

    /// Consumes one armed bonus cycle per participant.
    pub fn finish_cycle(&mut self) {
        for state in self.states.values_mut() {
            if state.bonus_cycles_left > 0 {
                state.bonus_cycles_left -= 1;
            }
        }
    }
}
