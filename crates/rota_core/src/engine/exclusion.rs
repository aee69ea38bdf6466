//! Next-cycle inclusion overrides.
//!
//! # Responsibility
//! - Collect manual include/exclude toggles between generations.
//! - Hand the assignment step a one-shot snapshot.
//!
//! # Invariants
//! - A consumed set never leaks into a later cycle.
//! - Toggles never fail; roster validation happens upstream.

use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One-shot include/exclude overlay for a single generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionSet {
    overrides: BTreeMap<ParticipantId, bool>,
}

impl ExclusionSet {
    /// Whether no overrides are recorded.
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Number of recorded overrides.
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Explicit override for one participant, if any. `Some(false)` removes
    /// the participant from the pool; `Some(true)` keeps a non-vacationer
    /// in it; `None` leaves default eligibility in place.
    pub fn included(&self, participant_uuid: ParticipantId) -> Option<bool> {
        self.overrides.get(&participant_uuid).copied()
    }

    /// All overrides in deterministic id order.
    pub fn iter(&self) -> impl Iterator<Item = (ParticipantId, bool)> + '_ {
        self.overrides
            .iter()
            .map(|(participant_uuid, included)| (*participant_uuid, *included))
    }
}

/// Collects overrides for the next generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionPlanner {
    pending: ExclusionSet,
}

impl ExclusionPlanner {
    /// Creates a planner with no pending overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a planner from persisted overrides.
    pub fn from_overrides(overrides: Vec<(ParticipantId, bool)>) -> Self {
        Self {
            pending: ExclusionSet {
                overrides: overrides.into_iter().collect(),
            },
        }
    }

    /// Flips the pending override for one participant and returns the new
    /// inclusion state. A first toggle excludes.
    pub fn toggle(&mut self, participant_uuid: ParticipantId) -> bool {
        let included = self
            .pending
            .overrides
            .entry(participant_uuid)
            .and_modify(|included| *included = !*included)
            .or_insert(false);
        *included
    }

    /// Current pending set without consuming it.
    pub fn pending(&self) -> &ExclusionSet {
        &self.pending
    }

    /// Returns the pending set and clears it. A second consume without
    /// intervening toggles yields an empty set.
    pub fn consume(&mut self) -> ExclusionSet {
        std::mem::take(&mut self.pending)
    }

    /// Puts a snapshot back after an aborted generation.
    pub fn restore(&mut self, set: ExclusionSet) {
        self.pending = set;
    }

    /// Drops every pending override.
    pub fn clear(&mut self) {
        self.pending = ExclusionSet::default();
    }
}
