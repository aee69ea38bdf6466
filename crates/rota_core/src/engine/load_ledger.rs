//! Cumulative load ledger per participant.
//!
//! # Responsibility
//! - Track completed difficulty plus completion/skip/reassignment counters.
//!
//! # Invariants
//! - `cumulative_difficulty` never decreases except through an explicit
//!   reset.
//! - Counters change only through the `record_*` operations.

use crate::engine::{EngineError, EngineResult};
use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted per-participant load statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRecord {
    /// Participant this record belongs to.
    pub participant_uuid: ParticipantId,
    /// Summed difficulty of completed assignments.
    pub cumulative_difficulty: f64,
    /// Assignments signalled done (including helper completions credited
    /// to this participant).
    pub completions: u64,
    /// Assignments this participant skipped.
    pub skips: u64,
    /// Chores received mid-cycle through skip reassignment. Bookkeeping
    /// only; never feeds the ranking score.
    pub reassignments: u64,
}

impl LoadRecord {
    /// Zeroed record for a newly registered participant.
    pub fn empty(participant_uuid: ParticipantId) -> Self {
        Self {
            participant_uuid,
            cumulative_difficulty: 0.0,
            completions: 0,
            skips: 0,
            reassignments: 0,
        }
    }

    /// Share of signalled assignments this participant completed.
    ///
    /// `None` until at least one completion or skip is recorded.
    pub fn completion_rate(&self) -> Option<f64> {
        let signalled = self.completions + self.skips;
        if signalled == 0 {
            return None;
        }
        Some(self.completions as f64 / signalled as f64)
    }
}

/// In-memory ledger of every known participant's load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadLedger {
    records: BTreeMap<ParticipantId, LoadRecord>,
}

impl LoadLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from persisted records.
    pub fn from_records(records: Vec<LoadRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.participant_uuid, record))
                .collect(),
        }
    }

    /// Registers a participant with a zeroed record. Idempotent: an
    /// existing record is left untouched.
    pub fn register(&mut self, participant_uuid: ParticipantId) {
        self.records
            .entry(participant_uuid)
            .or_insert_with(|| LoadRecord::empty(participant_uuid));
    }

    /// Drops a participant's record, if present.
    pub fn remove(&mut self, participant_uuid: ParticipantId) {
        self.records.remove(&participant_uuid);
    }

    /// Whether a record exists for this participant.
    pub fn contains(&self, participant_uuid: ParticipantId) -> bool {
        self.records.contains_key(&participant_uuid)
    }

    /// Read access to one record.
    pub fn record(&self, participant_uuid: ParticipantId) -> Option<&LoadRecord> {
        self.records.get(&participant_uuid)
    }

    /// All records in deterministic id order.
    pub fn records(&self) -> impl Iterator<Item = &LoadRecord> {
        self.records.values()
    }

    /// Credits one completed assignment.
    pub fn record_completion(
        &mut self,
        participant_uuid: ParticipantId,
        difficulty: u8,
    ) -> EngineResult<()> {
        let record = self.record_mut(participant_uuid)?;
        record.completions += 1;
        record.cumulative_difficulty += f64::from(difficulty);
        Ok(())
    }

    /// Records one skip. Cumulative difficulty is untouched.
    pub fn record_skip(&mut self, participant_uuid: ParticipantId) -> EngineResult<()> {
        let record = self.record_mut(participant_uuid)?;
        record.skips += 1;
        Ok(())
    }

    /// Records one mid-cycle takeover.
    pub fn record_reassignment(&mut self, participant_uuid: ParticipantId) -> EngineResult<()> {
        let record = self.record_mut(participant_uuid)?;
        record.reassignments += 1;
        Ok(())
    }

    /// Zeroes one participant's record. Admin-only.
    pub fn reset(&mut self, participant_uuid: ParticipantId) -> EngineResult<()> {
        let record = self.record_mut(participant_uuid)?;
        *record = LoadRecord::empty(participant_uuid);
        Ok(())
    }

    /// Zeroes every record. Admin-only.
    pub fn reset_all(&mut self) {
        for (participant_uuid, record) in &mut self.records {
            *record = LoadRecord::empty(*participant_uuid);
        }
    }

    fn record_mut(&mut self, participant_uuid: ParticipantId) -> EngineResult<&mut LoadRecord> {
        self.records
            .get_mut(&participant_uuid)
            .ok_or(EngineError::UnknownParticipant(participant_uuid))
    }
}
