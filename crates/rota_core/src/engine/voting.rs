//! Difficulty vote sessions.
//!
//! # Responsibility
//! - Run per-chore voting sessions and resolve them deterministically.
//!
//! # Invariants
//! - At most one open session per chore; sessions for different chores may
//!   run concurrently.
//! - Resolution is the mode with ties broken toward the higher value, never
//!   map-iteration order.

use crate::engine::{EngineError, EngineResult};
use crate::model::chore::{ChoreId, DIFFICULTY_MAX, DIFFICULTY_MIN};
use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One open voting session for one chore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSession {
    /// Chore whose difficulty is being voted on.
    pub chore_uuid: ChoreId,
    /// Cast votes; the last vote per participant wins.
    pub votes: BTreeMap<ParticipantId, u8>,
    /// Unix epoch milliseconds when the session opened.
    pub opened_at: i64,
    /// Intended window length. The trigger layer watches the clock and
    /// closes the session; the core never does.
    pub window_ms: i64,
}

impl VoteSession {
    /// When the trigger layer should close this session.
    pub fn closes_at(&self) -> i64 {
        self.opened_at.saturating_add(self.window_ms)
    }
}

/// All open sessions, keyed by chore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DifficultyVotes {
    sessions: BTreeMap<ChoreId, VoteSession>,
}

impl DifficultyVotes {
    /// Creates an aggregator with no open sessions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to one open session.
    pub fn session(&self, chore_uuid: ChoreId) -> Option<&VoteSession> {
        self.sessions.get(&chore_uuid)
    }

    /// Whether a session is open for this chore.
    pub fn is_open(&self, chore_uuid: ChoreId) -> bool {
        self.sessions.contains_key(&chore_uuid)
    }

    /// Opens a voting session for one chore.
    pub fn open(&mut self, chore_uuid: ChoreId, now_ms: i64, window_ms: i64) -> EngineResult<()> {
        if self.sessions.contains_key(&chore_uuid) {
            return Err(EngineError::VoteAlreadyOpen(chore_uuid));
        }
        self.sessions.insert(
            chore_uuid,
            VoteSession {
                chore_uuid,
                votes: BTreeMap::new(),
                opened_at: now_ms,
                window_ms,
            },
        );
        Ok(())
    }

    /// Casts one vote. A participant's later vote overwrites their earlier
    /// one.
    pub fn cast(
        &mut self,
        chore_uuid: ChoreId,
        participant_uuid: ParticipantId,
        value: u8,
    ) -> EngineResult<()> {
        let session = self
            .sessions
            .get_mut(&chore_uuid)
            .ok_or(EngineError::VoteNotOpen(chore_uuid))?;
        if !(DIFFICULTY_MIN..=DIFFICULTY_MAX).contains(&value) {
            return Err(EngineError::InvalidDifficulty(value));
        }
        session.votes.insert(participant_uuid, value);
        Ok(())
    }

    /// Drops any open session for this chore without resolving it.
    ///
    /// Used when the chore itself disappears mid-vote.
    pub fn discard(&mut self, chore_uuid: ChoreId) {
        self.sessions.remove(&chore_uuid);
    }

    /// Closes the session and resolves its difficulty.
    ///
    /// The session ends even when no votes were cast: `NoVotes` reports
    /// that outcome without wedging the chore behind a dead session, and
    /// the chore keeps its current difficulty.
    pub fn close(&mut self, chore_uuid: ChoreId) -> EngineResult<u8> {
        let session = self
            .sessions
            .remove(&chore_uuid)
            .ok_or(EngineError::VoteNotOpen(chore_uuid))?;
        resolve_votes(&session.votes).ok_or(EngineError::NoVotes(chore_uuid))
    }
}

/// Mode of the cast values; ties resolve toward the higher value.
fn resolve_votes(votes: &BTreeMap<ParticipantId, u8>) -> Option<u8> {
    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for value in votes.values() {
        *counts.entry(*value).or_insert(0) += 1;
    }

    // Ascending key order: an equal count on a higher value wins the tie.
    let mut resolved = None;
    let mut best = 0usize;
    for (value, count) in counts {
        if count >= best {
            best = count;
            resolved = Some(value);
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::DifficultyVotes;
    use crate::engine::EngineError;
    use uuid::Uuid;

    fn chore() -> Uuid {
        Uuid::parse_str("00000000-0000-4000-8000-00000000000a").unwrap()
    }

    fn voter(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn mode_tie_resolves_toward_higher_value() {
        let mut votes = DifficultyVotes::new();
        votes.open(chore(), 0, 60_000).unwrap();
        votes.cast(chore(), voter(1), 1).unwrap();
        votes.cast(chore(), voter(2), 1).unwrap();
        votes.cast(chore(), voter(3), 3).unwrap();
        votes.cast(chore(), voter(4), 3).unwrap();
        votes.cast(chore(), voter(5), 2).unwrap();

        assert_eq!(votes.close(chore()), Ok(3));
    }

    #[test]
    fn last_vote_per_participant_wins() {
        let mut votes = DifficultyVotes::new();
        votes.open(chore(), 0, 60_000).unwrap();
        votes.cast(chore(), voter(1), 5).unwrap();
        votes.cast(chore(), voter(1), 2).unwrap();

        assert_eq!(votes.close(chore()), Ok(2));
    }

    #[test]
    fn reopening_an_open_session_is_rejected() {
        let mut votes = DifficultyVotes::new();
        votes.open(chore(), 0, 60_000).unwrap();
        assert_eq!(
            votes.open(chore(), 1, 60_000),
            Err(EngineError::VoteAlreadyOpen(chore()))
        );
    }

    #[test]
    fn casting_without_a_session_is_rejected() {
        let mut votes = DifficultyVotes::new();
        assert_eq!(
            votes.cast(chore(), voter(1), 3),
            Err(EngineError::VoteNotOpen(chore()))
        );
    }

    #[test]
    fn out_of_range_vote_is_rejected() {
        let mut votes = DifficultyVotes::new();
        votes.open(chore(), 0, 60_000).unwrap();
        assert_eq!(
            votes.cast(chore(), voter(1), 6),
            Err(EngineError::InvalidDifficulty(6))
        );
        assert_eq!(
            votes.cast(chore(), voter(1), 0),
            Err(EngineError::InvalidDifficulty(0))
        );
    }

    #[test]
    fn empty_close_reports_no_votes_and_ends_the_session() {
        let mut votes = DifficultyVotes::new();
        votes.open(chore(), 0, 60_000).unwrap();
        assert_eq!(votes.close(chore()), Err(EngineError::NoVotes(chore())));
        assert!(!votes.is_open(chore()));
        // A fresh session can open immediately afterwards.
        votes.open(chore(), 1, 60_000).unwrap();
    }

    #[test]
    fn sessions_for_different_chores_run_concurrently() {
        let other = Uuid::parse_str("00000000-0000-4000-8000-00000000000b").unwrap();
        let mut votes = DifficultyVotes::new();
        votes.open(chore(), 0, 60_000).unwrap();
        votes.open(other, 0, 60_000).unwrap();
        votes.cast(chore(), voter(1), 4).unwrap();
        votes.cast(other, voter(1), 2).unwrap();

        assert_eq!(votes.close(chore()), Ok(4));
        assert_eq!(votes.close(other), Ok(2));
    }
}
