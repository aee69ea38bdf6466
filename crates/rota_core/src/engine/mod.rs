//! Fairness engine: scoring, stateful leaves, assignment and signals.
//!
//! # Responsibility
//! - Own the deterministic weekly assignment algorithm and its inputs.
//! - Keep every component pure: no clock reads, no I/O, no logging.
//!
//! # Invariants
//! - Iteration orders are deterministic (`BTreeMap` keys, sorted vectors).
//! - A failed operation leaves no partial mutation behind.

pub mod assignment;
pub mod completion;
pub mod exclusion;
pub mod load_ledger;
pub mod scoring;
pub mod vacation;
pub mod voting;

use crate::model::chore::{ChoreId, DIFFICULTY_MAX, DIFFICULTY_MIN};
use crate::model::participant::ParticipantId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type shared by engine components.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors produced by engine components.
///
/// Each value is terminal for the one requested operation only; callers may
/// keep using the same state afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Vacation plus exclusion filtering removed every participant.
    NoEligibleParticipants,
    /// Referenced participant does not exist in the consulted state.
    UnknownParticipant(ParticipantId),
    /// Referenced chore does not exist in the consulted state.
    UnknownChore(ChoreId),
    /// Difficulty or vote value outside the 1..=5 scale.
    InvalidDifficulty(u8),
    /// A difficulty vote session is already open for this chore.
    VoteAlreadyOpen(ChoreId),
    /// No difficulty vote session is open for this chore.
    VoteNotOpen(ChoreId),
    /// The vote session closed without a single cast vote.
    NoVotes(ChoreId),
    /// No rota is currently active.
    NoActiveRota,
    /// Only the current assignee may skip an assignment.
    NotCurrentAssignee {
        chore_uuid: ChoreId,
        actor: ParticipantId,
    },
    /// The assignment was already completed or skipped.
    AssignmentNotPending(ChoreId),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoEligibleParticipants => write!(
                f,
                "no eligible participants remain after vacation and exclusion filtering"
            ),
            Self::UnknownParticipant(id) => write!(f, "unknown participant: {id}"),
            Self::UnknownChore(id) => write!(f, "unknown chore: {id}"),
            Self::InvalidDifficulty(value) => write!(
                f,
                "difficulty value {value} is outside {DIFFICULTY_MIN}..={DIFFICULTY_MAX}"
            ),
            Self::VoteAlreadyOpen(id) => {
                write!(f, "a difficulty vote is already open for chore {id}")
            }
            Self::VoteNotOpen(id) => write!(f, "no difficulty vote is open for chore {id}"),
            Self::NoVotes(id) => write!(f, "difficulty vote for chore {id} closed without votes"),
            Self::NoActiveRota => write!(f, "no rota is currently active"),
            Self::NotCurrentAssignee { chore_uuid, actor } => write!(
                f,
                "participant {actor} is not the current assignee of chore {chore_uuid}"
            ),
            Self::AssignmentNotPending(id) => {
                write!(f, "assignment for chore {id} is no longer pending")
            }
        }
    }
}

impl Error for EngineError {}
