//! Roster administration and difficulty-vote use-case service.
//!
//! # Responsibility
//! - Provide participant/chore admin APIs above the roster repository.
//! - Run the difficulty vote lifecycle and persist resolved values.
//!
//! # Invariants
//! - Ids are validated against persisted state before any mutation.
//! - Vote sessions are process-transient; only resolved difficulties are
//!   persisted.

use crate::engine::voting::{DifficultyVotes, VoteSession};
use crate::engine::EngineError;
use crate::model::chore::{Chore, ChoreId};
use crate::model::participant::{Participant, ParticipantId};
use crate::repo::roster_repo::{RosterRepoError, RosterRepository};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RosterServiceResult<T> = Result<T, RosterServiceError>;

/// Errors from roster service operations.
#[derive(Debug)]
pub enum RosterServiceError {
    /// Vote lifecycle misuse or invalid vote value.
    Vote(EngineError),
    /// Persistence-layer failure, including model validation.
    Repo(RosterRepoError),
}

impl Display for RosterServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vote(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RosterServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Vote(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<EngineError> for RosterServiceError {
    fn from(value: EngineError) -> Self {
        Self::Vote(value)
    }
}

impl From<RosterRepoError> for RosterServiceError {
    fn from(value: RosterRepoError) -> Self {
        Self::Repo(value)
    }
}

/// Roster service facade over repository implementations.
pub struct RosterService<R: RosterRepository> {
    repo: R,
    votes: DifficultyVotes,
}

impl<R: RosterRepository> RosterService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            votes: DifficultyVotes::new(),
        }
    }

    /// Registers one participant by display name.
    pub fn add_participant(
        &mut self,
        display_name: impl Into<String>,
    ) -> RosterServiceResult<Participant> {
        let participant = Participant::new(display_name)
            .map_err(|err| RosterServiceError::Repo(RosterRepoError::Participant(err)))?;
        self.repo.create_participant(&participant)?;
        Ok(participant)
    }

    /// Renames one participant.
    pub fn rename_participant(
        &mut self,
        participant_uuid: ParticipantId,
        display_name: &str,
    ) -> RosterServiceResult<()> {
        self.repo
            .rename_participant(participant_uuid, display_name)
            .map_err(Into::into)
    }

    /// Removes one participant; their load record goes with them.
    pub fn remove_participant(
        &mut self,
        participant_uuid: ParticipantId,
    ) -> RosterServiceResult<()> {
        self.repo
            .remove_participant(participant_uuid)
            .map_err(Into::into)
    }

    /// Registers one weekly chore.
    pub fn add_chore(
        &mut self,
        name: impl Into<String>,
        difficulty: u8,
    ) -> RosterServiceResult<Chore> {
        let chore = Chore::new(name, difficulty)
            .map_err(|err| RosterServiceError::Repo(RosterRepoError::Chore(err)))?;
        self.repo.create_chore(&chore)?;
        Ok(chore)
    }

    /// Renames one chore.
    pub fn rename_chore(&mut self, chore_uuid: ChoreId, name: &str) -> RosterServiceResult<()> {
        self.repo.rename_chore(chore_uuid, name).map_err(Into::into)
    }

    /// Sets a chore's difficulty directly (admin path).
    pub fn set_difficulty(
        &mut self,
        chore_uuid: ChoreId,
        difficulty: u8,
    ) -> RosterServiceResult<()> {
        self.repo
            .set_difficulty(chore_uuid, difficulty)
            .map_err(Into::into)
    }

    /// Sets a chore's cadence in cycles.
    pub fn set_frequency(&mut self, chore_uuid: ChoreId, frequency: u32) -> RosterServiceResult<()> {
        self.repo
            .set_frequency(chore_uuid, frequency)
            .map_err(Into::into)
    }

    /// Removes one chore and discards any open vote session for it.
    pub fn remove_chore(&mut self, chore_uuid: ChoreId) -> RosterServiceResult<()> {
        self.repo.remove_chore(chore_uuid)?;
        self.votes.discard(chore_uuid);
        Ok(())
    }

    /// Lists the participant roster.
    pub fn list_participants(&self) -> RosterServiceResult<Vec<Participant>> {
        self.repo.list_participants().map_err(Into::into)
    }

    /// Lists the chore roster.
    pub fn list_chores(&self) -> RosterServiceResult<Vec<Chore>> {
        self.repo.list_chores().map_err(Into::into)
    }

    /// Opens a difficulty vote for one chore.
    pub fn open_vote(
        &mut self,
        chore_uuid: ChoreId,
        now_ms: i64,
        window_ms: i64,
    ) -> RosterServiceResult<()> {
        self.ensure_chore_exists(chore_uuid)?;
        self.votes.open(chore_uuid, now_ms, window_ms)?;
        Ok(())
    }

    /// Casts one vote; a participant's later vote replaces their earlier one.
    pub fn cast_vote(
        &mut self,
        chore_uuid: ChoreId,
        participant_uuid: ParticipantId,
        value: u8,
    ) -> RosterServiceResult<()> {
        self.ensure_participant_exists(participant_uuid)?;
        self.votes.cast(chore_uuid, participant_uuid, value)?;
        Ok(())
    }

    /// Closes the vote and persists the resolved difficulty.
    ///
    /// An empty session still ends, surfacing `NoVotes` and leaving the
    /// chore's difficulty unchanged.
    pub fn close_vote(&mut self, chore_uuid: ChoreId) -> RosterServiceResult<u8> {
        self.ensure_chore_exists(chore_uuid)?;
        let resolved = match self.votes.close(chore_uuid) {
            Ok(value) => value,
            Err(err) => {
                error!(
                    "event=vote_close module=roster status=error chore={chore_uuid} error_code=vote_unresolved error={err}"
                );
                return Err(err.into());
            }
        };
        self.repo.set_difficulty(chore_uuid, resolved)?;
        info!(
            "event=vote_close module=roster status=ok chore={chore_uuid} difficulty={resolved}"
        );
        Ok(resolved)
    }

    /// Read access to one open vote session.
    pub fn vote_session(&self, chore_uuid: ChoreId) -> Option<&VoteSession> {
        self.votes.session(chore_uuid)
    }

    fn ensure_chore_exists(&self, chore_uuid: ChoreId) -> RosterServiceResult<()> {
        self.repo
            .get_chore(chore_uuid)?
            .map(|_| ())
            .ok_or(RosterServiceError::Repo(RosterRepoError::ChoreNotFound(
                chore_uuid,
            )))
    }

    fn ensure_participant_exists(
        &self,
        participant_uuid: ParticipantId,
    ) -> RosterServiceResult<()> {
        self.repo.get_participant(participant_uuid)?.map(|_| ()).ok_or(
            RosterServiceError::Repo(RosterRepoError::ParticipantNotFound(participant_uuid)),
        )
    }
}
