//! Roster repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide participant and chore CRUD over canonical roster storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate model invariants before SQL mutations.
//! - Display names and chore names stay unique within the roster.
//! - Vacation columns are read here but written only by the rotation state
//!   repository.

use crate::db::DbError;
use crate::model::chore::{
    ensure_difficulty, ensure_frequency, normalize_chore_name, Chore, ChoreId,
    ChoreValidationError,
};
use crate::model::participant::{
    normalize_display_name, Participant, ParticipantId, ParticipantValidationError,
};
use crate::repo::{ensure_connection_ready, ReadinessError};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PARTICIPANT_SELECT_SQL: &str = "SELECT
    uuid,
    display_name,
    on_vacation,
    vacation_returned_at
FROM participants";

const CHORE_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    difficulty,
    frequency
FROM chores";

pub type RosterRepoResult<T> = Result<T, RosterRepoError>;

/// Errors from roster repository operations.
#[derive(Debug)]
pub enum RosterRepoError {
    Participant(ParticipantValidationError),
    Chore(ChoreValidationError),
    Db(DbError),
    NotReady(ReadinessError),
    ParticipantNotFound(ParticipantId),
    ChoreNotFound(ChoreId),
    DuplicateParticipantName(String),
    DuplicateChoreName(String),
    InvalidData(String),
}

impl Display for RosterRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Participant(err) => write!(f, "{err}"),
            Self::Chore(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotReady(err) => write!(f, "{err}"),
            Self::ParticipantNotFound(id) => write!(f, "participant not found: {id}"),
            Self::ChoreNotFound(id) => write!(f, "chore not found: {id}"),
            Self::DuplicateParticipantName(name) => {
                write!(f, "participant name already in use: `{name}`")
            }
            Self::DuplicateChoreName(name) => write!(f, "chore name already in use: `{name}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted roster data: {message}"),
        }
    }
}

impl Error for RosterRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Participant(err) => Some(err),
            Self::Chore(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotReady(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParticipantValidationError> for RosterRepoError {
    fn from(value: ParticipantValidationError) -> Self {
        Self::Participant(value)
    }
}

impl From<ChoreValidationError> for RosterRepoError {
    fn from(value: ChoreValidationError) -> Self {
        Self::Chore(value)
    }
}

impl From<DbError> for RosterRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ReadinessError> for RosterRepoError {
    fn from(value: ReadinessError) -> Self {
        Self::NotReady(value)
    }
}

impl From<rusqlite::Error> for RosterRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for roster administration.
pub trait RosterRepository {
    fn create_participant(&self, participant: &Participant) -> RosterRepoResult<ParticipantId>;
    fn get_participant(&self, id: ParticipantId) -> RosterRepoResult<Option<Participant>>;
    fn list_participants(&self) -> RosterRepoResult<Vec<Participant>>;
    fn rename_participant(&self, id: ParticipantId, display_name: &str) -> RosterRepoResult<()>;
    fn remove_participant(&self, id: ParticipantId) -> RosterRepoResult<()>;
    fn create_chore(&self, chore: &Chore) -> RosterRepoResult<ChoreId>;
    fn get_chore(&self, id: ChoreId) -> RosterRepoResult<Option<Chore>>;
    fn list_chores(&self) -> RosterRepoResult<Vec<Chore>>;
    fn rename_chore(&self, id: ChoreId, name: &str) -> RosterRepoResult<()>;
    fn set_difficulty(&self, id: ChoreId, difficulty: u8) -> RosterRepoResult<()>;
    fn set_frequency(&self, id: ChoreId, frequency: u32) -> RosterRepoResult<()>;
    fn remove_chore(&self, id: ChoreId) -> RosterRepoResult<()>;
}

/// SQLite-backed roster repository.
pub struct SqliteRosterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRosterRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RosterRepoResult<Self> {
        ensure_connection_ready(conn, &["participants", "chores"])?;
        Ok(Self { conn })
    }
}

impl RosterRepository for SqliteRosterRepository<'_> {
    fn create_participant(&self, participant: &Participant) -> RosterRepoResult<ParticipantId> {
        let name = normalize_display_name(participant.display_name.clone())?;
        if participant_name_in_use(self.conn, &name, None)? {
            return Err(RosterRepoError::DuplicateParticipantName(name));
        }

        self.conn.execute(
            "INSERT INTO participants (
                uuid,
                display_name,
                on_vacation,
                vacation_returned_at
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                participant.uuid.to_string(),
                name,
                bool_to_int(participant.on_vacation),
                participant.vacation_returned_at,
            ],
        )?;

        Ok(participant.uuid)
    }

    fn get_participant(&self, id: ParticipantId) -> RosterRepoResult<Option<Participant>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARTICIPANT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_participant_row(row)?));
        }
        Ok(None)
    }

    fn list_participants(&self) -> RosterRepoResult<Vec<Participant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PARTICIPANT_SELECT_SQL} ORDER BY display_name ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut participants = Vec::new();
        while let Some(row) = rows.next()? {
            participants.push(parse_participant_row(row)?);
        }
        Ok(participants)
    }

    fn rename_participant(&self, id: ParticipantId, display_name: &str) -> RosterRepoResult<()> {
        let name = normalize_display_name(display_name.to_string())?;
        if participant_name_in_use(self.conn, &name, Some(id))? {
            return Err(RosterRepoError::DuplicateParticipantName(name));
        }

        let changed = self.conn.execute(
            "UPDATE participants
             SET display_name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), name],
        )?;
        if changed == 0 {
            return Err(RosterRepoError::ParticipantNotFound(id));
        }
        Ok(())
    }

    fn remove_participant(&self, id: ParticipantId) -> RosterRepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM participants WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RosterRepoError::ParticipantNotFound(id));
        }
        Ok(())
    }

    fn create_chore(&self, chore: &Chore) -> RosterRepoResult<ChoreId> {
        let name = normalize_chore_name(chore.name.clone())?;
        ensure_difficulty(chore.difficulty)?;
        ensure_frequency(chore.frequency)?;
        if chore_name_in_use(self.conn, &name, None)? {
            return Err(RosterRepoError::DuplicateChoreName(name));
        }

        self.conn.execute(
            "INSERT INTO chores (
                uuid,
                name,
                difficulty,
                frequency
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                chore.uuid.to_string(),
                name,
                chore.difficulty,
                chore.frequency,
            ],
        )?;

        Ok(chore.uuid)
    }

    fn get_chore(&self, id: ChoreId) -> RosterRepoResult<Option<Chore>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHORE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_chore_row(row)?));
        }
        Ok(None)
    }

    fn list_chores(&self) -> RosterRepoResult<Vec<Chore>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHORE_SELECT_SQL} ORDER BY name ASC, uuid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut chores = Vec::new();
        while let Some(row) = rows.next()? {
            chores.push(parse_chore_row(row)?);
        }
        Ok(chores)
    }

    fn rename_chore(&self, id: ChoreId, name: &str) -> RosterRepoResult<()> {
        let name = normalize_chore_name(name.to_string())?;
        if chore_name_in_use(self.conn, &name, Some(id))? {
            return Err(RosterRepoError::DuplicateChoreName(name));
        }

        let changed = self.conn.execute(
            "UPDATE chores
             SET name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), name],
        )?;
        if changed == 0 {
            return Err(RosterRepoError::ChoreNotFound(id));
        }
        Ok(())
    }

    fn set_difficulty(&self, id: ChoreId, difficulty: u8) -> RosterRepoResult<()> {
        ensure_difficulty(difficulty)?;
        let changed = self.conn.execute(
            "UPDATE chores
             SET difficulty = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), difficulty],
        )?;
        if changed == 0 {
            return Err(RosterRepoError::ChoreNotFound(id));
        }
        Ok(())
    }

    fn set_frequency(&self, id: ChoreId, frequency: u32) -> RosterRepoResult<()> {
        ensure_frequency(frequency)?;
        let changed = self.conn.execute(
            "UPDATE chores
             SET frequency = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), frequency],
        )?;
        if changed == 0 {
            return Err(RosterRepoError::ChoreNotFound(id));
        }
        Ok(())
    }

    fn remove_chore(&self, id: ChoreId) -> RosterRepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM chores WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RosterRepoError::ChoreNotFound(id));
        }
        Ok(())
    }
}

fn participant_name_in_use(
    conn: &Connection,
    name: &str,
    exclude: Option<ParticipantId>,
) -> RosterRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM participants
            WHERE display_name = ?1
              AND uuid != COALESCE(?2, '')
        );",
        params![name, exclude.map(|id| id.to_string())],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn chore_name_in_use(
    conn: &Connection,
    name: &str,
    exclude: Option<ChoreId>,
) -> RosterRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM chores
            WHERE name = ?1
              AND uuid != COALESCE(?2, '')
        );",
        params![name, exclude.map(|id| id.to_string())],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_participant_row(row: &Row<'_>) -> RosterRepoResult<Participant> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "participants.uuid")?;
    let display_name: String = row.get("display_name")?;
    let on_vacation = int_to_bool(row.get("on_vacation")?, "participants.on_vacation")?;

    let mut participant = Participant::with_id(uuid, display_name)
        .map_err(|err| RosterRepoError::InvalidData(err.to_string()))?;
    participant.on_vacation = on_vacation;
    participant.vacation_returned_at = row.get("vacation_returned_at")?;
    Ok(participant)
}

fn parse_chore_row(row: &Row<'_>) -> RosterRepoResult<Chore> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "chores.uuid")?;
    let name: String = row.get("name")?;
    let difficulty: u8 = row.get("difficulty")?;
    let frequency: u32 = row.get("frequency")?;

    Chore::with_id(uuid, name, difficulty)
        .and_then(|chore| chore.with_frequency(frequency))
        .map_err(|err| RosterRepoError::InvalidData(err.to_string()))
}

fn parse_uuid(value: &str, column: &'static str) -> RosterRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RosterRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn int_to_bool(value: i64, column: &'static str) -> RosterRepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RosterRepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
