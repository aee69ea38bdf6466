//! Rotation state repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist load records, vacation state, pending overrides, rotas and the
//!   cycle counter.
//! - Hand the rotation service consistent snapshots for engine hydration.
//!
//! # Invariants
//! - Historical rotas are retained; `rota_meta` moves the active pointer.
//! - `next_cycle` is monotonic and survives restarts.
//! - Multi-statement writes run inside immediate transactions.

use crate::db::DbError;
use crate::engine::load_ledger::LoadRecord;
use crate::engine::vacation::VacationState;
use crate::model::chore::{Chore, ChoreId};
use crate::model::participant::{Participant, ParticipantId};
use crate::model::rota::{Assignment, AssignmentStatus, CycleId, WeeklyRota};
use crate::repo::roster_repo::{RosterRepoError, RosterRepository, SqliteRosterRepository};
use crate::repo::{ensure_connection_ready, ReadinessError};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const META_ACTIVE_CYCLE: &str = "active_cycle";
const META_NEXT_CYCLE: &str = "next_cycle";
const FIRST_CYCLE: CycleId = 1;

pub type StateRepoResult<T> = Result<T, StateRepoError>;

/// Errors from rotation state repository operations.
#[derive(Debug)]
pub enum StateRepoError {
    Db(DbError),
    NotReady(ReadinessError),
    Roster(RosterRepoError),
    ParticipantNotFound(ParticipantId),
    AssignmentNotFound { cycle: CycleId, chore_uuid: ChoreId },
    InvalidData(String),
}

impl Display for StateRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotReady(err) => write!(f, "{err}"),
            Self::Roster(err) => write!(f, "{err}"),
            Self::ParticipantNotFound(id) => write!(f, "participant not found: {id}"),
            Self::AssignmentNotFound { cycle, chore_uuid } => {
                write!(f, "assignment not found: cycle {cycle}, chore {chore_uuid}")
            }
            Self::InvalidData(message) => {
                write!(f, "invalid persisted rotation data: {message}")
            }
        }
    }
}

impl Error for StateRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotReady(err) => Some(err),
            Self::Roster(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StateRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ReadinessError> for StateRepoError {
    fn from(value: ReadinessError) -> Self {
        Self::NotReady(value)
    }
}

impl From<RosterRepoError> for StateRepoError {
    fn from(value: RosterRepoError) -> Self {
        Self::Roster(value)
    }
}

impl From<rusqlite::Error> for StateRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for rotation state.
///
/// Roster reads are exposed here as well so the rotation service hydrates
/// its full engine input from one seam.
pub trait RotationStateRepository {
    fn participants(&self) -> StateRepoResult<Vec<Participant>>;
    fn chores(&self) -> StateRepoResult<Vec<Chore>>;
    fn load_records(&self) -> StateRepoResult<Vec<LoadRecord>>;
    fn save_load_records(&self, records: &[LoadRecord]) -> StateRepoResult<()>;
    fn vacation_states(&self) -> StateRepoResult<Vec<(ParticipantId, VacationState)>>;
    fn save_vacation_state(
        &self,
        participant_uuid: ParticipantId,
        state: &VacationState,
    ) -> StateRepoResult<()>;
    fn exclusion_overrides(&self) -> StateRepoResult<Vec<(ParticipantId, bool)>>;
    fn save_exclusion_overrides(&self, overrides: &[(ParticipantId, bool)]) -> StateRepoResult<()>;
    fn next_cycle(&self) -> StateRepoResult<CycleId>;
    fn active_rota(&self) -> StateRepoResult<Option<WeeklyRota>>;
    fn last_scheduled_cycles(&self) -> StateRepoResult<BTreeMap<ChoreId, CycleId>>;
    /// Persists one successful generation atomically: the rota, the moved
    /// active pointer, the advanced cycle counter, the consumed override
    /// set and the post-cycle vacation/ledger state.
    fn commit_generation(
        &self,
        rota: &WeeklyRota,
        next_cycle: CycleId,
        vacations: &[(ParticipantId, VacationState)],
        records: &[LoadRecord],
    ) -> StateRepoResult<()>;
    /// Persists one processed signal atomically: the mutated assignment and
    /// the updated load records.
    fn commit_signal(
        &self,
        cycle: CycleId,
        assignment: &Assignment,
        records: &[LoadRecord],
    ) -> StateRepoResult<()>;
    fn update_assignment(&self, cycle: CycleId, assignment: &Assignment) -> StateRepoResult<()>;
    fn clear_active_rota(&self) -> StateRepoResult<()>;
}

/// SQLite-backed rotation state repository.
pub struct SqliteRotationStateRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRotationStateRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StateRepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                "participants",
                "chores",
                "load_records",
                "exclusion_overrides",
                "rotas",
                "assignments",
                "rota_meta",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl RotationStateRepository for SqliteRotationStateRepository<'_> {
    fn participants(&self) -> StateRepoResult<Vec<Participant>> {
        let roster = SqliteRosterRepository::try_new(self.conn)?;
        Ok(roster.list_participants()?)
    }

    fn chores(&self) -> StateRepoResult<Vec<Chore>> {
        let roster = SqliteRosterRepository::try_new(self.conn)?;
        Ok(roster.list_chores()?)
    }

    fn load_records(&self) -> StateRepoResult<Vec<LoadRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                participant_uuid,
                cumulative_difficulty,
                completions,
                skips,
                reassignments
             FROM load_records
             ORDER BY participant_uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_load_record_row(row)?);
        }
        Ok(records)
    }

    fn save_load_records(&self, records: &[LoadRecord]) -> StateRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        upsert_load_records(&tx, records)?;
        tx.commit()?;
        Ok(())
    }

    fn vacation_states(&self) -> StateRepoResult<Vec<(ParticipantId, VacationState)>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                uuid,
                on_vacation,
                vacation_returned_at,
                bonus_cycles_left
             FROM participants
             ORDER BY uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut states = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            let participant_uuid = parse_uuid(&uuid_text, "participants.uuid")?;
            let state = VacationState {
                on_vacation: int_to_bool(row.get("on_vacation")?, "participants.on_vacation")?,
                returned_at: row.get("vacation_returned_at")?,
                bonus_cycles_left: row.get("bonus_cycles_left")?,
            };
            states.push((participant_uuid, state));
        }
        Ok(states)
    }

    fn save_vacation_state(
        &self,
        participant_uuid: ParticipantId,
        state: &VacationState,
    ) -> StateRepoResult<()> {
        let changed = update_vacation_columns(self.conn, participant_uuid, state)?;
        if changed == 0 {
            return Err(StateRepoError::ParticipantNotFound(participant_uuid));
        }
        Ok(())
    }

    fn exclusion_overrides(&self) -> StateRepoResult<Vec<(ParticipantId, bool)>> {
        let mut stmt = self.conn.prepare(
            "SELECT participant_uuid, included
             FROM exclusion_overrides
             ORDER BY participant_uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut overrides = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get("participant_uuid")?;
            let participant_uuid = parse_uuid(&uuid_text, "exclusion_overrides.participant_uuid")?;
            let included = int_to_bool(row.get("included")?, "exclusion_overrides.included")?;
            overrides.push((participant_uuid, included));
        }
        Ok(overrides)
    }

    fn save_exclusion_overrides(&self, overrides: &[(ParticipantId, bool)]) -> StateRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        replace_exclusion_overrides(&tx, overrides)?;
        tx.commit()?;
        Ok(())
    }

    fn next_cycle(&self) -> StateRepoResult<CycleId> {
        match read_meta(self.conn, META_NEXT_CYCLE)? {
            None => Ok(FIRST_CYCLE),
            Some(value) => parse_cycle(&value, META_NEXT_CYCLE),
        }
    }

    fn active_rota(&self) -> StateRepoResult<Option<WeeklyRota>> {
        let cycle = match read_meta(self.conn, META_ACTIVE_CYCLE)? {
            None => return Ok(None),
            Some(value) => parse_cycle(&value, META_ACTIVE_CYCLE)?,
        };
        let rota = load_rota(self.conn, cycle)?.ok_or_else(|| {
            StateRepoError::InvalidData(format!("active cycle {cycle} has no stored rota"))
        })?;
        Ok(Some(rota))
    }

    fn last_scheduled_cycles(&self) -> StateRepoResult<BTreeMap<ChoreId, CycleId>> {
        let mut stmt = self.conn.prepare(
            "SELECT chore_uuid, MAX(cycle)
             FROM assignments
             GROUP BY chore_uuid;",
        )?;
        let mut rows = stmt.query([])?;
        let mut cycles = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get(0)?;
            let chore_uuid = parse_uuid(&uuid_text, "assignments.chore_uuid")?;
            let cycle: i64 = row.get(1)?;
            cycles.insert(chore_uuid, cycle_from_i64(cycle, "assignments.cycle")?);
        }
        Ok(cycles)
    }

    fn commit_generation(
        &self,
        rota: &WeeklyRota,
        next_cycle: CycleId,
        vacations: &[(ParticipantId, VacationState)],
        records: &[LoadRecord],
    ) -> StateRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO rotas (cycle, created_at) VALUES (?1, ?2);",
            params![cycle_to_i64(rota.cycle), rota.created_at],
        )?;
        for (position, assignment) in rota.assignments.iter().enumerate() {
            tx.execute(
                "INSERT INTO assignments (
                    cycle,
                    chore_uuid,
                    participant_uuid,
                    difficulty,
                    status,
                    position
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    cycle_to_i64(rota.cycle),
                    assignment.chore_uuid.to_string(),
                    assignment.participant_uuid.to_string(),
                    assignment.difficulty,
                    status_to_db(assignment.status),
                    position as i64,
                ],
            )?;
        }

        write_meta(&tx, META_ACTIVE_CYCLE, &rota.cycle.to_string())?;
        write_meta(&tx, META_NEXT_CYCLE, &next_cycle.to_string())?;
        replace_exclusion_overrides(&tx, &[])?;
        for (participant_uuid, state) in vacations {
            update_vacation_columns(&tx, *participant_uuid, state)?;
        }
        upsert_load_records(&tx, records)?;

        tx.commit()?;
        Ok(())
    }

    fn commit_signal(
        &self,
        cycle: CycleId,
        assignment: &Assignment,
        records: &[LoadRecord],
    ) -> StateRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        write_assignment(&tx, cycle, assignment)?;
        upsert_load_records(&tx, records)?;
        tx.commit()?;
        Ok(())
    }

    fn update_assignment(&self, cycle: CycleId, assignment: &Assignment) -> StateRepoResult<()> {
        write_assignment(self.conn, cycle, assignment)
    }

    fn clear_active_rota(&self) -> StateRepoResult<()> {
        self.conn.execute(
            "DELETE FROM rota_meta WHERE key = ?1;",
            [META_ACTIVE_CYCLE],
        )?;
        Ok(())
    }
}

fn load_rota(conn: &Connection, cycle: CycleId) -> StateRepoResult<Option<WeeklyRota>> {
    let created_at: Option<i64> = conn
        .query_row(
            "SELECT created_at FROM rotas WHERE cycle = ?1;",
            [cycle_to_i64(cycle)],
            |row| row.get(0),
        )
        .optional()?;
    let Some(created_at) = created_at else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT
            chore_uuid,
            participant_uuid,
            difficulty,
            status
         FROM assignments
         WHERE cycle = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([cycle_to_i64(cycle)])?;
    let mut assignments = Vec::new();
    while let Some(row) = rows.next()? {
        assignments.push(parse_assignment_row(row)?);
    }

    Ok(Some(WeeklyRota {
        cycle,
        created_at,
        assignments,
    }))
}

fn write_assignment(
    conn: &Connection,
    cycle: CycleId,
    assignment: &Assignment,
) -> StateRepoResult<()> {
    let changed = conn.execute(
        "UPDATE assignments
         SET participant_uuid = ?3,
             status = ?4
         WHERE cycle = ?1
           AND chore_uuid = ?2;",
        params![
            cycle_to_i64(cycle),
            assignment.chore_uuid.to_string(),
            assignment.participant_uuid.to_string(),
            status_to_db(assignment.status),
        ],
    )?;
    if changed == 0 {
        return Err(StateRepoError::AssignmentNotFound {
            cycle,
            chore_uuid: assignment.chore_uuid,
        });
    }
    Ok(())
}

fn upsert_load_records(conn: &Connection, records: &[LoadRecord]) -> StateRepoResult<()> {
    for record in records {
        conn.execute(
            "INSERT INTO load_records (
                participant_uuid,
                cumulative_difficulty,
                completions,
                skips,
                reassignments
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(participant_uuid) DO UPDATE SET
                cumulative_difficulty = excluded.cumulative_difficulty,
                completions = excluded.completions,
                skips = excluded.skips,
                reassignments = excluded.reassignments;",
            params![
                record.participant_uuid.to_string(),
                record.cumulative_difficulty,
                count_to_i64(record.completions, "load_records.completions")?,
                count_to_i64(record.skips, "load_records.skips")?,
                count_to_i64(record.reassignments, "load_records.reassignments")?,
            ],
        )?;
    }
    Ok(())
}

fn replace_exclusion_overrides(
    conn: &Connection,
    overrides: &[(ParticipantId, bool)],
) -> StateRepoResult<()> {
    conn.execute("DELETE FROM exclusion_overrides;", [])?;
    for (participant_uuid, included) in overrides {
        conn.execute(
            "INSERT INTO exclusion_overrides (participant_uuid, included)
             VALUES (?1, ?2);",
            params![participant_uuid.to_string(), bool_to_int(*included)],
        )?;
    }
    Ok(())
}

fn update_vacation_columns(
    conn: &Connection,
    participant_uuid: ParticipantId,
    state: &VacationState,
) -> StateRepoResult<usize> {
    let changed = conn.execute(
        "UPDATE participants
         SET on_vacation = ?2,
             vacation_returned_at = ?3,
             bonus_cycles_left = ?4,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?1;",
        params![
            participant_uuid.to_string(),
            bool_to_int(state.on_vacation),
            state.returned_at,
            state.bonus_cycles_left,
        ],
    )?;
    Ok(changed)
}

fn read_meta(conn: &Connection, key: &str) -> StateRepoResult<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM rota_meta WHERE key = ?1;", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

fn write_meta(conn: &Connection, key: &str, value: &str) -> StateRepoResult<()> {
    conn.execute(
        "INSERT INTO rota_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
        params![key, value],
    )?;
    Ok(())
}

fn parse_load_record_row(row: &Row<'_>) -> StateRepoResult<LoadRecord> {
    let uuid_text: String = row.get("participant_uuid")?;
    let participant_uuid = parse_uuid(&uuid_text, "load_records.participant_uuid")?;
    Ok(LoadRecord {
        participant_uuid,
        cumulative_difficulty: row.get("cumulative_difficulty")?,
        completions: count_from_i64(row.get("completions")?, "load_records.completions")?,
        skips: count_from_i64(row.get("skips")?, "load_records.skips")?,
        reassignments: count_from_i64(row.get("reassignments")?, "load_records.reassignments")?,
    })
}

fn parse_assignment_row(row: &Row<'_>) -> StateRepoResult<Assignment> {
    let chore_text: String = row.get("chore_uuid")?;
    let participant_text: String = row.get("participant_uuid")?;
    let status_text: String = row.get("status")?;
    let status = parse_status(&status_text).ok_or_else(|| {
        StateRepoError::InvalidData(format!(
            "invalid status `{status_text}` in assignments.status"
        ))
    })?;

    Ok(Assignment {
        chore_uuid: parse_uuid(&chore_text, "assignments.chore_uuid")?,
        participant_uuid: parse_uuid(&participant_text, "assignments.participant_uuid")?,
        difficulty: row.get("difficulty")?,
        status,
    })
}

fn status_to_db(status: AssignmentStatus) -> &'static str {
    match status {
        AssignmentStatus::Pending => "pending",
        AssignmentStatus::Completed => "completed",
        AssignmentStatus::Skipped => "skipped",
    }
}

fn parse_status(value: &str) -> Option<AssignmentStatus> {
    match value {
        "pending" => Some(AssignmentStatus::Pending),
        "completed" => Some(AssignmentStatus::Completed),
        "skipped" => Some(AssignmentStatus::Skipped),
        _ => None,
    }
}

fn parse_cycle(value: &str, key: &'static str) -> StateRepoResult<CycleId> {
    value.parse().map_err(|_| {
        StateRepoError::InvalidData(format!("invalid cycle value `{value}` in rota_meta.{key}"))
    })
}

fn cycle_to_i64(cycle: CycleId) -> i64 {
    // Cycle counters advance once per week; i64 will not saturate.
    cycle as i64
}

fn cycle_from_i64(value: i64, column: &'static str) -> StateRepoResult<CycleId> {
    CycleId::try_from(value).map_err(|_| {
        StateRepoError::InvalidData(format!("invalid cycle value `{value}` in {column}"))
    })
}

fn count_to_i64(value: u64, column: &'static str) -> StateRepoResult<i64> {
    i64::try_from(value).map_err(|_| {
        StateRepoError::InvalidData(format!("counter value `{value}` overflows {column}"))
    })
}

fn count_from_i64(value: i64, column: &'static str) -> StateRepoResult<u64> {
    u64::try_from(value).map_err(|_| {
        StateRepoError::InvalidData(format!("invalid counter value `{value}` in {column}"))
    })
}

fn parse_uuid(value: &str, column: &'static str) -> StateRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| StateRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn int_to_bool(value: i64, column: &'static str) -> StateRepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StateRepoError::InvalidData(format!(
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
