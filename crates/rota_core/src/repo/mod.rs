//! Persistence boundary: repository traits and SQLite implementations.
//!
//! # Responsibility
//! - Keep SQL details behind trait seams the services consume.
//! - Guard repository construction against unmigrated connections.
//!
//! # Invariants
//! - Repositories operate only on connections at the latest schema version.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod roster_repo;
pub mod state_repo;

/// Connection readiness failures shared by the repositories.
#[derive(Debug)]
pub enum ReadinessError {
    Db(DbError),
    SchemaVersionMismatch { expected: u32, actual: u32 },
    MissingRequiredTable(&'static str),
}

impl Display for ReadinessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::SchemaVersionMismatch { expected, actual } => write!(
                f,
                "repository requires schema version {expected}, got {actual}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
        }
    }
}

impl Error for ReadinessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::SchemaVersionMismatch { .. } => None,
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for ReadinessError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    required_tables: &[&'static str],
) -> Result<(), ReadinessError> {
    let expected = latest_version();
    let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual != expected {
        return Err(ReadinessError::SchemaVersionMismatch { expected, actual });
    }

    for table in required_tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [*table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(ReadinessError::MissingRequiredTable(table));
        }
    }

    Ok(())
}
