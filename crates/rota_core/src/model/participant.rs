//! Participant domain model.
//!
//! # Responsibility
//! - Define the roster member record consumed by the assignment engine.
//! - Validate display names at the construction boundary.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another participant.
//! - Vacation fields change only through the vacation tracking path, never
//!   by direct admin edits.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one roster member.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ParticipantId = Uuid;

/// Validation failures for participant construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantValidationError {
    /// Display name is empty after trimming.
    BlankDisplayName,
}

impl Display for ParticipantValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankDisplayName => write!(f, "participant display name must not be blank"),
        }
    }
}

impl Error for ParticipantValidationError {}

/// Roster member record.
///
/// `on_vacation` and `vacation_returned_at` mirror the vacation tracker and
/// are loaded from the same storage row, so a snapshot handed to the engine
/// is always internally consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable global ID used for assignment and stats linkage.
    pub uuid: ParticipantId,
    /// User-facing label; never used as identity.
    pub display_name: String,
    /// Current unavailability flag.
    pub on_vacation: bool,
    /// Unix epoch milliseconds of the most recent vacation return.
    pub vacation_returned_at: Option<i64>,
}

impl Participant {
    /// Creates a participant with a generated stable ID.
    pub fn new(display_name: impl Into<String>) -> Result<Self, ParticipantValidationError> {
        Self::with_id(Uuid::new_v4(), display_name)
    }

    /// Creates a participant with a caller-provided stable ID.
    ///
    /// Used by storage and import paths where identity already exists.
    pub fn with_id(
        uuid: ParticipantId,
        display_name: impl Into<String>,
    ) -> Result<Self, ParticipantValidationError> {
        let display_name = normalize_display_name(display_name.into())?;
        Ok(Self {
            uuid,
            display_name,
            on_vacation: false,
            vacation_returned_at: None,
        })
    }
}

/// Trims surrounding whitespace and rejects blank names.
pub fn normalize_display_name(raw: String) -> Result<String, ParticipantValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParticipantValidationError::BlankDisplayName);
    }
    Ok(trimmed.to_string())
}
