//! Chore domain model.
//!
//! # Responsibility
//! - Define the weighted recurring task record and its validation rules.
//!
//! # Invariants
//! - `difficulty` stays within the 1..=5 scale.
//! - `frequency` is a cadence in cycles and is at least 1.
//! - Chore names are non-blank; uniqueness is enforced by the roster store.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one chore.
pub type ChoreId = Uuid;

/// Lowest allowed difficulty weight.
pub const DIFFICULTY_MIN: u8 = 1;
/// Highest allowed difficulty weight.
pub const DIFFICULTY_MAX: u8 = 5;

/// Validation failures for chore construction and mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoreValidationError {
    /// Chore name is empty after trimming.
    BlankName,
    /// Difficulty lies outside the 1..=5 scale.
    DifficultyOutOfRange(u8),
    /// Frequency of zero would never schedule the chore.
    FrequencyZero,
}

impl Display for ChoreValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "chore name must not be blank"),
            Self::DifficultyOutOfRange(value) => write!(
                f,
                "chore difficulty {value} is outside {DIFFICULTY_MIN}..={DIFFICULTY_MAX}"
            ),
            Self::FrequencyZero => write!(f, "chore frequency must be at least 1"),
        }
    }
}

impl Error for ChoreValidationError {}

/// Weighted recurring task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chore {
    /// Stable global ID used for assignment and vote linkage.
    pub uuid: ChoreId,
    /// User-facing label, unique within the roster.
    pub name: String,
    /// Workload weight on the 1..=5 scale.
    pub difficulty: u8,
    /// Cadence in cycles: 1 = every cycle, 2 = every other cycle.
    pub frequency: u32,
}

impl Chore {
    /// Creates a weekly chore with a generated stable ID.
    pub fn new(name: impl Into<String>, difficulty: u8) -> Result<Self, ChoreValidationError> {
        Self::with_id(Uuid::new_v4(), name, difficulty)
    }

    /// Creates a weekly chore with a caller-provided stable ID.
    pub fn with_id(
        uuid: ChoreId,
        name: impl Into<String>,
        difficulty: u8,
    ) -> Result<Self, ChoreValidationError> {
        let name = normalize_chore_name(name.into())?;
        ensure_difficulty(difficulty)?;
        Ok(Self {
            uuid,
            name,
            difficulty,
            frequency: 1,
        })
    }

    /// Sets a non-weekly cadence.
    pub fn with_frequency(mut self, frequency: u32) -> Result<Self, ChoreValidationError> {
        ensure_frequency(frequency)?;
        self.frequency = frequency;
        Ok(self)
    }
}

/// Rejects difficulty values outside the 1..=5 scale.
pub fn ensure_difficulty(value: u8) -> Result<(), ChoreValidationError> {
    if !(DIFFICULTY_MIN..=DIFFICULTY_MAX).contains(&value) {
        return Err(ChoreValidationError::DifficultyOutOfRange(value));
    }
    Ok(())
}

/// Rejects a zero cadence.
pub fn ensure_frequency(value: u32) -> Result<(), ChoreValidationError> {
    if value == 0 {
        return Err(ChoreValidationError::FrequencyZero);
    }
    Ok(())
}

/// Trims surrounding whitespace and rejects blank names.
pub fn normalize_chore_name(raw: String) -> Result<String, ChoreValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ChoreValidationError::BlankName);
    }
    Ok(trimmed.to_string())
}
