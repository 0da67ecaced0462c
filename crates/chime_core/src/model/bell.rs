//! Bell domain model.
//!
//! # Responsibility
//! - Define the bell record and its minute-granular time-of-day value.
//! - Provide validation used by every repository write path.
//!
//! # Invariants
//! - `time_of_day` carries no seconds; matching is exact on `HH:MM`.
//! - `sound_ref` is a bare file name resolved under the sound directory.
//! - An empty weekday set is valid and means the bell never fires.

use crate::model::profile::ProfileId;
use crate::model::weekday::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable bell identifier (SQLite rowid).
pub type BellId = i64;

/// Validation failures rejected before any bell write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BellValidationError {
    HourOutOfRange(u8),
    MinuteOutOfRange(u8),
    UnparsableTime(String),
    EmptySoundRef,
    SoundRefNotAFileName(String),
}

impl Display for BellValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HourOutOfRange(hour) => write!(f, "hour {hour} is out of range 0..=23"),
            Self::MinuteOutOfRange(minute) => {
                write!(f, "minute {minute} is out of range 0..=59")
            }
            Self::UnparsableTime(value) => {
                write!(f, "time of day `{value}` is not in HH:MM form")
            }
            Self::EmptySoundRef => write!(f, "sound reference must not be empty"),
            Self::SoundRefNotAFileName(value) => {
                write!(f, "sound reference `{value}` must be a bare file name")
            }
        }
    }
}

impl Error for BellValidationError {}

/// Minute-granular time of day, rendered zero-padded 24h `HH:MM`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Builds a time of day, rejecting out-of-range components.
    pub fn new(hour: u8, minute: u8) -> Result<Self, BellValidationError> {
        if hour > 23 {
            return Err(BellValidationError::HourOutOfRange(hour));
        }
        if minute > 59 {
            return Err(BellValidationError::MinuteOutOfRange(minute));
        }
        Ok(Self { hour, minute })
    }

    /// Parses the canonical `HH:MM` storage form.
    ///
    /// Accepts exactly two digit pairs separated by `:`; anything else is
    /// rejected so a malformed stored value can never half-match a tick.
    pub fn parse(value: &str) -> Result<Self, BellValidationError> {
        let (hour_text, minute_text) = value
            .split_once(':')
            .ok_or_else(|| BellValidationError::UnparsableTime(value.to_string()))?;
        if hour_text.len() != 2 || minute_text.len() != 2 {
            return Err(BellValidationError::UnparsableTime(value.to_string()));
        }
        let hour: u8 = hour_text
            .parse()
            .map_err(|_| BellValidationError::UnparsableTime(value.to_string()))?;
        let minute: u8 = minute_text
            .parse()
            .map_err(|_| BellValidationError::UnparsableTime(value.to_string()))?;
        Self::new(hour, minute)
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Default for TimeOfDay {
    /// Midnight.
    fn default() -> Self {
        Self { hour: 0, minute: 0 }
    }
}

/// Persisted bell record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bell {
    /// Stable id used for ledger marker scoping and auditing.
    pub id: BellId,
    pub time_of_day: TimeOfDay,
    /// Days this bell rings on. Empty means never.
    pub weekdays: BTreeSet<Weekday>,
    /// File name resolved by audio dispatch under the sound directory.
    pub sound_ref: String,
    pub enabled: bool,
    /// Owning profile; enforced by a foreign key in storage.
    pub profile_id: ProfileId,
}

/// Bell draft for creation; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBell {
    pub time_of_day: TimeOfDay,
    pub weekdays: BTreeSet<Weekday>,
    pub sound_ref: String,
    pub enabled: bool,
    pub profile_id: ProfileId,
}

impl NewBell {
    /// Creates an enabled draft with an empty weekday set.
    pub fn new(
        time_of_day: TimeOfDay,
        sound_ref: impl Into<String>,
        profile_id: ProfileId,
    ) -> Self {
        Self {
            time_of_day,
            weekdays: BTreeSet::new(),
            sound_ref: sound_ref.into(),
            enabled: true,
            profile_id,
        }
    }

    pub fn validate(&self) -> Result<(), BellValidationError> {
        validate_sound_ref(&self.sound_ref)
    }
}

impl Bell {
    pub fn validate(&self) -> Result<(), BellValidationError> {
        validate_sound_ref(&self.sound_ref)
    }

    /// Returns whether this bell's weekday set contains the given day.
    pub fn rings_on(&self, day: Weekday) -> bool {
        self.weekdays.contains(&day)
    }
}

fn validate_sound_ref(sound_ref: &str) -> Result<(), BellValidationError> {
    if sound_ref.trim().is_empty() {
        return Err(BellValidationError::EmptySoundRef);
    }
    // Bare file name only; a stored reference must not escape the sound dir.
    if sound_ref.contains('/') || sound_ref.contains('\\') || sound_ref == ".." {
        return Err(BellValidationError::SoundRefNotAFileName(
            sound_ref.to_string(),
        ));
    }
    Ok(())
}
