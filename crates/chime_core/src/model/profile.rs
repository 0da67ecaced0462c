//! Profile domain model.
//!
//! # Responsibility
//! - Define the profile record that scopes bell schedules.
//!
//! # Invariants
//! - Exactly one profile is active at any time; the store layer self-heals
//!   to this state (see `repo::profile_repo`).

use serde::{Deserialize, Serialize};

/// Stable profile identifier (SQLite rowid).
pub type ProfileId = i64;

/// A named bell schedule; only the active profile's bells can fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub is_active: bool,
}
