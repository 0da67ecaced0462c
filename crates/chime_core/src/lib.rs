//! Core domain logic for chime, a school-bell scheduler.
//! This crate is the single source of truth for business invariants.

pub mod audio;
pub mod clock;
pub mod db;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use audio::{AudioDispatch, PlayerCommandDispatch};
pub use clock::TickInstant;
pub use ledger::{FileFiringLedger, FiringLedger, LedgerError, LedgerResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::bell::{Bell, BellId, BellValidationError, NewBell, TimeOfDay};
pub use model::profile::{Profile, ProfileId};
pub use model::weekday::Weekday;
pub use repo::bell_repo::{BellRepository, SqliteBellRepository};
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use repo::settings_repo::{
    SettingsRepository, SqliteSettingsRepository, DEFAULT_AUDIO_OUTPUT, SETTING_AUDIO_OUTPUT,
    SETTING_TIME_OFFSET,
};
pub use repo::{RepoError, RepoResult};
pub use service::scheduler::{SchedulerEngine, TickReport, TickSettings};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
