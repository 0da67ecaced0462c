//! Settings repository: defaulted key-value reads and upsert writes.
//!
//! # Responsibility
//! - Read configuration keys with fallback-to-default semantics.
//! - Provide the upsert write contract consumed by the admin and
//!   time-sync collaborators.
//!
//! # Invariants
//! - A missing key is never an error; the caller's default is returned.
//! - An unparsable time offset degrades to zero with a warning, never an
//!   error.

use crate::repo::{ensure_connection_migrated, ensure_table_shape, RepoResult};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};

/// Settings key holding the signed clock offset in seconds.
pub const SETTING_TIME_OFFSET: &str = "time_offset";

/// Settings key holding the audio output device identifier.
pub const SETTING_AUDIO_OUTPUT: &str = "audio_output";

/// Default ALSA output device, matching the seeded settings row.
pub const DEFAULT_AUDIO_OUTPUT: &str = "hw:1,0";

/// Repository interface for settings access.
pub trait SettingsRepository {
    /// Returns the stored value for `key`, or `default` when absent.
    fn get(&self, key: &str, default: &str) -> RepoResult<String>;
    /// Creates or replaces the value for `key`.
    fn set(&self, key: &str, value: &str) -> RepoResult<()>;

    /// Reads the clock offset in seconds.
    ///
    /// Absent key → 0. Unparsable value → 0 with a warning; the scheduler
    /// must keep ticking on raw time rather than abort.
    fn time_offset_secs(&self) -> RepoResult<i64> {
        let raw = self.get(SETTING_TIME_OFFSET, "0")?;
        match raw.trim().parse::<i64>() {
            Ok(offset) => Ok(offset),
            Err(_) => {
                warn!(
                    "event=setting_unparsable module=settings_repo status=ok key={} value={} fallback=0",
                    SETTING_TIME_OFFSET, raw
                );
                Ok(0)
            }
        }
    }
}

/// SQLite-backed settings repository.
pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_migrated(conn)?;
        ensure_table_shape(conn, "settings", &["key", "value"])?;
        Ok(Self { conn })
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn get(&self, key: &str, default: &str) -> RepoResult<String> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value.unwrap_or_else(|| default.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value;",
            params![key, value],
        )?;
        Ok(())
    }
}
