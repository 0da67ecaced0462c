//! Bell repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over `bells` storage.
//! - Own the candidate query consumed by the scheduler engine.
//!
//! # Invariants
//! - Write paths validate the model before SQL mutations.
//! - Candidate matching is exact string equality on the rendered `HH:MM`;
//!   no tolerance window.
//! - Weekday filtering is NOT pushed into SQL; the engine applies it
//!   against the decoded weekday set.

use crate::model::bell::{Bell, BellId, NewBell, TimeOfDay};
use crate::model::profile::ProfileId;
use crate::model::weekday::{decode_weekdays, encode_weekdays};
use crate::repo::{ensure_connection_migrated, ensure_table_shape, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const BELL_SELECT_SQL: &str = "SELECT
    id,
    time_of_day,
    weekdays,
    sound_ref,
    enabled,
    profile_id
FROM bells";

const BELL_COLUMNS: &[&str] = &[
    "id",
    "time_of_day",
    "weekdays",
    "sound_ref",
    "enabled",
    "profile_id",
];

/// Repository interface for bell persistence and candidate queries.
pub trait BellRepository {
    /// Creates one bell and returns its store-assigned id.
    fn create_bell(&self, draft: &NewBell) -> RepoResult<BellId>;
    /// Replaces every mutable field of an existing bell.
    fn update_bell(&self, bell: &Bell) -> RepoResult<()>;
    fn get_bell(&self, id: BellId) -> RepoResult<Option<Bell>>;
    /// Lists all bells of one profile ordered by time of day.
    fn list_bells(&self, profile_id: ProfileId) -> RepoResult<Vec<Bell>>;
    /// Flips the enabled flag without touching the schedule.
    fn set_enabled(&self, id: BellId, enabled: bool) -> RepoResult<()>;
    fn delete_bell(&self, id: BellId) -> RepoResult<()>;
    /// Enabled bells of the given profile whose stored time equals
    /// `time_of_day` exactly. Day filtering stays with the caller.
    fn candidates(&self, time_of_day: TimeOfDay, profile_id: ProfileId)
        -> RepoResult<Vec<Bell>>;
}

/// SQLite-backed bell repository.
pub struct SqliteBellRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBellRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_migrated(conn)?;
        ensure_table_shape(conn, "bells", BELL_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl BellRepository for SqliteBellRepository<'_> {
    fn create_bell(&self, draft: &NewBell) -> RepoResult<BellId> {
        draft.validate()?;

        self.conn.execute(
            "INSERT INTO bells (time_of_day, weekdays, sound_ref, enabled, profile_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                draft.time_of_day.to_string(),
                encode_weekdays(&draft.weekdays),
                draft.sound_ref.as_str(),
                i64::from(draft.enabled),
                draft.profile_id,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_bell(&self, bell: &Bell) -> RepoResult<()> {
        bell.validate()?;

        let changed = self.conn.execute(
            "UPDATE bells
             SET
                time_of_day = ?1,
                weekdays = ?2,
                sound_ref = ?3,
                enabled = ?4,
                profile_id = ?5
             WHERE id = ?6;",
            params![
                bell.time_of_day.to_string(),
                encode_weekdays(&bell.weekdays),
                bell.sound_ref.as_str(),
                i64::from(bell.enabled),
                bell.profile_id,
                bell.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::BellNotFound(bell.id));
        }

        Ok(())
    }

    fn get_bell(&self, id: BellId) -> RepoResult<Option<Bell>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BELL_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_bell_row(row)?));
        }

        Ok(None)
    }

    fn list_bells(&self, profile_id: ProfileId) -> RepoResult<Vec<Bell>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BELL_SELECT_SQL}
             WHERE profile_id = ?1
             ORDER BY time_of_day ASC, id ASC;"
        ))?;

        let mut rows = stmt.query([profile_id])?;
        let mut bells = Vec::new();
        while let Some(row) = rows.next()? {
            bells.push(parse_bell_row(row)?);
        }

        Ok(bells)
    }

    fn set_enabled(&self, id: BellId, enabled: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE bells SET enabled = ?1 WHERE id = ?2;",
            params![i64::from(enabled), id],
        )?;

        if changed == 0 {
            return Err(RepoError::BellNotFound(id));
        }

        Ok(())
    }

    fn delete_bell(&self, id: BellId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM bells WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::BellNotFound(id));
        }

        Ok(())
    }

    fn candidates(
        &self,
        time_of_day: TimeOfDay,
        profile_id: ProfileId,
    ) -> RepoResult<Vec<Bell>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BELL_SELECT_SQL}
             WHERE time_of_day = ?1
               AND enabled = 1
               AND profile_id = ?2
             ORDER BY id ASC;"
        ))?;

        let mut rows = stmt.query(params![time_of_day.to_string(), profile_id])?;
        let mut bells = Vec::new();
        while let Some(row) = rows.next()? {
            bells.push(parse_bell_row(row)?);
        }

        Ok(bells)
    }
}

fn parse_bell_row(row: &Row<'_>) -> RepoResult<Bell> {
    let time_text: String = row.get("time_of_day")?;
    let time_of_day = TimeOfDay::parse(&time_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid time value `{time_text}` in bells.time_of_day"
        ))
    })?;

    let weekdays_text: String = row.get("weekdays")?;
    let weekdays = decode_weekdays(&weekdays_text).map_err(|token| {
        RepoError::InvalidData(format!(
            "invalid weekday token `{token}` in bells.weekdays"
        ))
    })?;

    let enabled = match row.get::<_, i64>("enabled")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid enabled value `{other}` in bells.enabled"
            )));
        }
    };

    let bell = Bell {
        id: row.get("id")?,
        time_of_day,
        weekdays,
        sound_ref: row.get("sound_ref")?,
        enabled,
        profile_id: row.get("profile_id")?,
    };
    bell.validate()?;
    Ok(bell)
}
