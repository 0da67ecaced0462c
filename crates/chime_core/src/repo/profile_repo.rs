//! Profile repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide profile CRUD with the single-active invariant.
//! - Resolve (and self-heal) the active profile for the scheduler engine.
//!
//! # Invariants
//! - Exactly one profile is active after any successful write through this
//!   repository; anomalous stored states are healed on read.
//! - Deleting the active profile atomically promotes a survivor first.
//! - The last remaining profile can never be deleted.
//! - Healing picks the lowest id so racing invocations converge on the
//!   same winner.

use crate::model::profile::{Profile, ProfileId};
use crate::repo::{ensure_connection_migrated, ensure_table_shape, RepoError, RepoResult};
use log::warn;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const PROFILE_SELECT_SQL: &str = "SELECT id, name, is_active FROM profiles";

const PROFILE_COLUMNS: &[&str] = &["id", "name", "is_active"];

/// Repository interface for profile operations.
pub trait ProfileRepository {
    /// Creates an inactive profile and returns its store-assigned id.
    fn create_profile(&mut self, name: &str) -> RepoResult<ProfileId>;
    fn list_profiles(&self) -> RepoResult<Vec<Profile>>;
    /// Returns the single active profile, healing the stored state when
    /// zero or multiple rows are marked active.
    fn active_profile(&mut self) -> RepoResult<Profile>;
    /// Makes the given profile the single active one.
    fn switch_profile(&mut self, id: ProfileId) -> RepoResult<()>;
    /// Deletes a profile, keeping the single-active rule intact; owned
    /// bells go with it.
    fn delete_profile(&mut self, id: ProfileId) -> RepoResult<()>;
}

/// SQLite-backed profile repository.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_migrated(conn)?;
        ensure_table_shape(conn, "profiles", PROFILE_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn create_profile(&mut self, name: &str) -> RepoResult<ProfileId> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RepoError::EmptyProfileName);
        }

        self.conn.execute(
            "INSERT INTO profiles (name, is_active) VALUES (?1, 0);",
            [trimmed],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn list_profiles(&self) -> RepoResult<Vec<Profile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} ORDER BY id ASC;"))?;

        let mut rows = stmt.query([])?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next()? {
            profiles.push(parse_profile_row(row)?);
        }

        Ok(profiles)
    }

    fn active_profile(&mut self) -> RepoResult<Profile> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut actives = query_profiles(
            &tx,
            &format!("{PROFILE_SELECT_SQL} WHERE is_active = 1 ORDER BY id ASC;"),
        )?;

        let resolved = match actives.len() {
            1 => actives.remove(0),
            0 => {
                let mut all =
                    query_profiles(&tx, &format!("{PROFILE_SELECT_SQL} ORDER BY id ASC LIMIT 1;"))?;
                let Some(mut first) = all.pop() else {
                    return Err(RepoError::NoProfiles);
                };
                tx.execute(
                    "UPDATE profiles SET is_active = 1 WHERE id = ?1;",
                    [first.id],
                )?;
                warn!(
                    "event=active_profile_healed module=profile_repo status=ok reason=none_active profile_id={}",
                    first.id
                );
                first.is_active = true;
                first
            }
            extra_count => {
                let winner = actives.remove(0);
                tx.execute(
                    "UPDATE profiles SET is_active = 0 WHERE id <> ?1;",
                    [winner.id],
                )?;
                warn!(
                    "event=active_profile_healed module=profile_repo status=ok reason=multiple_active active_count={} profile_id={}",
                    extra_count, winner.id
                );
                winner
            }
        };

        tx.commit()?;
        Ok(resolved)
    }

    fn switch_profile(&mut self, id: ProfileId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !profile_exists(&tx, id)? {
            return Err(RepoError::ProfileNotFound(id));
        }

        tx.execute("UPDATE profiles SET is_active = 0;", [])?;
        tx.execute("UPDATE profiles SET is_active = 1 WHERE id = ?1;", [id])?;

        tx.commit()?;
        Ok(())
    }

    fn delete_profile(&mut self, id: ProfileId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let target_active: Option<bool> = {
            let mut stmt =
                tx.prepare(&format!("{PROFILE_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query([id])?;
            match rows.next()? {
                Some(row) => Some(parse_profile_row(row)?.is_active),
                None => None,
            }
        };
        let Some(target_active) = target_active else {
            return Err(RepoError::ProfileNotFound(id));
        };

        let total: i64 =
            tx.query_row("SELECT COUNT(*) FROM profiles;", [], |row| row.get(0))?;
        if total <= 1 {
            return Err(RepoError::LastProfile(id));
        }

        if target_active {
            // Promote the lowest-id survivor before the delete so the store
            // never passes through a zero-active state.
            let successor: ProfileId = tx.query_row(
                "SELECT id FROM profiles WHERE id <> ?1 ORDER BY id ASC LIMIT 1;",
                [id],
                |row| row.get(0),
            )?;
            tx.execute("UPDATE profiles SET is_active = 0;", [])?;
            tx.execute(
                "UPDATE profiles SET is_active = 1 WHERE id = ?1;",
                [successor],
            )?;
        }

        tx.execute("DELETE FROM profiles WHERE id = ?1;", [id])?;

        tx.commit()?;
        Ok(())
    }
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let is_active = match row.get::<_, i64>("is_active")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_active value `{other}` in profiles.is_active"
            )));
        }
    };

    Ok(Profile {
        id: row.get("id")?,
        name: row.get("name")?,
        is_active,
    })
}

fn query_profiles(tx: &Transaction<'_>, sql: &str) -> RepoResult<Vec<Profile>> {
    let mut stmt = tx.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut profiles = Vec::new();
    while let Some(row) = rows.next()? {
        profiles.push(parse_profile_row(row)?);
    }
    Ok(profiles)
}

fn profile_exists(tx: &Transaction<'_>, id: ProfileId) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM profiles WHERE id = ?1);",
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
