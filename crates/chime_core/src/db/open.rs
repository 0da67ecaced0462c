//! Connection bootstrap for the bell database.
//!
//! # Responsibility
//! - Open file or in-memory connections for chime storage.
//! - Apply required pragmas and schema migrations before handing a
//!   connection out.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a bounded busy
//!   timeout.
//! - Returned connections are fully migrated.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// A blocked store read must not stall a tick into the next minute.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the bell database file, migrating it as needed.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    open_traced("file", || Connection::open(path))
}

/// Opens a fresh in-memory bell database; tests and tooling use this.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_traced("memory", Connection::open_in_memory)
}

fn open_traced(
    mode: &'static str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let attempt = open()
        .map_err(|err| ("db_open_failed", DbError::from(err)))
        .and_then(|mut conn| match prepare_connection(&mut conn) {
            Ok(()) => Ok(conn),
            Err(err) => Err(("db_bootstrap_failed", err)),
        });

    match attempt {
        Ok(conn) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err((error_code, err)) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code={error_code} error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn prepare_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)?;
    Ok(())
}
