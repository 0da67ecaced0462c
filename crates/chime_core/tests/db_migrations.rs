use chime_core::db::migrations::latest_version;
use chime_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "settings");
    assert_table_exists(&conn, "profiles");
    assert_table_exists(&conn, "bells");
}

#[test]
fn fresh_database_is_seeded_with_defaults() {
    let conn = open_db_in_memory().unwrap();

    let audio: String = conn
        .query_row(
            "SELECT value FROM settings WHERE key = 'audio_output';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(audio, "hw:1,0");

    let offset: String = conn
        .query_row(
            "SELECT value FROM settings WHERE key = 'time_offset';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(offset, "0");

    let (name, is_active): (String, i64) = conn
        .query_row(
            "SELECT name, is_active FROM profiles ORDER BY id ASC LIMIT 1;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(name, "Default");
    assert_eq!(is_active, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chime.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "bells");

    // Re-running the seed migration must not duplicate the default profile.
    let profiles: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM profiles;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(profiles, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn deleting_a_profile_cascades_to_its_bells() {
    let conn = open_db_in_memory().unwrap();

    conn.execute(
        "INSERT INTO profiles (name, is_active) VALUES ('Exams', 0);",
        [],
    )
    .unwrap();
    let profile_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO bells (time_of_day, weekdays, sound_ref, enabled, profile_id)
         VALUES ('07:00', 'Monday', 'bell1.wav', 1, ?1);",
        [profile_id],
    )
    .unwrap();

    conn.execute("DELETE FROM profiles WHERE id = ?1;", [profile_id])
        .unwrap();

    let remaining: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM bells WHERE profile_id = ?1;",
            [profile_id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(remaining, 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
