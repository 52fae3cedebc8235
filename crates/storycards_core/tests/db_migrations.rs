use rusqlite::Connection;
use storycards_core::db::migrations::{apply_migrations, latest_version};
use storycards_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_store");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storycards.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "kv_store");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
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
fn migrations_run_once_and_key_is_unique() {
    let mut conn = Connection::open_in_memory().unwrap();
    assert_eq!(apply_migrations(&mut conn).unwrap(), latest_version() as usize);
    assert_eq!(apply_migrations(&mut conn).unwrap(), 0);

    conn.execute(
        "INSERT INTO kv_store (key, value) VALUES ('storyCardsProjects', '{}');",
        [],
    )
    .unwrap();
    let duplicate = conn.execute(
        "INSERT INTO kv_store (key, value) VALUES ('storyCardsProjects', '[]');",
        [],
    );
    assert!(duplicate.is_err(), "kv_store key must be unique");

    let updated_at: i64 = conn
        .query_row("SELECT updated_at FROM kv_store;", [], |row| row.get(0))
        .unwrap();
    assert!(updated_at > 1_600_000_000_000, "updated_at is epoch millis");
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table `{table_name}` should exist");
}
