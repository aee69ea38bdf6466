use rota_core::db::migrations::latest_version;
use rota_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "participants");
    assert_table_exists(&conn, "chores");
    assert_table_exists(&conn, "load_records");
    assert_table_exists(&conn, "exclusion_overrides");
    assert_table_exists(&conn, "rotas");
    assert_table_exists(&conn, "assignments");
    assert_table_exists(&conn, "rota_meta");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rota.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "participants");
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
fn chore_frequency_column_defaults_to_weekly() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO chores (uuid, name, difficulty)
         VALUES ('00000000-0000-4000-8000-0000000000c1', 'dishes', 3);",
        [],
    )
    .unwrap();

    let frequency: u32 = conn
        .query_row(
            "SELECT frequency FROM chores WHERE name = 'dishes';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(frequency, 1);
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
