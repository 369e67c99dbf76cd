use projinvite_core::db::migrations::latest_version;
use projinvite_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "projects");
    assert_table_exists(&conn, "assignments");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invites.sqlite3");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute("INSERT INTO projects (id) VALUES ('P1');", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM projects;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

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
fn schema_rejects_second_assignment_for_same_project() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO projects (id) VALUES ('P1');
         INSERT INTO assignments (email, project_id) VALUES ('a@x.com', 'P1');",
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO assignments (email, project_id) VALUES ('b@x.com', 'P1');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn schema_rejects_assignment_to_unknown_project() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO assignments (email, project_id) VALUES ('a@x.com', 'ghost');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn schema_allows_many_unassigned_rows() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO assignments (email, project_id) VALUES ('a@x.com', NULL);
         INSERT INTO assignments (email, project_id) VALUES ('a@x.com', NULL);",
    )
    .unwrap();
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

#[test]
fn database_stamped_latest_without_tables_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stamped.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.pragma_update(None, "user_version", latest_version())
        .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::MissingSchemaObject { kind, name } => {
            assert_eq!(kind, "table");
            assert_eq!(name, "projects");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dropped_uniqueness_index_is_detected_on_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invites.sqlite3");

    let conn = open_db(&path).unwrap();
    conn.execute_batch("DROP INDEX idx_assignments_project;")
        .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::MissingSchemaObject {
            kind: "index",
            name: "idx_assignments_project",
        }
    ));
}
