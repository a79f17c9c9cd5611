use goalboard_core::db::migrations::latest_version;
use goalboard_core::db::{open_db, open_db_in_memory, DbError};
use goalboard_core::{Goal, GoalStore, SqliteGoalStore, StoreError, Subtask};
use rusqlite::{params, Connection};
use uuid::Uuid;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "users");
    assert_table_exists(&conn, "goals");
    assert_table_exists(&conn, "subtasks");
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan = conn.execute(
        "INSERT INTO subtasks (id, goal_id, title, sort_order, created_at, updated_at)
         VALUES (?1, ?2, 'orphan', 0, 0, 0);",
        params![Uuid::new_v4().to_string(), Uuid::new_v4().to_string()],
    );
    assert!(orphan.is_err());
}

#[test]
fn reopening_file_keeps_goals() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("goalboard.db");
    let owner = Uuid::new_v4();
    let mut goal = Goal::new(owner, "Persist me");
    goal.subtasks.push(Subtask::new(goal.id, "step"));

    let store = SqliteGoalStore::open(&path).unwrap();
    store.create_goal(&goal).unwrap();
    store.close().unwrap();

    let reopened = SqliteGoalStore::open(&path).unwrap();
    assert_eq!(reopened.get_goal(owner, goal.id).unwrap(), goal);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
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
fn store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    match SqliteGoalStore::try_new(conn) {
        Err(StoreError::SchemaMismatch { expected, actual }) => {
            assert_eq!(expected, latest_version());
            assert_eq!(actual, 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
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
