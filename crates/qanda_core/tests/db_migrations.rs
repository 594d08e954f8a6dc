use qanda_core::db::migrations::latest_version;
use qanda_core::db::{open_db, open_db_in_memory, DbError};
use qanda_core::{RepoError, SqliteVoteRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "users",
        "profiles",
        "questions",
        "answers",
        "tags",
        "question_tags",
        "question_votes",
        "answer_votes",
        "question_subscriptions",
        "comments",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("qanda.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "questions");
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
fn repositories_reject_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteVoteRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn store_rejects_out_of_range_vote_values() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO users (uuid, username, email) VALUES ('u1', 'alice', 'a@example.com');
         INSERT INTO questions (uuid, user_uuid, title, body) VALUES ('q1', 'u1', 't', 'b');",
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO question_votes (uuid, user_uuid, question_uuid, value)
         VALUES ('v1', 'u1', 'q1', 2);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn store_allows_only_one_accepted_answer_per_question() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO users (uuid, username, email) VALUES ('u1', 'alice', 'a@example.com');
         INSERT INTO questions (uuid, user_uuid, title, body) VALUES ('q1', 'u1', 't', 'b');
         INSERT INTO answers (uuid, question_uuid, user_uuid, body, accepted)
         VALUES ('a1', 'q1', 'u1', 'first', 1);",
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO answers (uuid, question_uuid, user_uuid, body, accepted)
         VALUES ('a2', 'q1', 'u1', 'second', 1);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn inserting_user_creates_profile() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO users (uuid, username, email) VALUES ('u1', 'alice', 'a@example.com');",
        [],
    )
    .unwrap();

    let profiles: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM profiles WHERE user_uuid = 'u1';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(profiles, 1);
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
