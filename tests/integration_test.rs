// tests/integration_test.rs

//! Integration tests for the release-line database
//!
//! These tests verify end-to-end functionality across modules.

use release_line::db::{self, SqliteStore};
use release_line::{CreateRelease, ReleaseLine, ReleaseQuery};
use tempfile::NamedTempFile;

#[test]
fn test_database_lifecycle() {
    // Create a temporary database
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file.path().to_str().unwrap().to_string();

    // Remove the temp file so init can create it
    drop(temp_file);

    let init_result = db::init(&db_path);
    assert!(
        init_result.is_ok(),
        "Database initialization should succeed"
    );

    assert!(
        std::path::Path::new(&db_path).exists(),
        "Database file should exist after initialization"
    );

    let conn_result = db::open(&db_path);
    assert!(conn_result.is_ok(), "Opening database should succeed");

    // Verify the schema is in place
    let conn = conn_result.unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM release_lines", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0, "A fresh database has no releases");
}

#[test]
fn test_database_init_creates_parent_directories() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir
        .path()
        .join("nested/path/to/release-line.db")
        .to_str()
        .unwrap()
        .to_string();

    let result = db::init(&db_path);
    assert!(result.is_ok(), "Should create parent directories");
    assert!(
        std::path::Path::new(&db_path).exists(),
        "Database should exist in nested path"
    );
}

#[test]
fn test_database_pragmas_are_set() {
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file.path().to_str().unwrap().to_string();
    drop(temp_file);

    db::init(&db_path).unwrap();
    let conn = db::open(&db_path).unwrap();

    let foreign_keys: i32 = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1, "Foreign keys should be enabled");

    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(
        journal_mode.to_lowercase(),
        "wal",
        "Journal mode should be WAL"
    );
}

#[test]
fn test_store_open_requires_existing_database() {
    let result = SqliteStore::open("/nonexistent/path/release-line.db");
    assert!(matches!(
        result,
        Err(release_line::Error::DatabaseNotFound(_))
    ));
}

#[tokio::test]
async fn test_releases_persist_across_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("release-line.db");
    let db_path = db_path.to_str().unwrap();
    db::init(db_path).unwrap();

    {
        let release = ReleaseLine::new(SqliteStore::open(db_path).unwrap().into_models());
        release
            .create(CreateRelease::new("nginx", "1.20.0"))
            .await
            .unwrap();
        release
            .create(CreateRelease::new("nginx", "1.21.0").dependent("nginx-module", "0.2.0"))
            .await
            .unwrap();
    }

    let release = ReleaseLine::new(SqliteStore::open(db_path).unwrap().into_models());
    let compiled = release
        .get(ReleaseQuery::latest("nginx"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(compiled.version, "1.21.0");
    assert_eq!(compiled.previous_version.as_deref(), Some("1.20.0"));
    assert_eq!(compiled.dependents["nginx-module"], "0.2.0");

    let history = release
        .history(ReleaseQuery::latest("nginx"))
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
}
