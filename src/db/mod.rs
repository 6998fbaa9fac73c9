// src/db/mod.rs

//! Database layer for release lines
//!
//! This module handles all SQLite operations including:
//! - Database initialization and schema creation
//! - Connection management
//! - The `SqliteStore` record store backing a `ReleaseLine`

pub mod models;
pub mod schema;

use crate::error::{Error, Result};
use crate::record::{
    Dependent, DependentKey, PackageKey, ReleaseHead, ReleaseVersion, VersionKey,
};
use crate::store::{Models, Table};
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Initialize a new release-line database at the specified path
///
/// Creates the database file and applies all schema migrations.
/// This is idempotent - calling it on an existing database is safe.
///
/// # Arguments
///
/// * `db_path` - Path where the database should be created
pub fn init(db_path: &str) -> Result<()> {
    debug!("Initializing database at: {}", db_path);

    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(db_path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )?;

    schema::migrate(&conn)?;

    info!("Database initialized successfully");
    Ok(())
}

/// Open an existing release-line database
///
/// # Arguments
///
/// * `db_path` - Path to the database file
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        return Err(Error::DatabaseNotFound(db_path.to_string()));
    }

    let conn = Connection::open(db_path)?;

    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )?;

    Ok(conn)
}

/// Record store over a single SQLite connection
///
/// Serves all three record kinds. Each call runs on tokio's blocking pool
/// with the connection locked for the duration of the statement.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Wrap an open connection, bringing its schema up to date
    pub fn new(conn: Connection) -> Result<Self> {
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an existing database file
    pub fn open(db_path: &str) -> Result<Self> {
        Self::new(open(db_path)?)
    }

    /// A private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    /// A `Models` bundle whose three handles share this store
    pub fn into_models(self) -> Models {
        Models::from_store(self)
    }

    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| Error::LockPoisoned)?;
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl Table<ReleaseVersion> for SqliteStore {
    async fn create(&self, record: ReleaseVersion) -> Result<ReleaseVersion> {
        self.run(move |conn| {
            record.upsert(conn)?;
            Ok(record)
        })
        .await
    }

    async fn get(&self, key: &VersionKey) -> Result<Option<ReleaseVersion>> {
        let key = key.clone();
        self.run(move |conn| ReleaseVersion::find(conn, &key.pkg, &key.version))
            .await
    }

    async fn find_all(&self, scope: &PackageKey) -> Result<Vec<ReleaseVersion>> {
        let pkg = scope.pkg.clone();
        self.run(move |conn| ReleaseVersion::find_by_pkg(conn, &pkg))
            .await
    }

    async fn remove(&self, key: &VersionKey) -> Result<()> {
        let key = key.clone();
        self.run(move |conn| ReleaseVersion::delete(conn, &key.pkg, &key.version))
            .await
    }
}

#[async_trait]
impl Table<ReleaseHead> for SqliteStore {
    async fn create(&self, record: ReleaseHead) -> Result<ReleaseHead> {
        self.run(move |conn| {
            record.upsert(conn)?;
            Ok(record)
        })
        .await
    }

    async fn get(&self, key: &PackageKey) -> Result<Option<ReleaseHead>> {
        let pkg = key.pkg.clone();
        self.run(move |conn| ReleaseHead::find(conn, &pkg)).await
    }

    async fn find_all(&self, _scope: &()) -> Result<Vec<ReleaseHead>> {
        self.run(ReleaseHead::list_all).await
    }

    async fn remove(&self, key: &PackageKey) -> Result<()> {
        let pkg = key.pkg.clone();
        self.run(move |conn| ReleaseHead::delete(conn, &pkg)).await
    }
}

#[async_trait]
impl Table<Dependent> for SqliteStore {
    async fn create(&self, record: Dependent) -> Result<Dependent> {
        self.run(move |conn| {
            record.upsert(conn)?;
            Ok(record)
        })
        .await
    }

    async fn get(&self, key: &DependentKey) -> Result<Option<Dependent>> {
        let key = key.clone();
        self.run(move |conn| Dependent::find(conn, &key.pkg, &key.version, &key.dependent))
            .await
    }

    async fn find_all(&self, scope: &VersionKey) -> Result<Vec<Dependent>> {
        let scope = scope.clone();
        self.run(move |conn| Dependent::find_by_release(conn, &scope.pkg, &scope.version))
            .await
    }

    async fn remove(&self, key: &DependentKey) -> Result<()> {
        let key = key.clone();
        self.run(move |conn| Dependent::delete(conn, &key.pkg, &key.version, &key.dependent))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_init_creates_database() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();

        // Remove the temp file so init can create it
        drop(temp_file);

        let result = init(&db_path);
        assert!(result.is_ok());
        assert!(Path::new(&db_path).exists());
    }

    #[test]
    fn test_init_under_a_file_is_io_error() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().join("nested/release-line.db");

        let result = init(db_path.to_str().unwrap());
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_open_existing_database() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();

        init(db_path).unwrap();

        let result = open(db_path);
        assert!(result.is_ok());
    }

    #[test]
    fn test_open_nonexistent_database() {
        let result = open("/nonexistent/path/db.sqlite");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), Error::DatabaseNotFound(_)));
    }

    #[tokio::test]
    async fn test_sqlite_store_round_trip() {
        let store = SqliteStore::in_memory().unwrap();

        let release = ReleaseVersion::new("p".to_string(), "1.0.0".to_string(), None);
        Table::<ReleaseVersion>::create(&store, release.clone())
            .await
            .unwrap();

        let found = Table::<ReleaseVersion>::get(&store, &VersionKey::new("p", "1.0.0"))
            .await
            .unwrap();
        assert_eq!(found, Some(release));

        let heads = Table::<ReleaseHead>::find_all(&store, &()).await.unwrap();
        assert!(heads.is_empty());

        Table::<ReleaseVersion>::remove(&store, &VersionKey::new("p", "1.0.0"))
            .await
            .unwrap();
        let gone = Table::<ReleaseVersion>::get(&store, &VersionKey::new("p", "1.0.0"))
            .await
            .unwrap();
        assert!(gone.is_none());
    }
}
