// tests/common/mod.rs

//! Shared fixtures for release-line integration tests

#![allow(dead_code)]

use release_line::db::{self, SqliteStore};
use release_line::store::memory::MemoryTable;
use release_line::{Dependent, Models, ReleaseHead, ReleaseLine, ReleaseVersion};
use std::sync::Arc;
use tempfile::TempDir;

/// A release line over fresh in-memory tables
pub fn memory_release_line() -> ReleaseLine {
    ReleaseLine::new(Models::in_memory())
}

/// A release line over an on-disk SQLite database in a temporary directory
pub fn sqlite_release_line() -> (TempDir, ReleaseLine) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("release-line.db");
    let db_path = db_path.to_str().unwrap();

    db::init(db_path).unwrap();
    let store = SqliteStore::open(db_path).unwrap();
    (dir, ReleaseLine::new(store.into_models()))
}

/// In-memory tables kept individually so tests can inspect and fault them
pub struct Tables {
    pub releases: Arc<MemoryTable<ReleaseVersion>>,
    pub deps: Arc<MemoryTable<Dependent>>,
    pub heads: Arc<MemoryTable<ReleaseHead>>,
}

impl Tables {
    pub fn new() -> Self {
        Self {
            releases: Arc::new(MemoryTable::new()),
            deps: Arc::new(MemoryTable::new()),
            heads: Arc::new(MemoryTable::new()),
        }
    }

    pub fn release_line(&self) -> ReleaseLine {
        let models = Models::builder()
            .release_line(self.releases.clone())
            .release_line_dep(self.deps.clone())
            .release_line_head(self.heads.clone())
            .build()
            .unwrap();
        ReleaseLine::new(models)
    }
}
