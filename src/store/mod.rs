// src/store/mod.rs

//! Record-store contract consumed by the release-line core
//!
//! Each record kind is accessed through a `Table`, an asynchronous CRUD
//! surface over an external key-value collaborator:
//! - `create` persists (or overwrites) a record
//! - `get` returns the record for a full key, `None` when absent
//! - `find_all` returns every record matching a partial key
//! - `remove` deletes the record for a full key; removing nothing is not an error

pub mod memory;

use crate::error::{Error, Result};
use crate::record::{
    Dependent, DependentKey, PackageKey, ReleaseHead, ReleaseVersion, VersionKey,
};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A record kind stored in a `Table`
pub trait Record: Clone + fmt::Debug + Send + Sync + 'static {
    /// Full key addressing exactly one record
    type Key: Clone + Ord + fmt::Debug + Send + Sync + 'static;
    /// Partial key used by `find_all`
    type Scope: fmt::Debug + Send + Sync + 'static;

    /// Model name used in logs and error messages
    const KIND: &'static str;

    fn key(&self) -> Self::Key;

    fn in_scope(&self, scope: &Self::Scope) -> bool;
}

impl Record for ReleaseVersion {
    type Key = VersionKey;
    type Scope = PackageKey;

    const KIND: &'static str = "release_line";

    fn key(&self) -> VersionKey {
        ReleaseVersion::key(self)
    }

    fn in_scope(&self, scope: &PackageKey) -> bool {
        self.pkg == scope.pkg
    }
}

impl Record for ReleaseHead {
    type Key = PackageKey;
    /// Heads are only ever listed all at once
    type Scope = ();

    const KIND: &'static str = "release_line_head";

    fn key(&self) -> PackageKey {
        PackageKey::new(self.pkg.clone())
    }

    fn in_scope(&self, _scope: &()) -> bool {
        true
    }
}

impl Record for Dependent {
    type Key = DependentKey;
    type Scope = VersionKey;

    const KIND: &'static str = "release_line_dep";

    fn key(&self) -> DependentKey {
        Dependent::key(self)
    }

    fn in_scope(&self, scope: &VersionKey) -> bool {
        self.pkg == scope.pkg && self.version == scope.version
    }
}

/// Asynchronous CRUD access to one record kind
#[async_trait]
pub trait Table<R: Record>: Send + Sync {
    /// Persist a record, overwriting any record with the same key
    async fn create(&self, record: R) -> Result<R>;

    /// Fetch the record for a full key
    async fn get(&self, key: &R::Key) -> Result<Option<R>>;

    /// Fetch every record matching a partial key
    async fn find_all(&self, scope: &R::Scope) -> Result<Vec<R>>;

    /// Delete the record for a full key
    async fn remove(&self, key: &R::Key) -> Result<()>;
}

/// The three record-store handles a `ReleaseLine` operates on
#[derive(Clone)]
pub struct Models {
    pub release_line: Arc<dyn Table<ReleaseVersion>>,
    pub release_line_dep: Arc<dyn Table<Dependent>>,
    pub release_line_head: Arc<dyn Table<ReleaseHead>>,
}

impl Models {
    pub fn builder() -> ModelsBuilder {
        ModelsBuilder::default()
    }

    /// Build the bundle from one store that serves all three record kinds
    pub fn from_store<S>(store: S) -> Self
    where
        S: Table<ReleaseVersion> + Table<Dependent> + Table<ReleaseHead> + 'static,
    {
        let store = Arc::new(store);
        Self {
            release_line: store.clone(),
            release_line_dep: store.clone(),
            release_line_head: store,
        }
    }

    /// A bundle of fresh in-memory tables
    pub fn in_memory() -> Self {
        Self {
            release_line: Arc::new(memory::MemoryTable::<ReleaseVersion>::new()),
            release_line_dep: Arc::new(memory::MemoryTable::<Dependent>::new()),
            release_line_head: Arc::new(memory::MemoryTable::<ReleaseHead>::new()),
        }
    }
}

impl fmt::Debug for Models {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Models").finish_non_exhaustive()
    }
}

/// Assembles a `Models` bundle from individually supplied handles
#[derive(Default)]
pub struct ModelsBuilder {
    release_line: Option<Arc<dyn Table<ReleaseVersion>>>,
    release_line_dep: Option<Arc<dyn Table<Dependent>>>,
    release_line_head: Option<Arc<dyn Table<ReleaseHead>>>,
}

impl ModelsBuilder {
    pub fn release_line(mut self, table: Arc<dyn Table<ReleaseVersion>>) -> Self {
        self.release_line = Some(table);
        self
    }

    pub fn release_line_dep(mut self, table: Arc<dyn Table<Dependent>>) -> Self {
        self.release_line_dep = Some(table);
        self
    }

    pub fn release_line_head(mut self, table: Arc<dyn Table<ReleaseHead>>) -> Self {
        self.release_line_head = Some(table);
        self
    }

    /// Finish the bundle, failing if any handle is missing
    pub fn build(self) -> Result<Models> {
        Ok(Models {
            release_line: self
                .release_line
                .ok_or(Error::MissingModel(ReleaseVersion::KIND))?,
            release_line_dep: self
                .release_line_dep
                .ok_or(Error::MissingModel(Dependent::KIND))?,
            release_line_head: self
                .release_line_head
                .ok_or(Error::MissingModel(ReleaseHead::KIND))?,
        })
    }
}
