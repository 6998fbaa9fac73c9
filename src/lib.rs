// src/lib.rs

//! Release Line
//!
//! Tracks the version history of packages together with, for each version,
//! the dependent packages (pinned to their own versions) built against it.
//!
//! # Architecture
//!
//! - Release versions: backward-linked chain per package via `previous_version`
//! - Heads: one pointer per package to the most recently created version
//! - Dependents: `(pkg, version) -> {dependent -> dependent_version}`
//! - Storage: any `store::Table` collaborator; SQLite and in-memory ship here
//!
//! Operations that omit a version address `VersionSelector::Latest` and
//! resolve it through the package head at call time.

pub mod db;
pub mod dependent;
mod error;
mod fanout;
pub mod options;
pub mod record;
pub mod release_line;
pub mod store;

pub use dependent::DependentSet;
pub use error::{Error, Result};
pub use options::{
    AddDependent, CreateRelease, DependentQuery, DependentSpec, LATEST, ReleaseQuery,
    RemoveDependents, VersionSelector,
};
pub use record::{Dependent, DependentKey, PackageKey, ReleaseHead, ReleaseVersion, VersionKey};
pub use release_line::{CompiledRelease, ReleaseLine};
pub use store::{Models, ModelsBuilder, Record, Table};
