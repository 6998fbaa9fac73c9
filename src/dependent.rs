// src/dependent.rs

//! Dependent sets of a release line
//!
//! Manages the mapping `(pkg, version) -> {dependent -> dependent_version}`.
//! Every operation accepts `VersionSelector::Latest` and resolves it through
//! the owning `ReleaseLine`'s head at call time. What happens when the package
//! has no head differs per operation:
//! - `add` and `remove` fail with `Error::NoHead`
//! - `list` returns an empty sequence
//! - `get` returns `None`

use crate::error::{Error, Result};
use crate::fanout::{PendingWrite, settle_all};
use crate::options::{
    AddDependent, DependentQuery, ReleaseQuery, RemoveDependents, VersionSelector,
};
use crate::record::{Dependent, DependentKey, VersionKey};
use crate::release_line::ReleaseLine;
use crate::store::Table;
use futures_util::FutureExt;
use tracing::{debug, info};

/// Dependent-set operations scoped to one `ReleaseLine`
#[derive(Clone, Copy)]
pub struct DependentSet<'a> {
    release_line: &'a ReleaseLine,
}

impl<'a> DependentSet<'a> {
    pub(crate) fn new(release_line: &'a ReleaseLine) -> Self {
        Self { release_line }
    }

    fn table(&self) -> &'a dyn Table<Dependent> {
        self.release_line.models().release_line_dep.as_ref()
    }

    /// Resolve a selector to a concrete version, `None` if there is no head
    async fn resolve(&self, pkg: &str, version: &VersionSelector) -> Result<Option<String>> {
        match version.exact() {
            Some(v) => Ok(Some(v.to_string())),
            None => {
                let head = self.release_line.head(pkg).await?;
                debug!(
                    "Resolved latest {} to {:?}",
                    pkg,
                    head.as_ref().map(|h| &h.version)
                );
                Ok(head.map(|h| h.version))
            }
        }
    }

    /// Record a dependent against a release, overwriting its dependent version
    pub async fn add(&self, opts: AddDependent) -> Result<Dependent> {
        let version = self
            .resolve(&opts.pkg, &opts.version)
            .await?
            .ok_or_else(|| Error::NoHead {
                action: "add",
                pkg: opts.pkg.clone(),
            })?;

        let dependent = self
            .table()
            .create(Dependent::new(
                opts.pkg,
                version,
                opts.dependent,
                opts.dependent_version,
            ))
            .await?;

        info!(
            "Added dependent {}@{} to {}@{}",
            dependent.dependent, dependent.dependent_version, dependent.pkg, dependent.version
        );
        Ok(dependent)
    }

    /// Remove one dependent of a release, or all of them
    ///
    /// Returns the keys that were removed. Removing from a release with no
    /// dependents succeeds with an empty result.
    pub async fn remove(&self, opts: RemoveDependents) -> Result<Vec<DependentKey>> {
        let version = self
            .resolve(&opts.pkg, &opts.version)
            .await?
            .ok_or_else(|| Error::NoHead {
                action: "remove",
                pkg: opts.pkg.clone(),
            })?;

        let table = self.table();

        if let Some(dependent) = opts.dependent {
            let key = DependentKey::new(opts.pkg, version, dependent);
            table.remove(&key).await?;
            debug!("Removed dependent {:?}", key);
            return Ok(vec![key]);
        }

        let scope = VersionKey::new(opts.pkg, version);
        let dependents = table.find_all(&scope).await?;
        let keys: Vec<DependentKey> = dependents.iter().map(Dependent::key).collect();

        let removals: Vec<PendingWrite<'_, ()>> = keys
            .iter()
            .map(|key| table.remove(key).boxed())
            .collect();
        settle_all(removals).await?;

        debug!("Removed {} dependents of {}", keys.len(), scope);
        Ok(keys)
    }

    /// List the dependents of a release
    pub async fn list(&self, query: ReleaseQuery) -> Result<Vec<Dependent>> {
        let Some(version) = self.resolve(&query.pkg, &query.version).await? else {
            return Ok(Vec::new());
        };

        self.table()
            .find_all(&VersionKey::new(query.pkg, version))
            .await
    }

    /// Fetch a single dependent of a release
    pub async fn get(&self, query: DependentQuery) -> Result<Option<Dependent>> {
        let Some(version) = self.resolve(&query.pkg, &query.version).await? else {
            return Ok(None);
        };

        self.table()
            .get(&DependentKey::new(query.pkg, version, query.dependent))
            .await
    }
}
