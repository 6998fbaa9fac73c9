// src/release_line.rs

//! Release-line orchestration
//!
//! A release line is the version history of one package plus, for each
//! version, the dependents built against it. `ReleaseLine` owns the record
//! store handles and is the entry point for every operation:
//! - `create` links a new version to its predecessor and moves the head
//! - `get` merges a release record with its dependents via `compile`
//! - `delete` removes a version and its dependents
//!
//! Writes spanning several records are issued concurrently and are not
//! atomic: a failure part-way leaves whatever already landed in place.
//! `delete` never touches the head, so deleting the newest version leaves a
//! head that points at a version which no longer exists.

use crate::dependent::DependentSet;
use crate::error::{Error, Result};
use crate::fanout::{PendingWrite, settle_all};
use crate::options::{
    AddDependent, CreateRelease, LATEST, ReleaseQuery, RemoveDependents, VersionSelector,
};
use crate::record::{Dependent, PackageKey, ReleaseHead, ReleaseVersion, VersionKey};
use crate::store::Models;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// A release merged with its dependents, ready for consumption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledRelease {
    pub pkg: String,
    pub version: String,
    pub previous_version: Option<String>,
    /// Dependent name to the dependent's own version
    pub dependents: BTreeMap<String, String>,
}

/// Manages high level release-line operations
#[derive(Debug, Clone)]
pub struct ReleaseLine {
    models: Models,
}

impl ReleaseLine {
    pub fn new(models: Models) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &Models {
        &self.models
    }

    /// Dependent-set operations sharing this release line's head resolution
    pub fn dependent(&self) -> DependentSet<'_> {
        DependentSet::new(self)
    }

    /// Fetch the head of a package, `None` if it has never been released
    pub async fn head(&self, pkg: &str) -> Result<Option<ReleaseHead>> {
        self.models
            .release_line_head
            .get(&PackageKey::new(pkg))
            .await
    }

    /// Create a release, optionally recording its dependents
    ///
    /// Without an explicit previous version the current head's version is
    /// used; a package with no head starts a new chain. The head is always
    /// overwritten with the new release, whatever its version ordering.
    pub async fn create(&self, opts: CreateRelease) -> Result<ReleaseVersion> {
        let CreateRelease {
            pkg,
            version,
            previous_version,
            dependents,
        } = opts;

        if version.is_empty() || version == LATEST {
            return Err(Error::ReservedVersion(version));
        }

        let previous_version = match previous_version.filter(|v| !v.is_empty()) {
            Some(previous) => Some(previous),
            None => self.head(&pkg).await?.map(|head| head.version),
        };
        debug!(
            "Creating {}@{} (previous: {:?})",
            pkg, version, previous_version
        );

        let release = ReleaseVersion::new(pkg, version, previous_version);
        let head = ReleaseHead::from(&release);

        let mut writes: Vec<PendingWrite<'_, ()>> = Vec::with_capacity(2 + dependents.len());
        writes.push(
            self.models
                .release_line
                .create(release.clone())
                .map(|r| r.map(drop))
                .boxed(),
        );
        writes.push(
            self.models
                .release_line_head
                .create(head)
                .map(|r| r.map(drop))
                .boxed(),
        );

        let dependent_set = self.dependent();
        for spec in dependents {
            let add = AddDependent {
                pkg: release.pkg.clone(),
                version: VersionSelector::Exact(release.version.clone()),
                dependent: spec.dependent,
                dependent_version: spec.dependent_version,
            };
            writes.push(
                async move { dependent_set.add(add).await.map(drop) }.boxed(),
            );
        }

        settle_all(writes).await?;

        info!("Created release {}@{}", release.pkg, release.version);
        Ok(release)
    }

    /// Delete a release and every dependent recorded against it
    ///
    /// Resolving `Latest` requires a head. The head itself is left as is.
    pub async fn delete(&self, query: ReleaseQuery) -> Result<()> {
        let ReleaseQuery { pkg, version } = query;

        let (version, from_head) = match version.exact() {
            Some(version) => (version.to_string(), false),
            None => {
                let head = self.head(&pkg).await?.ok_or_else(|| Error::NoHead {
                    action: "delete",
                    pkg: pkg.clone(),
                })?;
                (head.version, true)
            }
        };

        let key = VersionKey::new(pkg.clone(), version.clone());
        let dependent_set = self.dependent();
        let writes: Vec<PendingWrite<'_, ()>> = vec![
            self.models.release_line.remove(&key),
            async move {
                dependent_set
                    .remove(RemoveDependents::all(pkg).version(version))
                    .await
                    .map(drop)
            }
            .boxed(),
        ];
        settle_all(writes).await?;

        if from_head {
            warn!("Head of {} still points at deleted version {}", key.pkg, key.version);
        }

        info!("Deleted release {}", key);
        Ok(())
    }

    /// Fetch a release and its dependents, compiled into one structure
    ///
    /// Returns `None` when the release (or, for `Latest`, the head) is absent.
    pub async fn get(&self, query: ReleaseQuery) -> Result<Option<CompiledRelease>> {
        let ReleaseQuery { pkg, version } = query;

        match version.exact() {
            None => {
                let Some(head) = self.head(&pkg).await? else {
                    return Ok(None);
                };
                let dependents = self
                    .models
                    .release_line_dep
                    .find_all(&VersionKey::new(pkg, head.version.clone()))
                    .await?;
                let release = ReleaseVersion::from(head);
                Ok(Some(Self::compile(&release, &release.version, dependents)))
            }
            Some(version) => {
                let version = version.to_string();
                let key = VersionKey::new(pkg.clone(), version.clone());
                let dependent_set = self.dependent();
                let (release, dependents) = tokio::try_join!(
                    self.models.release_line.get(&key),
                    dependent_set.list(ReleaseQuery::at(pkg, version.clone())),
                )?;
                Ok(release.map(|release| Self::compile(&release, &version, dependents)))
            }
        }
    }

    /// Compile a release record and its dependents into a `CompiledRelease`
    ///
    /// A dependent name appearing more than once keeps its last version.
    pub fn compile(
        release: &ReleaseVersion,
        version: &str,
        dependents: impl IntoIterator<Item = Dependent>,
    ) -> CompiledRelease {
        CompiledRelease {
            pkg: release.pkg.clone(),
            version: version.to_string(),
            previous_version: release.previous_version.clone(),
            dependents: dependents
                .into_iter()
                .map(|dep| (dep.dependent, dep.dependent_version))
                .collect(),
        }
    }

    /// Walk a release line backwards through `previous_version`, newest first
    ///
    /// The walk stops at the first version with no release record, or when a
    /// version repeats.
    pub async fn history(&self, query: ReleaseQuery) -> Result<Vec<ReleaseVersion>> {
        let ReleaseQuery { pkg, version } = query;

        let mut next = match version.exact() {
            Some(version) => Some(version.to_string()),
            None => self.head(&pkg).await?.map(|head| head.version),
        };

        let mut seen = HashSet::new();
        let mut chain = Vec::new();
        while let Some(version) = next.take() {
            if !seen.insert(version.clone()) {
                warn!("Release line of {} loops back to {}", pkg, version);
                break;
            }
            let Some(release) = self
                .models
                .release_line
                .get(&VersionKey::new(pkg.clone(), version))
                .await?
            else {
                break;
            };
            next = release.previous_version.clone();
            chain.push(release);
        }

        Ok(chain)
    }

    /// Every recorded version of a package
    pub async fn versions(&self, pkg: &str) -> Result<Vec<ReleaseVersion>> {
        self.models
            .release_line
            .find_all(&PackageKey::new(pkg))
            .await
    }

    /// The heads of every known package
    pub async fn packages(&self) -> Result<Vec<ReleaseHead>> {
        self.models.release_line_head.find_all(&()).await
    }
}
