// src/options.rs

//! Per-operation option structures
//!
//! Every operation that addresses a package version takes a `VersionSelector`.
//! When omitted it defaults to `VersionSelector::Latest`, which resolves the
//! version through the package's release-line head at call time.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The sentinel string meaning "resolve via head"
pub const LATEST: &str = "latest";

/// Which version of a package an operation addresses
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VersionSelector {
    /// Resolve the version through the package's release-line head
    #[default]
    Latest,
    /// Address this version directly
    Exact(String),
}

impl VersionSelector {
    /// Build a selector from an optional version string
    ///
    /// `None`, the empty string and `"latest"` all select the head.
    pub fn from_option(version: Option<&str>) -> Self {
        match version {
            None => VersionSelector::Latest,
            Some(v) => VersionSelector::from(v),
        }
    }

    pub fn is_latest(&self) -> bool {
        self.exact().is_none()
    }

    /// The explicit version, if any
    ///
    /// An `Exact` holding the sentinel or an empty string counts as `Latest`,
    /// so the sentinel is never used as a stored version.
    pub fn exact(&self) -> Option<&str> {
        match self {
            VersionSelector::Exact(v) if !v.is_empty() && v != LATEST => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for VersionSelector {
    fn from(version: &str) -> Self {
        if version.is_empty() || version == LATEST {
            VersionSelector::Latest
        } else {
            VersionSelector::Exact(version.to_string())
        }
    }
}

impl From<String> for VersionSelector {
    fn from(version: String) -> Self {
        if version.is_empty() || version == LATEST {
            VersionSelector::Latest
        } else {
            VersionSelector::Exact(version)
        }
    }
}

impl FromStr for VersionSelector {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(VersionSelector::from(s))
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Latest => f.write_str(LATEST),
            VersionSelector::Exact(v) => f.write_str(v),
        }
    }
}

/// A dependent to record alongside a new release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentSpec {
    pub dependent: String,
    pub dependent_version: String,
}

impl DependentSpec {
    pub fn new(dependent: impl Into<String>, dependent_version: impl Into<String>) -> Self {
        Self {
            dependent: dependent.into(),
            dependent_version: dependent_version.into(),
        }
    }
}

/// Options for `ReleaseLine::create`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRelease {
    pub pkg: String,
    pub version: String,
    /// Derived from the current head when not supplied
    pub previous_version: Option<String>,
    pub dependents: Vec<DependentSpec>,
}

impl CreateRelease {
    pub fn new(pkg: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            pkg: pkg.into(),
            version: version.into(),
            previous_version: None,
            dependents: Vec::new(),
        }
    }

    pub fn previous_version(mut self, previous: impl Into<String>) -> Self {
        self.previous_version = Some(previous.into());
        self
    }

    pub fn dependent(
        mut self,
        dependent: impl Into<String>,
        dependent_version: impl Into<String>,
    ) -> Self {
        self.dependents
            .push(DependentSpec::new(dependent, dependent_version));
        self
    }
}

/// Addresses one release of a package (get, delete, history, dependent list)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseQuery {
    pub pkg: String,
    pub version: VersionSelector,
}

impl ReleaseQuery {
    /// Address the package's current head
    pub fn latest(pkg: impl Into<String>) -> Self {
        Self {
            pkg: pkg.into(),
            version: VersionSelector::Latest,
        }
    }

    /// Address an explicit version
    pub fn at(pkg: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            pkg: pkg.into(),
            version: VersionSelector::from(version.into()),
        }
    }
}

/// Options for `DependentSet::add`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddDependent {
    pub pkg: String,
    pub version: VersionSelector,
    pub dependent: String,
    pub dependent_version: String,
}

impl AddDependent {
    pub fn new(
        pkg: impl Into<String>,
        dependent: impl Into<String>,
        dependent_version: impl Into<String>,
    ) -> Self {
        Self {
            pkg: pkg.into(),
            version: VersionSelector::Latest,
            dependent: dependent.into(),
            dependent_version: dependent_version.into(),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = VersionSelector::from(version.into());
        self
    }
}

/// Options for `DependentSet::remove`
///
/// Without a dependent name every dependent of the resolved version is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveDependents {
    pub pkg: String,
    pub version: VersionSelector,
    pub dependent: Option<String>,
}

impl RemoveDependents {
    pub fn all(pkg: impl Into<String>) -> Self {
        Self {
            pkg: pkg.into(),
            version: VersionSelector::Latest,
            dependent: None,
        }
    }

    pub fn one(pkg: impl Into<String>, dependent: impl Into<String>) -> Self {
        Self {
            pkg: pkg.into(),
            version: VersionSelector::Latest,
            dependent: Some(dependent.into()),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = VersionSelector::from(version.into());
        self
    }
}

/// Options for `DependentSet::get`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentQuery {
    pub pkg: String,
    pub version: VersionSelector,
    pub dependent: String,
}

impl DependentQuery {
    pub fn new(pkg: impl Into<String>, dependent: impl Into<String>) -> Self {
        Self {
            pkg: pkg.into(),
            version: VersionSelector::Latest,
            dependent: dependent.into(),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = VersionSelector::from(version.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_sentinel_and_empty_resolve_to_latest() {
        assert_eq!(VersionSelector::from("latest"), VersionSelector::Latest);
        assert_eq!(VersionSelector::from(""), VersionSelector::Latest);
        assert_eq!(VersionSelector::from_option(None), VersionSelector::Latest);
        assert_eq!(VersionSelector::default(), VersionSelector::Latest);
        assert_eq!(
            "4.0.0".parse::<VersionSelector>().unwrap(),
            VersionSelector::Exact("4.0.0".to_string())
        );
    }

    #[test]
    fn test_selector_display_round_trips_sentinel() {
        assert_eq!(VersionSelector::Latest.to_string(), LATEST);
        assert_eq!(VersionSelector::from("1.0.0").exact(), Some("1.0.0"));
        assert!(ReleaseQuery::at("p", "latest").version.is_latest());
    }

    #[test]
    fn test_exact_sentinel_counts_as_latest() {
        let sentinel = VersionSelector::Exact(LATEST.to_string());
        assert!(sentinel.is_latest());
        assert_eq!(sentinel.exact(), None);

        let empty = VersionSelector::Exact(String::new());
        assert!(empty.is_latest());
        assert_eq!(empty.exact(), None);
    }

    #[test]
    fn test_create_release_builder() {
        let create = CreateRelease::new("p", "4.0.1")
            .previous_version("4.0.0")
            .dependent("d1", "1.0.0")
            .dependent("d2", "2.0.0");
        assert_eq!(create.previous_version.as_deref(), Some("4.0.0"));
        assert_eq!(create.dependents.len(), 2);
        assert_eq!(create.dependents[1], DependentSpec::new("d2", "2.0.0"));
    }
}
