// src/record.rs

//! Logical record shapes for release lines
//!
//! Three record kinds are persisted, each keyed for point lookups:
//! - `ReleaseVersion`: one per (pkg, version), linked backwards via `previous_version`
//! - `ReleaseHead`: one per pkg, the most recently created version
//! - `Dependent`: one per (pkg, version, dependent)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key addressing everything recorded for one package
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageKey {
    pub pkg: String,
}

impl PackageKey {
    pub fn new(pkg: impl Into<String>) -> Self {
        Self { pkg: pkg.into() }
    }
}

/// Key addressing one version of a package
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionKey {
    pub pkg: String,
    pub version: String,
}

impl VersionKey {
    pub fn new(pkg: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            pkg: pkg.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.pkg, self.version)
    }
}

/// Key addressing one dependent of one package version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DependentKey {
    pub pkg: String,
    pub version: String,
    pub dependent: String,
}

impl DependentKey {
    pub fn new(
        pkg: impl Into<String>,
        version: impl Into<String>,
        dependent: impl Into<String>,
    ) -> Self {
        Self {
            pkg: pkg.into(),
            version: version.into(),
            dependent: dependent.into(),
        }
    }
}

/// A single version in a package's release line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseVersion {
    pub pkg: String,
    pub version: String,
    pub previous_version: Option<String>,
}

impl ReleaseVersion {
    pub fn new(pkg: String, version: String, previous_version: Option<String>) -> Self {
        Self {
            pkg,
            version,
            previous_version,
        }
    }

    pub fn key(&self) -> VersionKey {
        VersionKey::new(self.pkg.clone(), self.version.clone())
    }
}

/// Pointer to the most recently created version of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseHead {
    pub pkg: String,
    pub version: String,
    pub previous_version: Option<String>,
}

impl ReleaseHead {
    pub fn new(pkg: String, version: String, previous_version: Option<String>) -> Self {
        Self {
            pkg,
            version,
            previous_version,
        }
    }
}

impl From<ReleaseHead> for ReleaseVersion {
    fn from(head: ReleaseHead) -> Self {
        ReleaseVersion::new(head.pkg, head.version, head.previous_version)
    }
}

impl From<&ReleaseVersion> for ReleaseHead {
    fn from(release: &ReleaseVersion) -> Self {
        ReleaseHead::new(
            release.pkg.clone(),
            release.version.clone(),
            release.previous_version.clone(),
        )
    }
}

/// A package built against a specific version of the root package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependent {
    pub pkg: String,
    pub version: String,
    pub dependent: String,
    pub dependent_version: String,
}

impl Dependent {
    pub fn new(pkg: String, version: String, dependent: String, dependent_version: String) -> Self {
        Self {
            pkg,
            version,
            dependent,
            dependent_version,
        }
    }

    pub fn key(&self) -> DependentKey {
        DependentKey::new(
            self.pkg.clone(),
            self.version.clone(),
            self.dependent.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_serialize_camel_case() {
        let dep = Dependent::new(
            "release-test".to_string(),
            "4.0.0".to_string(),
            "release-test-dep".to_string(),
            "3.0.0".to_string(),
        );
        let json = serde_json::to_value(&dep).unwrap();
        assert_eq!(json["dependentVersion"], "3.0.0");
        assert_eq!(json["dependent"], "release-test-dep");

        let release = ReleaseVersion::new("p".to_string(), "2.0.0".to_string(), None);
        let json = serde_json::to_value(&release).unwrap();
        assert!(json["previousVersion"].is_null());
    }

    #[test]
    fn test_head_converts_to_release_version() {
        let head = ReleaseHead::new(
            "p".to_string(),
            "5.0.0".to_string(),
            Some("4.0.0".to_string()),
        );
        let release = ReleaseVersion::from(head);
        assert_eq!(release.key(), VersionKey::new("p", "5.0.0"));
        assert_eq!(release.previous_version.as_deref(), Some("4.0.0"));
    }

    #[test]
    fn test_version_key_display() {
        assert_eq!(VersionKey::new("@scope/pkg", "1.2.3").to_string(), "@scope/pkg@1.2.3");
    }
}
