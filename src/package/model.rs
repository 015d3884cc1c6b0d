//! Package groups, versions and the typed references between them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::source::SourceKey;

/// Name of the version every group may expose as its moving "latest" alias.
pub const LATEST_VERSION: &str = "latest";

/// Typed reference to a version inside a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionRef {
    pub group: usize,
    pub version: usize,
}

impl VersionRef {
    pub fn new(group: usize, version: usize) -> Self {
        Self { group, version }
    }
}

/// A dependency slot of a version after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dependency {
    Resolved(VersionRef),
    /// Raw id that matched neither a version nor a group's `latest`.
    Unresolved(String),
}

impl Dependency {
    pub fn resolved(&self) -> Option<VersionRef> {
        match self {
            Dependency::Resolved(r) => Some(*r),
            Dependency::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Dependency::Resolved(_))
    }
}

/// One installable version of a [`PackageGroup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageVersion {
    pub version: String,
    /// Versioned dependency id, unique across a source load.
    pub dependency_id: String,
    /// Index of the owning group in its catalog.
    pub group: usize,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

/// A logical package and all of its versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageGroup {
    pub author: String,
    pub package_name: String,
    pub description: String,
    /// Group-level dependency id, the join key for `latest` fallbacks.
    pub dependency_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: SourceKey,
    pub versions: Vec<PackageVersion>,
}

impl PackageGroup {
    /// Look up a version by its version string. Case-sensitive.
    pub fn version(&self, version: &str) -> Option<&PackageVersion> {
        self.versions.iter().find(|v| v.version == version)
    }

    pub fn version_index(&self, version: &str) -> Option<usize> {
        self.versions.iter().position(|v| v.version == version)
    }

    /// Directory this package is materialized into.
    pub fn package_directory(&self, packages_dir: &Path) -> PathBuf {
        packages_dir.join(&self.package_name)
    }
}

impl fmt::Display for PackageGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.package_name, self.dependency_id)
    }
}

/// All groups loaded from one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    groups: Vec<PackageGroup>,
}

impl Catalog {
    pub fn new(groups: Vec<PackageGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[PackageGroup] {
        &self.groups
    }

    pub(crate) fn groups_mut(&mut self) -> &mut [PackageGroup] {
        &mut self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, index: usize) -> Option<&PackageGroup> {
        self.groups.get(index)
    }

    /// Find a group by dependency id, falling back to package name.
    pub fn find_group(&self, key: &str) -> Option<usize> {
        self.groups
            .iter()
            .position(|g| g.dependency_id == key)
            .or_else(|| self.groups.iter().position(|g| g.package_name == key))
    }

    /// Reference to `version` of the group at `group`, if both exist.
    pub fn version_ref(&self, group: usize, version: &str) -> Option<VersionRef> {
        let index = self.groups.get(group)?.version_index(version)?;
        Some(VersionRef::new(group, index))
    }

    pub fn get(&self, r: VersionRef) -> Option<(&PackageGroup, &PackageVersion)> {
        let group = self.groups.get(r.group)?;
        let version = group.versions.get(r.version)?;
        Some((group, version))
    }

    /// Iterate every version together with its reference.
    pub fn versions(&self) -> impl Iterator<Item = (VersionRef, &PackageVersion)> {
        self.groups.iter().enumerate().flat_map(|(gi, group)| {
            group
                .versions
                .iter()
                .enumerate()
                .map(move |(vi, version)| (VersionRef::new(gi, vi), version))
        })
    }

    pub fn version_count(&self) -> usize {
        self.groups.iter().map(|g| g.versions.len()).sum()
    }

    /// Human readable label for a reference, used in logs and errors.
    pub fn label(&self, r: VersionRef) -> String {
        match self.get(r) {
            Some((group, version)) => format!("{}@{}", group.package_name, version.version),
            None => format!("<invalid {}:{}>", r.group, r.version),
        }
    }
}
