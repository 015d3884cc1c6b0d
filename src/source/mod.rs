//! Package sources.
//!
//! A [`Source`] knows how to enumerate the packages of one catalog and how
//! to materialize the files of a single version. [`PackageSource`] wraps a
//! provider, owns its loaded [`Catalog`](crate::package::Catalog) and
//! persists it through the asset store.

pub(crate) mod builder;
mod index;
mod loader;
mod registry;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::package::{Catalog, PackageGroup, PackageVersion};

pub use builder::{CatalogBuilder, GroupInfo};
pub use index::{IndexSource, group_id_of};
pub use loader::{LoadSummary, PackageSource};
pub use registry::{SourceDescriptor, SourceGroups, SourceRegistry};

/// Identity of a source: its display name within a source group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceKey {
    pub name: String,
    pub source_group: String,
}

impl SourceKey {
    pub fn new(name: impl Into<String>, source_group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_group: source_group.into(),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.source_group)
    }
}

/// Persisted form of a loaded source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub name: String,
    pub source_group: String,
    /// Unix seconds of the last successful load.
    #[serde(default)]
    pub last_update: Option<u64>,
    #[serde(default)]
    pub catalog: Catalog,
}

impl SourceDocument {
    pub fn key(&self) -> SourceKey {
        SourceKey::new(&self.name, &self.source_group)
    }
}

/// Provider of packages.
///
/// Implementations register their groups during [`Source::load_packages`],
/// translate raw dependency ids that do not name a concrete version into
/// group ids, and fetch the files of a version on demand.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Source: Send + Sync {
    /// Display name of the source.
    fn name(&self) -> &str;

    /// Key of the source group this source belongs to.
    fn source_group(&self) -> &str;

    /// Register every group this source offers.
    async fn load_packages(&mut self, catalog: &mut CatalogBuilder) -> Result<()>;

    /// Map a raw dependency id to the dependency id of its group.
    ///
    /// Used when the raw id does not match any versioned id; the group's
    /// `latest` version is then used.
    fn map_version_to_group_id(&self, dependency_id: &str) -> String;

    /// Place the files of `version` into `target_dir`.
    async fn fetch_files(
        &self,
        group: &PackageGroup,
        version: &PackageVersion,
        target_dir: &Path,
    ) -> Result<()>;
}
