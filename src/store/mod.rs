//! Asset store abstraction.
//!
//! Sources and package manifests are persisted as path-addressed assets.
//! Every asset has a `.meta` sidecar carrying a stable guid, which is how
//! manifests reference each other so that moving a file together with its
//! sidecar keeps references intact.
//!
//! Changes are staged in memory and only hit the disk on [`AssetStore::save`];
//! [`AssetStore::refresh`] rescans the configured roots.

mod file;
mod manifest;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::source::SourceDocument;

pub use file::{FileAssetStore, derive_guid};
pub use manifest::{Manifest, ManifestIdentity};

/// File extension of asset documents.
pub const ASSET_EXTENSION: &str = "asset";
/// Suffix appended to a file name to form its sidecar.
pub const META_SUFFIX: &str = ".meta";

/// Asset type, used to filter lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Source,
    Manifest,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Source => write!(f, "source"),
            AssetKind::Manifest => write!(f, "manifest"),
        }
    }
}

/// A persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Asset {
    Source(SourceDocument),
    Manifest(Manifest),
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Source(_) => AssetKind::Source,
            Asset::Manifest(_) => AssetKind::Manifest,
        }
    }

    pub fn as_manifest(&self) -> Option<&Manifest> {
        match self {
            Asset::Manifest(m) => Some(m),
            Asset::Source(_) => None,
        }
    }

    pub fn into_source(self) -> Option<SourceDocument> {
        match self {
            Asset::Source(doc) => Some(doc),
            Asset::Manifest(_) => None,
        }
    }
}

/// Path of the sidecar belonging to `path` (`Foo.asset` -> `Foo.asset.meta`).
pub fn meta_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(META_SUFFIX);
    PathBuf::from(name)
}

/// Path-addressed object store.
pub trait AssetStore: Send + Sync {
    /// Paths of assets of `kind` located under any of `roots`.
    ///
    /// With `name`, only assets whose file stem is exactly `name`.
    fn find(&self, kind: AssetKind, roots: &[PathBuf], name: Option<&str>) -> Vec<PathBuf>;

    /// Load the asset at `path`, preferring unsaved changes.
    fn load(&self, path: &Path) -> Result<Option<Asset>>;

    fn guid(&self, path: &Path) -> Option<String>;

    fn path_of(&self, guid: &str) -> Option<PathBuf>;

    /// Create or replace the asset at `path`. Returns its guid.
    fn add(&self, path: &Path, asset: Asset) -> Result<String>;

    /// Stage a modified version of an existing asset.
    fn set_dirty(&self, path: &Path, asset: Asset) -> Result<()>;

    /// Write every staged change to disk.
    ///
    /// On error, changes not yet written stay staged.
    fn save(&self) -> Result<()>;

    /// Forget unsaved assets under `prefix` without touching the disk.
    fn discard(&self, prefix: &Path);

    /// Rescan the roots so assets changed on disk become addressable.
    fn refresh(&self) -> Result<()>;

    /// Remove an asset and its sidecar.
    fn delete(&self, path: &Path) -> Result<()>;
}
