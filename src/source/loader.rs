use anyhow::{Context, Result};
use log::{debug, info};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::{CatalogBuilder, Source, SourceDocument, SourceKey};
use crate::package::{Catalog, PackageGroup, resolve_dependencies};
use crate::store::{Asset, AssetStore};

/// Outcome of one load pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub groups: usize,
    pub versions: usize,
    pub resolved: usize,
    /// (versioned id of the dependent, raw dependency id)
    pub unresolved: Vec<(String, String)>,
}

/// A provider together with its loaded, persisted catalog.
///
/// Two package sources are equal when their name and source group match,
/// whatever their provider type or catalog contents.
pub struct PackageSource<'a, S: Source> {
    source: S,
    store: &'a dyn AssetStore,
    asset_path: PathBuf,
    catalog: Catalog,
    last_update: Option<u64>,
}

impl<'a, S: Source> PackageSource<'a, S> {
    /// Wrap `source`, persisting its catalog at `asset_path` in `store`.
    pub fn new(source: S, store: &'a dyn AssetStore, asset_path: PathBuf) -> Self {
        Self {
            source,
            store,
            asset_path,
            catalog: Catalog::default(),
            last_update: None,
        }
    }

    pub fn key(&self) -> SourceKey {
        SourceKey::new(self.source.name(), self.source.source_group())
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn source_group(&self) -> &str {
        self.source.source_group()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn groups(&self) -> &[PackageGroup] {
        self.catalog.groups()
    }

    /// Unix seconds of the last successful load.
    pub fn last_update(&self) -> Option<u64> {
        self.last_update
    }

    pub fn asset_path(&self) -> &Path {
        &self.asset_path
    }

    /// Reload the catalog from the provider and resolve its dependencies.
    ///
    /// Groups are persisted once as loaded and again once resolved. If the
    /// provider fails, the previous catalog is kept.
    #[tracing::instrument(skip(self))]
    pub async fn load_packages(&mut self) -> Result<LoadSummary> {
        let key = self.key();
        info!("Loading packages from {}", key);

        let mut builder = CatalogBuilder::new(key.clone());
        self.source
            .load_packages(&mut builder)
            .await
            .with_context(|| format!("Failed to load packages from {}", key))?;
        let (mut catalog, dependency_map) = builder.finish();
        debug!("{}: {} groups registered", key, catalog.len());

        self.persist(&key, &catalog, self.last_update)?;
        self.store.refresh()?;

        let source = &self.source;
        let resolution = resolve_dependencies(&mut catalog, &dependency_map, |raw| {
            source.map_version_to_group_id(raw)
        })
        .with_context(|| format!("Failed to resolve dependencies of {}", key))?;

        let now = unix_now();
        self.persist(&key, &catalog, Some(now))?;

        let summary = LoadSummary {
            groups: catalog.len(),
            versions: catalog.version_count(),
            resolved: resolution.resolved,
            unresolved: resolution.unresolved,
        };
        info!(
            "{}: {} groups, {} versions, {} unresolved dependencies",
            key,
            summary.groups,
            summary.versions,
            summary.unresolved.len()
        );

        self.catalog = catalog;
        self.last_update = Some(now);
        Ok(summary)
    }

    fn persist(&self, key: &SourceKey, catalog: &Catalog, last_update: Option<u64>) -> Result<()> {
        let document = SourceDocument {
            name: key.name.clone(),
            source_group: key.source_group.clone(),
            last_update,
            catalog: catalog.clone(),
        };
        self.store
            .add(&self.asset_path, Asset::Source(document))
            .with_context(|| format!("Failed to stage source asset {:?}", self.asset_path))?;
        self.store.save()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl<S: Source, T: Source> PartialEq<PackageSource<'_, T>> for PackageSource<'_, S> {
    fn eq(&self, other: &PackageSource<'_, T>) -> bool {
        self.name() == other.name() && self.source_group() == other.source_group()
    }
}

impl<S: Source> Eq for PackageSource<'_, S> {}

impl<S: Source> Hash for PackageSource<'_, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}
