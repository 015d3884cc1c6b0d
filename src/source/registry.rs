//! Discovery of persisted sources.
//!
//! The registry scans the asset store for source documents on first use and
//! groups them by source group. Results are cached until [`invalidate`] or
//! [`refresh`], so callers may see stale data in between.
//!
//! [`invalidate`]: SourceRegistry::invalidate
//! [`refresh`]: SourceRegistry::refresh

use anyhow::Result;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use super::SourceKey;
use crate::store::{Asset, AssetKind, AssetStore};

/// A persisted source found by discovery.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub key: SourceKey,
    pub path: PathBuf,
    pub last_update: Option<u64>,
    pub package_count: usize,
}

impl PartialEq for SourceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for SourceDescriptor {}

/// Sources keyed by source group.
pub type SourceGroups = HashMap<String, Vec<SourceDescriptor>>;

/// Lazily populated view of every source persisted under the asset roots.
pub struct SourceRegistry<'a> {
    store: &'a dyn AssetStore,
    roots: Vec<PathBuf>,
    cache: Mutex<Option<Arc<SourceGroups>>>,
}

impl<'a> SourceRegistry<'a> {
    pub fn new(store: &'a dyn AssetStore, roots: Vec<PathBuf>) -> Self {
        Self {
            store,
            roots,
            cache: Mutex::new(None),
        }
    }

    /// All known sources by group, scanning on first access.
    pub fn source_groups(&self) -> Result<Arc<SourceGroups>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(groups) = cache.as_ref() {
            return Ok(Arc::clone(groups));
        }

        let groups = Arc::new(self.scan());
        *cache = Some(Arc::clone(&groups));
        Ok(groups)
    }

    /// Drop the cached view; the next access scans again.
    pub fn invalidate(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Rescan the store's roots and rebuild the view.
    pub fn refresh(&self) -> Result<Arc<SourceGroups>> {
        self.invalidate();
        self.store.refresh()?;
        self.source_groups()
    }

    /// Sources of one group, empty if the group is unknown.
    pub fn group(&self, source_group: &str) -> Result<Vec<SourceDescriptor>> {
        Ok(self
            .source_groups()?
            .get(source_group)
            .cloned()
            .unwrap_or_default())
    }

    pub fn find(&self, key: &SourceKey) -> Result<Option<SourceDescriptor>> {
        Ok(self
            .source_groups()?
            .get(&key.source_group)
            .and_then(|sources| sources.iter().find(|s| &s.key == key).cloned()))
    }

    fn scan(&self) -> SourceGroups {
        let mut groups = SourceGroups::new();

        for path in self.store.find(AssetKind::Source, &self.roots, None) {
            let document = match self.store.load(&path) {
                Ok(Some(Asset::Source(document))) => document,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Skipping unreadable source {:?}: {}", path, e);
                    continue;
                }
            };

            let descriptor = SourceDescriptor {
                key: document.key(),
                path,
                last_update: document.last_update,
                package_count: document.catalog.len(),
            };
            let sources = groups.entry(descriptor.key.source_group.clone()).or_default();
            if sources.contains(&descriptor) {
                debug!("Ignoring duplicate source {} at {:?}", descriptor.key, descriptor.path);
                continue;
            }
            sources.push(descriptor);
        }

        debug!("Discovered sources in {} group(s)", groups.len());
        groups
    }
}
