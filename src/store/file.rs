//! File-backed asset store.

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{ASSET_EXTENSION, Asset, AssetKind, AssetStore, meta_path};
use crate::runtime::Runtime;

/// Deterministic 32 hex digit guid derived from `seed`.
pub fn derive_guid(seed: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(seed.as_bytes()));
    digest[..32].to_string()
}

/// Contents of a plain asset sidecar.
pub fn sidecar_text(guid: &str) -> String {
    format!("fileFormatVersion: 2\nguid: {}\n", guid)
}

/// Extract the guid line from sidecar text.
pub fn parse_sidecar_guid(text: &str) -> Option<String> {
    text.lines()
        .find_map(|line| line.trim().strip_prefix("guid:"))
        .map(|guid| guid.trim().to_string())
        .filter(|guid| !guid.is_empty())
}

#[derive(Debug, Clone)]
struct Entry {
    kind: AssetKind,
    guid: String,
}

#[derive(Default)]
struct StoreState {
    /// Staged assets not yet written by `save`.
    pending: BTreeMap<PathBuf, Asset>,
    /// Assets known on disk (or staged) with their guids.
    index: BTreeMap<PathBuf, Entry>,
}

/// Asset store persisting JSON documents under a project root.
pub struct FileAssetStore<'a, R: Runtime> {
    runtime: &'a R,
    root: PathBuf,
    scan_roots: Vec<PathBuf>,
    state: Mutex<StoreState>,
}

impl<'a, R: Runtime> FileAssetStore<'a, R> {
    /// Create a store for the project at `root` that scans `scan_roots` on refresh.
    pub fn new(runtime: &'a R, root: PathBuf, scan_roots: Vec<PathBuf>) -> Self {
        Self {
            runtime,
            root,
            scan_roots,
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Create a store and run an initial refresh.
    pub fn open(runtime: &'a R, root: PathBuf, scan_roots: Vec<PathBuf>) -> Result<Self> {
        let store = Self::new(runtime, root, scan_roots);
        store.refresh()?;
        Ok(store)
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Guid for a path, seeded by its location relative to the project root.
    fn guid_for(&self, path: &Path) -> String {
        let relative = pathdiff::diff_paths(path, &self.root).unwrap_or_else(|| path.to_path_buf());
        let seed = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        derive_guid(&seed)
    }

    fn read_asset(&self, path: &Path) -> Result<Asset> {
        let content = self.runtime.read_to_string(path)?;
        serde_json::from_str(&content).with_context(|| format!("Invalid asset document {:?}", path))
    }

    /// Read the sidecar guid, writing a fresh sidecar if there is none.
    fn ensure_sidecar(&self, path: &Path) -> Result<String> {
        let sidecar = meta_path(path);
        if self.runtime.exists(&sidecar)
            && let Some(guid) = parse_sidecar_guid(&self.runtime.read_to_string(&sidecar)?)
        {
            return Ok(guid);
        }

        let guid = self.guid_for(path);
        self.runtime.write(&sidecar, sidecar_text(&guid).as_bytes())?;
        Ok(guid)
    }

    fn write_asset(&self, path: &Path, asset: &Asset, guid: &str) -> Result<()> {
        if let Some(parent) = path.parent()
            && !self.runtime.exists(parent)
        {
            self.runtime.create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(asset)?;
        self.runtime
            .write(path, content.as_bytes())
            .with_context(|| format!("Failed to save asset {:?}", path))?;

        let sidecar = meta_path(path);
        if !self.runtime.exists(&sidecar) {
            self.runtime.write(&sidecar, sidecar_text(guid).as_bytes())?;
        }
        Ok(())
    }

    fn collect_assets(&self, dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
        for entry in self.runtime.read_dir(dir)? {
            if self.runtime.is_dir(&entry) {
                self.collect_assets(&entry, found)?;
            } else if entry.extension().is_some_and(|ext| ext == ASSET_EXTENSION) {
                found.push(entry);
            }
        }
        Ok(())
    }
}

impl<R: Runtime> AssetStore for FileAssetStore<'_, R> {
    fn find(&self, kind: AssetKind, roots: &[PathBuf], name: Option<&str>) -> Vec<PathBuf> {
        self.state()
            .index
            .iter()
            .filter(|(_, entry)| entry.kind == kind)
            .map(|(path, _)| path)
            .filter(|path| roots.iter().any(|root| path.starts_with(root)))
            .filter(|path| match name {
                Some(name) => path.file_stem().is_some_and(|stem| stem == name),
                None => true,
            })
            .cloned()
            .collect()
    }

    fn load(&self, path: &Path) -> Result<Option<Asset>> {
        if let Some(asset) = self.state().pending.get(path) {
            return Ok(Some(asset.clone()));
        }
        if !self.runtime.exists(path) {
            return Ok(None);
        }
        self.read_asset(path).map(Some)
    }

    fn guid(&self, path: &Path) -> Option<String> {
        self.state().index.get(path).map(|entry| entry.guid.clone())
    }

    fn path_of(&self, guid: &str) -> Option<PathBuf> {
        self.state()
            .index
            .iter()
            .find(|(_, entry)| entry.guid == guid)
            .map(|(path, _)| path.clone())
    }

    #[tracing::instrument(skip(self, asset))]
    fn add(&self, path: &Path, asset: Asset) -> Result<String> {
        let mut state = self.state();
        let guid = match state.index.get(path) {
            Some(entry) => entry.guid.clone(),
            None => self.guid_for(path),
        };
        state.index.insert(
            path.to_path_buf(),
            Entry {
                kind: asset.kind(),
                guid: guid.clone(),
            },
        );
        state.pending.insert(path.to_path_buf(), asset);
        debug!("Staged new asset {:?} ({})", path, guid);
        Ok(guid)
    }

    fn set_dirty(&self, path: &Path, asset: Asset) -> Result<()> {
        let mut state = self.state();
        let entry = state
            .index
            .get_mut(path)
            .ok_or_else(|| anyhow!("Asset {:?} is not known to the store", path))?;
        entry.kind = asset.kind();
        state.pending.insert(path.to_path_buf(), asset);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn save(&self) -> Result<()> {
        let mut state = self.state();
        let paths: Vec<PathBuf> = state.pending.keys().cloned().collect();

        // An entry leaves the queue only once it is on disk.
        for path in paths {
            let Some(asset) = state.pending.get(&path) else {
                continue;
            };
            let kind = asset.kind();
            let guid = match state.index.get(&path) {
                Some(entry) => entry.guid.clone(),
                None => self.guid_for(&path),
            };
            self.write_asset(&path, asset, &guid)?;

            state.pending.remove(&path);
            state.index.insert(path, Entry { kind, guid });
        }

        Ok(())
    }

    fn discard(&self, prefix: &Path) {
        let mut state = self.state();
        let before = state.pending.len();
        state.pending.retain(|path, _| !path.starts_with(prefix));
        state.index.retain(|path, _| !path.starts_with(prefix));
        debug!(
            "Discarded {} unsaved asset(s) under {:?}",
            before - state.pending.len(),
            prefix
        );
    }

    #[tracing::instrument(skip(self))]
    fn refresh(&self) -> Result<()> {
        let mut found = Vec::new();
        for root in &self.scan_roots {
            if self.runtime.is_dir(root) {
                self.collect_assets(root, &mut found)?;
            }
        }

        let mut index = BTreeMap::new();
        for path in found {
            let kind = match self.read_asset(&path) {
                Ok(asset) => asset.kind(),
                Err(e) => {
                    warn!("Skipping unreadable asset {:?}: {}", path, e);
                    continue;
                }
            };
            let guid = self.ensure_sidecar(&path)?;
            index.insert(path, Entry { kind, guid });
        }

        let mut state = self.state();
        // Unsaved assets stay addressable across a refresh.
        let pending: Vec<(PathBuf, Entry)> = state
            .pending
            .keys()
            .filter_map(|path| state.index.get(path).map(|e| (path.clone(), e.clone())))
            .collect();
        index.extend(pending);
        debug!("Asset store refreshed: {} asset(s)", index.len());
        state.index = index;
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<()> {
        let mut state = self.state();
        state.pending.remove(path);
        state.index.remove(path);

        if self.runtime.exists(path) {
            self.runtime.remove_file(path)?;
        }
        let sidecar = meta_path(path);
        if self.runtime.exists(&sidecar) {
            self.runtime.remove_file(&sidecar)?;
        }
        Ok(())
    }
}
