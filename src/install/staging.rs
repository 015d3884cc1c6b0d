use anyhow::Result;
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;
use crate::store::{ASSET_EXTENSION, AssetStore, meta_path};

/// Scratch directory for manifests of an install in progress.
///
/// The directory, its sidecar and any manifests still queued in the store
/// under it are dropped with the guard, whether the install finished or not.
pub struct StagingArea<'a, R: Runtime> {
    runtime: &'a R,
    store: &'a dyn AssetStore,
    dir: PathBuf,
    removed: bool,
}

impl<'a, R: Runtime> StagingArea<'a, R> {
    /// Create an empty staging directory, discarding leftovers of an earlier run.
    pub fn create(runtime: &'a R, store: &'a dyn AssetStore, dir: &Path) -> Result<Self> {
        if runtime.exists(dir) {
            debug!("Removing stale staging directory {:?}", dir);
            runtime.remove_dir_all(dir)?;
        }
        runtime.create_dir_all(dir)?;
        Ok(Self {
            runtime,
            store,
            dir: dir.to_path_buf(),
            removed: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Staged manifest path for a package.
    pub fn asset_path(&self, package_name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", package_name, ASSET_EXTENSION))
    }

    /// Remove the staging directory now, reporting failures.
    pub fn remove(mut self) -> Result<()> {
        self.removed = true;
        self.remove_paths()
    }

    fn remove_paths(&self) -> Result<()> {
        self.store.discard(&self.dir);
        if self.runtime.exists(&self.dir) {
            self.runtime.remove_dir_all(&self.dir)?;
        }
        let sidecar = meta_path(&self.dir);
        if self.runtime.exists(&sidecar) {
            self.runtime.remove_file(&sidecar)?;
        }
        debug!("Removed staging directory {:?}", self.dir);
        Ok(())
    }
}

impl<R: Runtime> Drop for StagingArea<'_, R> {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = self.remove_paths() {
            warn!("Failed to clean up staging directory {:?}: {}", self.dir, e);
        }
    }
}
