use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;

use crate::{
    config::Config,
    http::build_http_client,
    install::{Installer, installed_packages},
    runtime::Runtime,
    source::{IndexSource, PackageSource, Source, SourceKey, SourceRegistry},
    store::{AssetStore, FileAssetStore},
};

/// Load the source behind `index` and persist its catalog.
#[tracing::instrument(skip(runtime, root))]
pub async fn load<R: Runtime>(runtime: R, index: &str, root: Option<PathBuf>) -> Result<()> {
    let config = Config::new(&runtime, root)?;
    let store = FileAssetStore::open(&runtime, config.root.clone(), config.asset_roots())?;
    let mut source = open_source(&runtime, &store, &config, index).await?;

    let summary = source.load_packages().await?;

    println!(
        "Loaded {}: {} package(s), {} version(s)",
        source.key(),
        summary.groups,
        summary.versions
    );
    if !summary.unresolved.is_empty() {
        println!("Unresolved dependencies:");
        for (dependent, dependency) in &summary.unresolved {
            println!("  {} -> {}", dependent, dependency);
        }
    }
    Ok(())
}

/// Load the source behind `index`, then install `version` of `package` and
/// whatever it depends on.
#[tracing::instrument(skip(runtime, root))]
pub async fn install<R: Runtime>(
    runtime: R,
    index: &str,
    package: &str,
    version: &str,
    root: Option<PathBuf>,
) -> Result<()> {
    let config = Config::new(&runtime, root)?;
    let store = FileAssetStore::open(&runtime, config.root.clone(), config.asset_roots())?;
    let mut source = open_source(&runtime, &store, &config, index).await?;
    source.load_packages().await?;

    let installer = Installer::new(&runtime, &store, &config);
    let report = installer.install_package(&source, package, version).await?;

    for label in &report.skipped {
        println!("{} is already installed", label);
    }
    if report.installed.is_empty() {
        println!("Nothing to install.");
    }
    for label in &report.installed {
        println!("Installed {}", label);
    }
    Ok(())
}

/// List persisted sources by source group.
#[tracing::instrument(skip(runtime, root))]
pub fn sources<R: Runtime>(runtime: R, root: Option<PathBuf>) -> Result<()> {
    let config = Config::new(&runtime, root)?;
    let store = FileAssetStore::open(&runtime, config.root.clone(), config.asset_roots())?;
    let registry = SourceRegistry::new(&store, vec![config.sources_dir.clone()]);

    let groups = registry.source_groups()?;
    if groups.is_empty() {
        println!("No sources loaded.");
        return Ok(());
    }

    let mut names: Vec<&String> = groups.keys().collect();
    names.sort();
    for name in names {
        println!("{}", name);
        for descriptor in &groups[name] {
            println!(
                "  {} ({} package(s))",
                descriptor.key.name, descriptor.package_count
            );
        }
    }
    Ok(())
}

/// List installed packages
#[tracing::instrument(skip(runtime, root))]
pub fn list<R: Runtime>(runtime: R, root: Option<PathBuf>) -> Result<()> {
    let config = Config::new(&runtime, root)?;
    debug!("Listing packages from {:?}", config.packages_dir);

    let packages = installed_packages(&runtime, &config.packages_dir)?;
    if packages.is_empty() {
        println!("No packages installed.");
        return Ok(());
    }

    for (_, descriptor) in packages {
        println!(
            "{} {} ({})",
            descriptor.display_name, descriptor.version, descriptor.name
        );
    }
    Ok(())
}

async fn open_source<'a, R: Runtime>(
    runtime: &'a R,
    store: &'a dyn AssetStore,
    config: &Config,
    index: &str,
) -> Result<PackageSource<'a, IndexSource<'a, R>>> {
    let http = build_http_client(config.token.as_deref())?;
    let provider = IndexSource::open(runtime, http, index, config.download_dir.clone())
        .await
        .with_context(|| format!("Failed to open index {}", index))?;

    let key = SourceKey::new(provider.name(), provider.source_group());
    let asset_path = config.source_asset_path(&key);
    debug!("Source {} persists to {:?}", key, asset_path);
    Ok(PackageSource::new(provider, store, asset_path))
}
