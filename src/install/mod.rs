//! Staged installation of a package and its dependencies.
//!
//! Files of every member are fetched first, then manifests are staged,
//! cross-linked by guid, saved and moved next to the package files. The
//! process is not transactional: an [`InstallJournal`] records what each
//! member went through and is attached to the error on failure.

mod assembly;
mod descriptor;
mod journal;
mod staging;

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::package::{
    Catalog, Dependency, PackageGroup, PackageVersion, VersionRef, enumerate_dependencies,
};
use crate::runtime::{Runtime, is_non_empty_dir};
use crate::source::{PackageSource, Source};
use crate::store::{
    ASSET_EXTENSION, Asset, AssetKind, AssetStore, Manifest, ManifestIdentity, meta_path,
};

pub use assembly::{AssemblyKind, classify, write_assembly_metadata};
pub use descriptor::{DESCRIPTOR_FILE, PackageDescriptor};
pub use journal::{InstallInterrupted, InstallJournal, InstallStep, JournalEntry};

use staging::StagingArea;

/// Outcome of a successful install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// `Name@version` of every installed member, in install order.
    pub installed: Vec<String>,
    /// Members left alone because their package was already installed.
    pub skipped: Vec<String>,
    pub journal: InstallJournal,
}

pub struct Installer<'a, R: Runtime> {
    runtime: &'a R,
    store: &'a dyn AssetStore,
    config: &'a Config,
}

impl<'a, R: Runtime> Installer<'a, R> {
    pub fn new(runtime: &'a R, store: &'a dyn AssetStore, config: &'a Config) -> Self {
        Self {
            runtime,
            store,
            config,
        }
    }

    /// A group counts as installed once its package directory has any content.
    pub fn is_installed(&self, group: &PackageGroup) -> bool {
        is_non_empty_dir(
            self.runtime,
            &group.package_directory(&self.config.packages_dir),
        )
    }

    /// Split the dependencies of `target` plus `target` itself into
    /// `(to install, already installed)`, dependencies first.
    ///
    /// Only the first version reached of each group is kept, since all
    /// versions of a group share one package directory.
    pub fn install_set(
        &self,
        catalog: &Catalog,
        target: VersionRef,
    ) -> Result<(Vec<VersionRef>, Vec<VersionRef>)> {
        let mut candidates = enumerate_dependencies(catalog, target)?;
        candidates.push(target);

        let mut groups = HashSet::new();
        let mut members = Vec::new();
        let mut skipped = Vec::new();
        for candidate in candidates {
            let group = catalog
                .group(candidate.group)
                .ok_or_else(|| anyhow!("Invalid version reference {}", catalog.label(candidate)))?;
            if !groups.insert(candidate.group) {
                warn!(
                    "{} is already part of this install with another version, skipping",
                    catalog.label(candidate)
                );
                continue;
            }
            if self.is_installed(group) {
                skipped.push(candidate);
            } else {
                members.push(candidate);
            }
        }
        Ok((members, skipped))
    }

    /// Install `version` of `package` (a dependency id or package name)
    /// from `source`, together with every dependency not yet installed.
    #[tracing::instrument(skip(self, source), fields(source = %source.key()))]
    pub async fn install_package<S: Source>(
        &self,
        source: &PackageSource<'_, S>,
        package: &str,
        version: &str,
    ) -> Result<InstallReport> {
        let catalog = source.catalog();
        let group_index = catalog
            .find_group(package)
            .ok_or_else(|| anyhow!("Package {} not found in {}", package, source.key()))?;
        let target = catalog.version_ref(group_index, version).ok_or_else(|| {
            let available = catalog
                .group(group_index)
                .map(|g| {
                    g.versions
                        .iter()
                        .map(|v| v.version.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            anyhow!(
                "Version {} of {} not found (available: {})",
                version,
                package,
                available
            )
        })?;

        let (members, skipped) = self.install_set(catalog, target)?;
        let skipped: Vec<String> = skipped.into_iter().map(|r| catalog.label(r)).collect();
        for label in &skipped {
            info!("{} is already installed, skipping", label);
        }

        let mut journal = InstallJournal::new(members.iter().map(|r| catalog.label(*r)));
        if members.is_empty() {
            info!("Nothing to install for {}", catalog.label(target));
            return Ok(InstallReport {
                installed: Vec::new(),
                skipped,
                journal,
            });
        }

        match self.run(catalog, &members, source.source(), &mut journal).await {
            Ok(()) => Ok(InstallReport {
                installed: members.iter().map(|r| catalog.label(*r)).collect(),
                skipped,
                journal,
            }),
            Err(e) => Err(e.context(InstallInterrupted { journal })),
        }
    }

    async fn run<S: Source>(
        &self,
        catalog: &Catalog,
        members: &[VersionRef],
        source: &S,
        journal: &mut InstallJournal,
    ) -> Result<()> {
        for (i, member) in members.iter().enumerate() {
            let (group, version) = member_of(catalog, *member)?;
            let dir = group.package_directory(&self.config.packages_dir);
            self.prepare_directory(&dir)?;
            journal.record(i, InstallStep::DirectoryPrepared);

            info!("Fetching {}", catalog.label(*member));
            source
                .fetch_files(group, version, &dir)
                .await
                .with_context(|| format!("Failed to fetch files of {}", catalog.label(*member)))?;
            journal.record(i, InstallStep::FilesFetched);

            write_assembly_metadata(self.runtime, &dir)?;
            journal.record(i, InstallStep::AssembliesIndexed);
        }
        self.store.refresh()?;

        let staging = StagingArea::create(self.runtime, self.store, &self.config.staging_dir)?;

        // Every identity exists before any of them is linked.
        for (i, member) in members.iter().enumerate() {
            let (group, version) = member_of(catalog, *member)?;
            let identity = ManifestIdentity {
                name: group.package_name.clone(),
                author: group.author.clone(),
                description: group.description.clone(),
                version: version.version.clone(),
                dependencies: Vec::new(),
            };
            self.store.add(
                &staging.asset_path(&group.package_name),
                Asset::Manifest(Manifest::new(identity)),
            )?;
            journal.record(i, InstallStep::IdentityStaged);
        }

        for (i, member) in members.iter().enumerate() {
            let (group, version) = member_of(catalog, *member)?;
            let path = staging.asset_path(&group.package_name);
            let mut manifest = self
                .store
                .load(&path)?
                .and_then(|asset| asset.as_manifest().cloned())
                .ok_or_else(|| anyhow!("Staged manifest {:?} is missing", path))?;

            let mut guids = Vec::new();
            for dependency in &version.dependencies {
                match dependency {
                    Dependency::Resolved(r) => {
                        guids.push(self.dependency_guid(catalog, *r, &staging)?);
                    }
                    Dependency::Unresolved(raw) => warn!(
                        "{}: skipping unresolved dependency {}",
                        catalog.label(*member),
                        raw
                    ),
                }
            }
            manifest.identity.dependencies = guids;
            self.store.set_dirty(&path, Asset::Manifest(manifest))?;
            journal.record(i, InstallStep::DependenciesLinked);
        }
        self.store.save()?;

        for (i, member) in members.iter().enumerate() {
            let (group, _) = member_of(catalog, *member)?;
            let staged = staging.asset_path(&group.package_name);
            let target = group
                .package_directory(&self.config.packages_dir)
                .join(format!("{}.{}", group.package_name, ASSET_EXTENSION));
            self.move_asset(&staged, &target)?;
            journal.record(i, InstallStep::ManifestCommitted);
        }

        for (i, member) in members.iter().enumerate() {
            let (group, version) = member_of(catalog, *member)?;
            let dir = group.package_directory(&self.config.packages_dir);
            PackageDescriptor::new(
                &version.dependency_id,
                &group.package_name,
                &group.author,
                &version.version,
                &group.description,
            )
            .write(self.runtime, &dir)?;
            journal.record(i, InstallStep::DescriptorWritten);
        }

        staging.remove()?;
        self.store.refresh()?;
        Ok(())
    }

    fn prepare_directory(&self, dir: &Path) -> Result<()> {
        if self.runtime.exists(dir) {
            debug!("Clearing {:?}", dir);
            self.runtime.remove_dir_all(dir)?;
        }
        self.runtime.create_dir_all(dir)
    }

    /// Guid of the manifest a member should reference for dependency `r`:
    /// the one staged in this run, else the installed one.
    fn dependency_guid(
        &self,
        catalog: &Catalog,
        r: VersionRef,
        staging: &StagingArea<'_, R>,
    ) -> Result<String> {
        let (group, _) = member_of(catalog, r)?;

        let staged = staging.asset_path(&group.package_name);
        if self.store.load(&staged)?.is_some()
            && let Some(guid) = self.store.guid(&staged)
        {
            return Ok(guid);
        }

        let dir = group.package_directory(&self.config.packages_dir);
        let expected = dir.join(format!("{}.{}", group.package_name, ASSET_EXTENSION));
        let path = if self.store.guid(&expected).is_some() {
            expected
        } else {
            self.store
                .find(AssetKind::Manifest, &[dir], Some(&group.package_name))
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("No manifest found for dependency {}", group.package_name))?
        };
        self.store
            .guid(&path)
            .ok_or_else(|| anyhow!("Manifest {:?} has no guid", path))
    }

    /// Move a saved asset and its sidecar, keeping its guid.
    fn move_asset(&self, from: &Path, to: &Path) -> Result<()> {
        self.runtime.copy(from, to)?;
        self.runtime.copy(&meta_path(from), &meta_path(to))?;
        self.store.delete(from)?;
        debug!("Moved {:?} to {:?}", from, to);
        Ok(())
    }
}

fn member_of(catalog: &Catalog, r: VersionRef) -> Result<(&PackageGroup, &PackageVersion)> {
    catalog
        .get(r)
        .ok_or_else(|| anyhow!("Invalid version reference {}", catalog.label(r)))
}

/// Descriptors of every installed package under `packages_dir`, by directory name.
pub fn installed_packages<R: Runtime>(
    runtime: &R,
    packages_dir: &Path,
) -> Result<Vec<(PathBuf, PackageDescriptor)>> {
    if !runtime.is_dir(packages_dir) {
        return Ok(Vec::new());
    }

    let mut packages = Vec::new();
    for dir in runtime.read_dir(packages_dir)? {
        let path = PackageDescriptor::path_in(&dir);
        if !runtime.exists(&path) {
            continue;
        }
        match PackageDescriptor::load(runtime, &path) {
            Ok(descriptor) => packages.push((dir, descriptor)),
            Err(e) => warn!("Skipping {:?}: {}", path, e),
        }
    }
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::DependencyCycle;
    use crate::runtime::RealRuntime;
    use crate::source::builder::fixtures::info;
    use crate::source::{MockSource, group_id_of};
    use crate::store::FileAssetStore;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    type Packages<'s> = &'s [(&'s str, &'s [(&'s str, &'s [&'s str])])];

    /// Provider registering `Author-<name>` groups with `Author-<name>-<version>` versions.
    fn provider(packages: Packages<'_>) -> MockSource {
        let packages: Vec<(String, Vec<(String, Vec<String>)>)> = packages
            .iter()
            .map(|(name, versions)| {
                let versions = versions
                    .iter()
                    .map(|(v, deps)| (v.to_string(), deps.iter().map(|d| d.to_string()).collect()))
                    .collect();
                (name.to_string(), versions)
            })
            .collect();

        let mut source = MockSource::new();
        source.expect_name().return_const("Test".to_string());
        source.expect_source_group().return_const("test".to_string());
        source
            .expect_map_version_to_group_id()
            .returning(|id| group_id_of(id));
        source.expect_load_packages().returning(move |catalog| {
            for (name, versions) in &packages {
                catalog.add_package_group(
                    info("Author", name),
                    versions.iter().map(|(version, deps)| {
                        (
                            version.clone(),
                            format!("Author-{}-{}", name, version),
                            deps.clone(),
                        )
                    }),
                )?;
            }
            Ok(())
        });
        source
    }

    /// Fetch writes `<Name>.dll`; fails for the package named `failing`.
    fn expect_fetch(source: &mut MockSource, failing: Option<&'static str>) {
        source
            .expect_fetch_files()
            .returning(move |group, _version, dir| {
                if failing == Some(group.package_name.as_str()) {
                    anyhow::bail!("network down");
                }
                fs::write(dir.join(format!("{}.dll", group.package_name)), b"MZ")?;
                Ok(())
            });
    }

    /// Foo 1.0.0 depends on Bar's latest.
    const FOO_BAR: Packages<'static> = &[
        ("Foo", &[("1.0.0", &["Author-Bar-LATEST"])]),
        ("Bar", &[("0.9.0", &[]), ("latest", &[])]),
    ];

    struct Project {
        dir: TempDir,
        config: Config,
    }

    impl Project {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let config = Config::for_root(dir.path().to_path_buf());
            Self { dir, config }
        }

        fn store<'r>(&self, runtime: &'r RealRuntime) -> FileAssetStore<'r, RealRuntime> {
            FileAssetStore::new(runtime, self.dir.path().to_path_buf(), self.config.asset_roots())
        }

        fn package(&self, name: &str) -> PathBuf {
            self.config.packages_dir.join(name)
        }

        fn manifest(&self, name: &str) -> Manifest {
            let path = self.package(name).join(format!("{}.asset", name));
            let asset: Asset = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
            asset.as_manifest().cloned().unwrap()
        }
    }

    async fn load<'s>(
        provider: MockSource,
        store: &'s dyn AssetStore,
        project: &Project,
    ) -> PackageSource<'s, MockSource> {
        let path = project.config.sources_dir.join("Test.asset");
        let mut source = PackageSource::new(provider, store, path);
        source.load_packages().await.unwrap();
        source
    }

    #[tokio::test]
    async fn test_installs_dependencies_before_dependent() {
        let project = Project::new();
        let runtime = RealRuntime;
        let store = project.store(&runtime);
        let mut provider = provider(FOO_BAR);
        expect_fetch(&mut provider, None);
        let source = load(provider, &store, &project).await;

        let installer = Installer::new(&runtime, &store, &project.config);
        let report = installer.install_package(&source, "Foo", "1.0.0").await.unwrap();

        assert_eq!(report.installed, vec!["Bar@latest", "Foo@1.0.0"]);
        assert!(report.skipped.is_empty());
        assert!(report.journal.entries().iter().all(|e| e.is_complete()));

        let foo = project.package("Foo");
        assert!(foo.join("Foo.dll").is_file());
        assert!(foo.join("Foo.dll.meta").is_file());
        assert!(foo.join("Foo.asset.meta").is_file());
        assert!(!project.config.staging_dir.exists());

        // Each manifest carries its own version.
        let foo_manifest = project.manifest("Foo");
        assert_eq!(foo_manifest.identity.version, "1.0.0");
        assert_eq!(project.manifest("Bar").identity.version, "latest");

        // Foo references Bar's manifest by guid, which follows the moved file.
        assert_eq!(foo_manifest.identity.dependencies.len(), 1);
        assert_eq!(
            store.path_of(&foo_manifest.identity.dependencies[0]),
            Some(project.package("Bar").join("Bar.asset"))
        );

        let descriptor =
            PackageDescriptor::load(&runtime, &foo.join(DESCRIPTOR_FILE)).unwrap();
        assert_eq!(descriptor.name, "author-foo-1.0.0");
        assert_eq!(descriptor.display_name, "Foo");
        assert_eq!(descriptor.version, "1.0.0");
    }

    #[tokio::test]
    async fn test_installed_dependency_is_linked_not_fetched() {
        let project = Project::new();
        let runtime = RealRuntime;
        let store = project.store(&runtime);

        let bar_path = project.package("Bar").join("Bar.asset");
        store
            .add(
                &bar_path,
                Asset::Manifest(Manifest::new(ManifestIdentity {
                    name: "Bar".into(),
                    author: "Author".into(),
                    description: String::new(),
                    version: "latest".into(),
                    dependencies: vec![],
                })),
            )
            .unwrap();
        store.save().unwrap();
        let bar_guid = store.guid(&bar_path).unwrap();

        let mut provider = provider(FOO_BAR);
        provider
            .expect_fetch_files()
            .withf(|group, _, _| group.package_name == "Foo")
            .times(1)
            .returning(|_, _, dir| Ok(fs::write(dir.join("Foo.dll"), b"MZ")?));
        let source = load(provider, &store, &project).await;

        let installer = Installer::new(&runtime, &store, &project.config);
        let report = installer.install_package(&source, "Foo", "1.0.0").await.unwrap();

        assert_eq!(report.installed, vec!["Foo@1.0.0"]);
        assert_eq!(report.skipped, vec!["Bar@latest"]);
        assert_eq!(project.manifest("Foo").identity.dependencies, vec![bar_guid]);
    }

    #[tokio::test]
    async fn test_installed_target_is_skipped() {
        let project = Project::new();
        let runtime = RealRuntime;
        let store = project.store(&runtime);
        fs::create_dir_all(project.package("Foo")).unwrap();
        fs::write(project.package("Foo").join("local.txt"), "keep").unwrap();

        let mut provider = provider(FOO_BAR);
        expect_fetch(&mut provider, None);
        let source = load(provider, &store, &project).await;

        let installer = Installer::new(&runtime, &store, &project.config);
        let report = installer.install_package(&source, "Author-Foo", "1.0.0").await.unwrap();

        assert_eq!(report.installed, vec!["Bar@latest"]);
        assert_eq!(report.skipped, vec!["Foo@1.0.0"]);
        assert!(project.package("Foo").join("local.txt").exists());
        assert!(!project.package("Foo").join(DESCRIPTOR_FILE).exists());
        assert!(project.package("Bar").join(DESCRIPTOR_FILE).exists());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_journaled() {
        let project = Project::new();
        let runtime = RealRuntime;
        let store = project.store(&runtime);
        let mut provider = provider(FOO_BAR);
        expect_fetch(&mut provider, Some("Bar"));
        let source = load(provider, &store, &project).await;

        let installer = Installer::new(&runtime, &store, &project.config);
        let err = installer
            .install_package(&source, "Foo", "1.0.0")
            .await
            .unwrap_err();

        let interrupted = err.downcast_ref::<InstallInterrupted>().unwrap();
        let bar = interrupted.journal.entry("Bar@latest").unwrap();
        assert_eq!(bar.steps, vec![InstallStep::DirectoryPrepared]);
        assert!(interrupted.journal.entry("Foo@1.0.0").unwrap().steps.is_empty());
        assert!(format!("{:#}", err).contains("network down"));
        assert!(!project.config.staging_dir.exists());
        assert!(!project.package("Foo").exists());
    }

    #[tokio::test]
    async fn test_missing_dependency_manifest_removes_staging() {
        let project = Project::new();
        let runtime = RealRuntime;
        let store = project.store(&runtime);
        // Bar counts as installed but has no manifest.
        fs::create_dir_all(project.package("Bar")).unwrap();
        fs::write(project.package("Bar").join("Bar.dll"), b"MZ").unwrap();

        let mut provider = provider(FOO_BAR);
        expect_fetch(&mut provider, None);
        let source = load(provider, &store, &project).await;

        let installer = Installer::new(&runtime, &store, &project.config);
        let err = installer
            .install_package(&source, "Foo", "1.0.0")
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("No manifest found for dependency Bar"));
        let interrupted = err.downcast_ref::<InstallInterrupted>().unwrap();
        let foo = interrupted.journal.entry("Foo@1.0.0").unwrap();
        assert!(foo.steps.contains(&InstallStep::IdentityStaged));
        assert!(!foo.steps.contains(&InstallStep::DependenciesLinked));
        assert!(!project.config.staging_dir.exists());
    }

    #[tokio::test]
    async fn test_failed_install_leaves_nothing_to_save() {
        let project = Project::new();
        let runtime = RealRuntime;
        let store = project.store(&runtime);
        fs::create_dir_all(project.package("Bar")).unwrap();
        fs::write(project.package("Bar").join("Bar.dll"), b"MZ").unwrap();

        let mut provider = provider(FOO_BAR);
        expect_fetch(&mut provider, None);
        let mut source = load(provider, &store, &project).await;

        let installer = Installer::new(&runtime, &store, &project.config);
        assert!(installer.install_package(&source, "Foo", "1.0.0").await.is_err());

        // Reloading the source saves the store again.
        source.load_packages().await.unwrap();
        store.save().unwrap();

        let staged = project.config.staging_dir.join("Foo.asset");
        assert!(!project.config.staging_dir.exists());
        assert_eq!(store.guid(&staged), None);
        assert!(store.load(&staged).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dependency_is_not_linked_to_similarly_named_manifest() {
        let project = Project::new();
        let runtime = RealRuntime;
        let store = project.store(&runtime);
        // Bar counts as installed but has no manifest; BarExtra has one.
        fs::create_dir_all(project.package("Bar")).unwrap();
        fs::write(project.package("Bar").join("Bar.dll"), b"MZ").unwrap();
        store
            .add(
                &project.package("BarExtra").join("BarExtra.asset"),
                Asset::Manifest(Manifest::new(ManifestIdentity {
                    name: "BarExtra".into(),
                    author: "Author".into(),
                    description: String::new(),
                    version: "1.0.0".into(),
                    dependencies: vec![],
                })),
            )
            .unwrap();
        store.save().unwrap();

        let mut provider = provider(FOO_BAR);
        expect_fetch(&mut provider, None);
        let source = load(provider, &store, &project).await;

        let installer = Installer::new(&runtime, &store, &project.config);
        let err = installer
            .install_package(&source, "Foo", "1.0.0")
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("No manifest found for dependency Bar"));
        assert!(!project.package("Foo").join("Foo.asset").exists());
    }

    #[tokio::test]
    async fn test_unresolved_dependency_is_skipped() {
        let project = Project::new();
        let runtime = RealRuntime;
        let store = project.store(&runtime);
        let mut provider = provider(&[("Foo", &[("1.0.0", &["Author-Ghost-1.0.0"])])]);
        expect_fetch(&mut provider, None);
        let source = load(provider, &store, &project).await;

        let installer = Installer::new(&runtime, &store, &project.config);
        let report = installer.install_package(&source, "Foo", "1.0.0").await.unwrap();

        assert_eq!(report.installed, vec!["Foo@1.0.0"]);
        assert!(project.manifest("Foo").identity.dependencies.is_empty());
    }

    #[tokio::test]
    async fn test_one_version_per_group() {
        let project = Project::new();
        let runtime = RealRuntime;
        let store = project.store(&runtime);
        let mut provider = provider(&[
            ("Foo", &[("1.0.0", &["Author-Bar-1.0.0", "Author-Baz-1.0.0"])]),
            ("Baz", &[("1.0.0", &["Author-Bar-LATEST"])]),
            ("Bar", &[("1.0.0", &[]), ("latest", &[])]),
        ]);
        expect_fetch(&mut provider, None);
        let source = load(provider, &store, &project).await;

        let installer = Installer::new(&runtime, &store, &project.config);
        let report = installer.install_package(&source, "Foo", "1.0.0").await.unwrap();

        assert_eq!(report.installed, vec!["Bar@1.0.0", "Baz@1.0.0", "Foo@1.0.0"]);
        let bar_guid = store.guid(&project.package("Bar").join("Bar.asset")).unwrap();
        assert_eq!(project.manifest("Baz").identity.dependencies, vec![bar_guid]);
    }

    #[tokio::test]
    async fn test_cycle_is_rejected_before_fetching() {
        let project = Project::new();
        let runtime = RealRuntime;
        let store = project.store(&runtime);
        let source = load(
            provider(&[
                ("A", &[("1.0", &["Author-B-1.0"])]),
                ("B", &[("1.0", &["Author-A-1.0"])]),
            ]),
            &store,
            &project,
        )
        .await;

        let installer = Installer::new(&runtime, &store, &project.config);
        let err = installer.install_package(&source, "A", "1.0").await.unwrap_err();

        let cycle = err.downcast_ref::<DependencyCycle>().unwrap();
        assert_eq!(cycle.path, vec!["A@1.0", "B@1.0", "A@1.0"]);
        assert!(!project.config.packages_dir.exists());
    }

    #[tokio::test]
    async fn test_unknown_package_or_version() {
        let project = Project::new();
        let runtime = RealRuntime;
        let store = project.store(&runtime);
        let source = load(provider(FOO_BAR), &store, &project).await;
        let installer = Installer::new(&runtime, &store, &project.config);

        let err = installer.install_package(&source, "Nope", "1.0").await.unwrap_err();
        assert!(err.to_string().contains("Package Nope not found"));

        let err = installer.install_package(&source, "Bar", "LATEST").await.unwrap_err();
        assert!(err.to_string().contains("available: 0.9.0, latest"));
    }

    #[tokio::test]
    async fn test_installed_packages_lists_descriptors() {
        let project = Project::new();
        let runtime = RealRuntime;
        assert!(installed_packages(&runtime, &project.config.packages_dir).unwrap().is_empty());

        let store = project.store(&runtime);
        let mut provider = provider(FOO_BAR);
        expect_fetch(&mut provider, None);
        let source = load(provider, &store, &project).await;
        Installer::new(&runtime, &store, &project.config)
            .install_package(&source, "Foo", "1.0.0")
            .await
            .unwrap();
        fs::create_dir_all(project.package("Loose")).unwrap();

        let names: Vec<String> = installed_packages(&runtime, &project.config.packages_dir)
            .unwrap()
            .into_iter()
            .map(|(_, d)| d.name)
            .collect();
        assert_eq!(names, vec!["author-bar-latest", "author-foo-1.0.0"]);
    }
}
