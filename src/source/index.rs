//! Source backed by a JSON package index.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{CatalogBuilder, GroupInfo, Source};
use crate::archive::{ArchiveExtractor, ArchiveExtractorImpl};
use crate::http::HttpClient;
use crate::package::{PackageGroup, PackageVersion};
use crate::runtime::Runtime;

#[derive(Debug, Clone, Deserialize)]
struct IndexDocument {
    name: String,
    source_group: String,
    #[serde(default)]
    packages: Vec<IndexPackage>,
}

#[derive(Debug, Clone, Deserialize)]
struct IndexPackage {
    author: String,
    name: String,
    #[serde(default)]
    description: String,
    dependency_id: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    versions: Vec<IndexVersion>,
}

#[derive(Debug, Clone, Deserialize)]
struct IndexVersion {
    version: String,
    dependency_id: String,
    #[serde(default)]
    dependencies: Vec<String>,
    /// Archive location, absolute or relative to the index.
    archive: Option<String>,
}

/// Where an index or archive lives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Url(Url),
    File(PathBuf),
}

impl Location {
    fn parse(location: &str) -> Result<Self> {
        if is_url(location) {
            let url = Url::parse(location).with_context(|| format!("Invalid URL {}", location))?;
            Ok(Location::Url(url))
        } else {
            Ok(Location::File(PathBuf::from(location)))
        }
    }

    /// Resolve `reference` against the directory of this location.
    fn resolve(&self, reference: &str) -> Result<Self> {
        if is_url(reference) {
            return Location::parse(reference);
        }
        match self {
            Location::Url(base) => {
                let url = base
                    .join(reference)
                    .with_context(|| format!("Invalid archive reference {}", reference))?;
                Ok(Location::Url(url))
            }
            Location::File(index) => {
                let dir = index.parent().unwrap_or_else(|| Path::new(""));
                Ok(Location::File(dir.join(reference)))
            }
        }
    }
}

fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Group id of a versioned dependency id: everything before the last `-`.
///
/// `Author-Bar-1.0.0` maps to `Author-Bar`.
pub fn group_id_of(dependency_id: &str) -> String {
    match dependency_id.rfind('-') {
        Some(i) => dependency_id[..i].to_string(),
        None => dependency_id.to_string(),
    }
}

/// Package source reading a JSON index from a file or an http(s) URL.
///
/// Each version names an archive which is extracted as-is into the
/// package directory on fetch.
pub struct IndexSource<'a, R: Runtime> {
    runtime: &'a R,
    http: HttpClient,
    extractor: ArchiveExtractorImpl,
    location: Location,
    download_dir: PathBuf,
    name: String,
    source_group: String,
    archives: HashMap<String, String>,
}

impl<'a, R: Runtime> IndexSource<'a, R> {
    /// Read the index at `location` to learn the source's identity.
    ///
    /// Packages are registered later, by `load_packages`.
    pub async fn open(
        runtime: &'a R,
        http: HttpClient,
        location: &str,
        download_dir: PathBuf,
    ) -> Result<Self> {
        let mut source = Self {
            runtime,
            http,
            extractor: ArchiveExtractorImpl::new(),
            location: Location::parse(location)?,
            download_dir,
            name: String::new(),
            source_group: String::new(),
            archives: HashMap::new(),
        };
        let document = source.read_index().await?;
        source.name = document.name;
        source.source_group = document.source_group;
        Ok(source)
    }

    #[tracing::instrument(skip(self))]
    async fn read_index(&self) -> Result<IndexDocument> {
        match &self.location {
            Location::Url(url) => self.http.get_json(url.as_str()).await,
            Location::File(path) => {
                let content = self.runtime.read_to_string(path)?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Invalid package index {:?}", path))
            }
        }
    }

    async fn download(&self, url: &Url, version: &PackageVersion) -> Result<PathBuf> {
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| anyhow!("Archive URL {} has no file name", url))?;
        let path = self
            .download_dir
            .join(format!("{}-{}", version.dependency_id, file_name));

        self.runtime.create_dir_all(&self.download_dir)?;
        let bytes = self
            .http
            .download_file(url.as_str(), || self.runtime.create_file(&path))
            .await?;
        debug!("Downloaded {} bytes to {:?}", bytes, path);
        Ok(path)
    }
}

#[async_trait]
impl<R: Runtime> Source for IndexSource<'_, R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_group(&self) -> &str {
        &self.source_group
    }

    async fn load_packages(&mut self, catalog: &mut CatalogBuilder) -> Result<()> {
        let document = self.read_index().await?;
        if document.name != self.name || document.source_group != self.source_group {
            warn!(
                "Index now identifies as {} [{}], keeping {} [{}]",
                document.name, document.source_group, self.name, self.source_group
            );
        }

        self.archives.clear();
        for package in document.packages {
            let mut versions = Vec::with_capacity(package.versions.len());
            for version in package.versions {
                match version.archive {
                    Some(archive) => {
                        self.archives.insert(version.dependency_id.clone(), archive);
                    }
                    None => debug!("{} has no archive", version.dependency_id),
                }
                versions.push((version.version, version.dependency_id, version.dependencies));
            }

            catalog.add_package_group(
                GroupInfo {
                    author: package.author,
                    name: package.name,
                    description: package.description,
                    dependency_id: package.dependency_id,
                    tags: package.tags,
                },
                versions,
            )?;
        }

        info!("{}: {} packages in index", self.name, catalog.len());
        Ok(())
    }

    fn map_version_to_group_id(&self, dependency_id: &str) -> String {
        group_id_of(dependency_id)
    }

    #[tracing::instrument(skip(self, group, version), fields(package = %group.package_name))]
    async fn fetch_files(
        &self,
        group: &PackageGroup,
        version: &PackageVersion,
        target_dir: &Path,
    ) -> Result<()> {
        let archive = self
            .archives
            .get(&version.dependency_id)
            .ok_or_else(|| anyhow!("No archive listed for {}", version.dependency_id))?;

        match self.location.resolve(archive)? {
            Location::File(path) => {
                debug!("Extracting local archive {:?}", path);
                self.extractor.extract(self.runtime, &path, target_dir)
            }
            Location::Url(url) => {
                let path = self.download(&url, version).await?;
                let result = self.extractor.extract(self.runtime, &path, target_dir);
                if let Err(e) = self.runtime.remove_file(&path) {
                    debug!("Failed to remove download {:?}: {}", path, e);
                }
                result
            }
        }
    }
}
