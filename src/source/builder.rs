use anyhow::Result;
use log::debug;
use std::collections::HashSet;

use super::SourceKey;
use crate::package::{Catalog, CatalogError, DependencyMap, PackageGroup, PackageVersion};

/// Descriptive fields of a group being registered.
#[derive(Debug, Clone, Default)]
pub struct GroupInfo {
    pub author: String,
    pub name: String,
    pub description: String,
    pub dependency_id: String,
    pub tags: Vec<String>,
}

/// Collects groups while a source loads.
///
/// Only [`PackageSource::load_packages`](super::PackageSource::load_packages)
/// creates one, so groups cannot be registered outside a load pass.
#[derive(Debug)]
pub struct CatalogBuilder {
    source: SourceKey,
    groups: Vec<PackageGroup>,
    dependency_map: DependencyMap,
    group_ids: HashSet<String>,
    version_ids: HashSet<String>,
}

impl CatalogBuilder {
    pub(crate) fn new(source: SourceKey) -> Self {
        Self {
            source,
            groups: Vec::new(),
            dependency_map: DependencyMap::new(),
            group_ids: HashSet::new(),
            version_ids: HashSet::new(),
        }
    }

    pub fn source(&self) -> &SourceKey {
        &self.source
    }

    /// Register one group with one version per `(version, versioned id,
    /// raw dependency ids)` tuple. Returns the index of the new group.
    ///
    /// Raw ids are kept aside and resolved once the whole source is loaded,
    /// so they may refer to groups registered later. Nothing is registered
    /// if the group id or any versioned id is already taken.
    pub fn add_package_group<I>(&mut self, info: GroupInfo, versions: I) -> Result<usize>
    where
        I: IntoIterator<Item = (String, String, Vec<String>)>,
    {
        if self.group_ids.contains(&info.dependency_id) {
            return Err(CatalogError::DuplicateGroupId(info.dependency_id).into());
        }

        let index = self.groups.len();
        let mut seen = HashSet::new();
        let mut package_versions = Vec::new();
        let mut edges = Vec::new();
        for (version, dependency_id, dependencies) in versions {
            if self.version_ids.contains(&dependency_id) || !seen.insert(dependency_id.clone()) {
                return Err(CatalogError::DuplicateVersionId(dependency_id).into());
            }
            package_versions.push(PackageVersion {
                version,
                dependency_id: dependency_id.clone(),
                group: index,
                dependencies: Vec::new(),
            });
            edges.push((dependency_id, dependencies));
        }

        for (dependency_id, dependencies) in edges {
            self.dependency_map.record(&dependency_id, dependencies);
        }
        self.version_ids.extend(seen);
        self.group_ids.insert(info.dependency_id.clone());

        debug!(
            "{}: registered {} with {} versions",
            self.source,
            info.name,
            package_versions.len()
        );
        self.groups.push(PackageGroup {
            author: info.author,
            package_name: info.name,
            description: info.description,
            dependency_id: info.dependency_id,
            tags: info.tags,
            source: self.source.clone(),
            versions: package_versions,
        });
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub(crate) fn finish(self) -> (Catalog, DependencyMap) {
        (Catalog::new(self.groups), self.dependency_map)
    }
}
