//! Translation of raw dependency ids into typed version references.

use anyhow::Result;
use log::{debug, warn};
use std::collections::HashMap;

use super::{Catalog, Dependency, DependencyMap, LATEST_VERSION, VersionRef};

/// Errors raised when a catalog violates its id uniqueness rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Two groups registered the same group dependency id.
    DuplicateGroupId(String),
    /// Two versions registered the same versioned dependency id.
    DuplicateVersionId(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::DuplicateGroupId(id) => {
                write!(f, "Duplicate package dependency id '{}'", id)
            }
            CatalogError::DuplicateVersionId(id) => {
                write!(f, "Duplicate versioned dependency id '{}'", id)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Lookup tables over a fully loaded catalog.
pub struct VersionIndex {
    versions: HashMap<String, VersionRef>,
    groups: HashMap<String, usize>,
}

impl VersionIndex {
    /// Index every group and version id. Must only run once every group is loaded.
    pub fn build(catalog: &Catalog) -> Result<Self> {
        let mut versions = HashMap::new();
        let mut groups = HashMap::new();

        for (gi, group) in catalog.groups().iter().enumerate() {
            if groups.insert(group.dependency_id.clone(), gi).is_some() {
                return Err(CatalogError::DuplicateGroupId(group.dependency_id.clone()).into());
            }
        }
        for (r, version) in catalog.versions() {
            if versions.insert(version.dependency_id.clone(), r).is_some() {
                return Err(CatalogError::DuplicateVersionId(version.dependency_id.clone()).into());
            }
        }

        Ok(Self { versions, groups })
    }

    pub fn version(&self, versioned_id: &str) -> Option<VersionRef> {
        self.versions.get(versioned_id).copied()
    }

    pub fn group(&self, group_id: &str) -> Option<usize> {
        self.groups.get(group_id).copied()
    }

    /// Resolve one raw id: exact version first, then the group's `latest`.
    pub fn resolve<F>(&self, catalog: &Catalog, raw_id: &str, to_group_id: F) -> Dependency
    where
        F: Fn(&str) -> String,
    {
        if let Some(r) = self.version(raw_id) {
            return Dependency::Resolved(r);
        }

        let group_id = to_group_id(raw_id);
        if let Some(r) = self
            .group(&group_id)
            .and_then(|gi| catalog.version_ref(gi, LATEST_VERSION))
        {
            debug!("{} resolved to {} via '{}'", raw_id, group_id, LATEST_VERSION);
            return Dependency::Resolved(r);
        }

        Dependency::Unresolved(raw_id.to_string())
    }
}

/// Outcome of a resolution pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolveSummary {
    pub resolved: usize,
    /// (versioned id of the dependent, raw dependency id)
    pub unresolved: Vec<(String, String)>,
}

/// Replace every version's dependency list with references resolved from `map`.
///
/// Each version ends up with exactly one slot per raw id recorded for it.
#[tracing::instrument(skip_all)]
pub fn resolve_dependencies<F>(
    catalog: &mut Catalog,
    map: &DependencyMap,
    to_group_id: F,
) -> Result<ResolveSummary>
where
    F: Fn(&str) -> String,
{
    let index = VersionIndex::build(catalog)?;
    let mut summary = ResolveSummary::default();

    let resolved: Vec<(VersionRef, Vec<Dependency>)> = catalog
        .versions()
        .map(|(r, version)| {
            let dependencies = map
                .get(&version.dependency_id)
                .iter()
                .map(|raw| index.resolve(catalog, raw, &to_group_id))
                .collect();
            (r, dependencies)
        })
        .collect();

    for (r, dependencies) in resolved {
        let version = &mut catalog.groups_mut()[r.group].versions[r.version];
        for dependency in &dependencies {
            match dependency {
                Dependency::Resolved(_) => summary.resolved += 1,
                Dependency::Unresolved(raw) => {
                    warn!("{}: unresolved dependency {}", version.dependency_id, raw);
                    summary
                        .unresolved
                        .push((version.dependency_id.clone(), raw.clone()));
                }
            }
        }
        version.dependencies = dependencies;
    }

    Ok(summary)
}
