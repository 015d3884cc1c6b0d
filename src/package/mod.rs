//! Package data model and dependency graph handling
//!
//! This module provides the group/version model loaded from a source, the
//! raw dependency edges collected while loading, their resolution into typed
//! references, and transitive dependency enumeration.

mod dependency_map;
pub(crate) mod model;
mod resolver;
mod walk;

pub use dependency_map::DependencyMap;
pub use model::{Catalog, Dependency, LATEST_VERSION, PackageGroup, PackageVersion, VersionRef};
pub use resolver::{CatalogError, ResolveSummary, VersionIndex, resolve_dependencies};
pub use walk::{DependencyCycle, enumerate_dependencies};
