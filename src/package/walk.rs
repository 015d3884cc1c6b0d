//! Depth-first enumeration of transitive dependencies.

use anyhow::{Result, anyhow};
use log::debug;
use std::collections::HashMap;

use super::{Catalog, Dependency, VersionRef};

/// A dependency chain that leads back to one of its own members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCycle {
    /// Labels along the cycle; the first and last entries are the same version.
    pub path: Vec<String>,
}

impl std::fmt::Display for DependencyCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Dependency cycle detected: {}", self.path.join(" -> "))
    }
}

impl std::error::Error for DependencyCycle {}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// All versions reachable from `root`, dependencies before their dependents.
///
/// `root` itself is not included. A version reachable through several paths
/// appears once, at the position of its first completion. Unresolved slots
/// are skipped. Fails with [`DependencyCycle`] instead of looping.
pub fn enumerate_dependencies(catalog: &Catalog, root: VersionRef) -> Result<Vec<VersionRef>> {
    let mut order = Vec::new();
    let mut marks: HashMap<VersionRef, Mark> = HashMap::new();
    // (version, index of the next dependency slot to visit)
    let mut stack: Vec<(VersionRef, usize)> = vec![(root, 0)];
    marks.insert(root, Mark::InProgress);

    while let Some(&(current, slot)) = stack.last() {
        let (_, version) = catalog
            .get(current)
            .ok_or_else(|| anyhow!("Invalid version reference {}", catalog.label(current)))?;

        let Some(dependency) = version.dependencies.get(slot) else {
            stack.pop();
            marks.insert(current, Mark::Done);
            if current != root {
                order.push(current);
            }
            continue;
        };
        if let Some(top) = stack.last_mut() {
            top.1 += 1;
        }

        let child = match dependency {
            Dependency::Resolved(child) => *child,
            Dependency::Unresolved(raw) => {
                debug!("{}: skipping unresolved {}", catalog.label(current), raw);
                continue;
            }
        };

        match marks.get(&child) {
            Some(Mark::Done) => {}
            Some(Mark::InProgress) => {
                let start = stack.iter().position(|(r, _)| *r == child).unwrap_or(0);
                let mut path: Vec<String> = stack[start..]
                    .iter()
                    .map(|(r, _)| catalog.label(*r))
                    .collect();
                path.push(catalog.label(child));
                return Err(DependencyCycle { path }.into());
            }
            None => {
                marks.insert(child, Mark::InProgress);
                stack.push((child, 0));
            }
        }
    }

    Ok(order)
}
