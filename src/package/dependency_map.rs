use std::collections::{HashMap, HashSet};

/// Raw dependency edges collected while a source loads.
///
/// Keyed by versioned dependency id. Each entry is a set: duplicates are
/// dropped and first-seen order is kept so resolution is deterministic.
#[derive(Debug, Default, Clone)]
pub struct DependencyMap {
    edges: HashMap<String, Vec<String>>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the raw ids `version_id` depends on. Repeated calls extend the set.
    pub fn record<I, S>(&mut self, version_id: &str, dependencies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.edges.entry(version_id.to_string()).or_default();
        let mut seen: HashSet<String> = entry.iter().cloned().collect();
        for dependency in dependencies {
            let dependency = dependency.into();
            if seen.insert(dependency.clone()) {
                entry.push(dependency);
            }
        }
    }

    /// Raw ids recorded for `version_id`; empty if it was never recorded.
    pub fn get(&self, version_id: &str) -> &[String] {
        self.edges.get(version_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, version_id: &str) -> bool {
        self.edges.contains_key(version_id)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
