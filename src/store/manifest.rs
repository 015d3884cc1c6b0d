use serde::{Deserialize, Serialize};

/// Identity record of an installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestIdentity {
    pub name: String,
    pub author: String,
    pub description: String,
    pub version: String,
    /// Guids of the manifests this package depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Manifest asset stored next to an installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub identity: ManifestIdentity,
}

impl Manifest {
    pub fn new(identity: ManifestIdentity) -> Self {
        Self { identity }
    }
}
