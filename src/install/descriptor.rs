use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// File name of the descriptor written into every installed package.
pub const DESCRIPTOR_FILE: &str = "package.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorAuthor {
    pub name: String,
}

/// Package descriptor (`package.json`) of an installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDescriptor {
    /// Lower-cased versioned dependency id.
    pub name: String,
    pub display_name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub author: DescriptorAuthor,
}

impl PackageDescriptor {
    pub fn new(
        dependency_id: &str,
        display_name: &str,
        author: &str,
        version: &str,
        description: &str,
    ) -> Self {
        Self {
            name: dependency_id.to_lowercase(),
            display_name: display_name.to_string(),
            version: version.to_string(),
            description: description.to_string(),
            author: DescriptorAuthor {
                name: author.to_string(),
            },
        }
    }

    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(DESCRIPTOR_FILE)
    }

    /// Write the descriptor into `dir`, replacing any existing one.
    pub fn write<R: Runtime>(&self, runtime: &R, dir: &Path) -> Result<PathBuf> {
        let path = Self::path_in(dir);
        let content = serde_json::to_string_pretty(self)?;
        runtime
            .write(&path, content.as_bytes())
            .with_context(|| format!("Failed to write package descriptor {:?}", path))?;
        Ok(path)
    }

    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid package descriptor {:?}", path))
    }
}
