//! Import metadata for assemblies shipped with a package.

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use goblin::Object;
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;
use crate::store::{derive_guid, meta_path};

const ASSEMBLY_PATTERN: &str = "*.dll";

/// What kind of binary an assembly file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyKind {
    /// PE image importing the .NET runtime.
    Managed,
    /// Any other PE image.
    Native,
    /// Not a parseable PE image.
    Unknown,
}

impl fmt::Display for AssemblyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyKind::Managed => write!(f, "managed"),
            AssemblyKind::Native => write!(f, "native"),
            AssemblyKind::Unknown => write!(f, "unknown"),
        }
    }
}

pub fn classify(bytes: &[u8]) -> AssemblyKind {
    match Object::parse(bytes) {
        Ok(Object::PE(pe)) => {
            if pe
                .libraries
                .iter()
                .any(|lib| lib.eq_ignore_ascii_case("mscoree.dll"))
            {
                AssemblyKind::Managed
            } else {
                AssemblyKind::Native
            }
        }
        _ => AssemblyKind::Unknown,
    }
}

/// Sidecar text for an assembly. The guid only depends on the file name,
/// so reinstalling a package yields the same metadata.
pub fn assembly_meta(file_name: &str, kind: AssemblyKind) -> String {
    let guid = derive_guid(file_name);
    let validate_references = u8::from(kind != AssemblyKind::Managed);
    format!(
        "fileFormatVersion: 2\n\
         guid: {guid}\n\
         PluginImporter:\n\
         \x20 serializedVersion: 2\n\
         \x20 isPreloaded: 0\n\
         \x20 isOverridable: 0\n\
         \x20 isExplicitlyReferenced: 0\n\
         \x20 validateReferences: {validate_references}\n\
         \x20 platformData:\n\
         \x20 - first:\n\
         \x20     Any:\n\
         \x20   second:\n\
         \x20     enabled: 1\n\
         \x20 userData: {kind}\n"
    )
}

/// Write `<name>.dll.meta` for every assembly directly inside `dir`.
///
/// Returns the assemblies that got a sidecar.
#[tracing::instrument(skip(runtime))]
pub fn write_assembly_metadata<R: Runtime>(runtime: &R, dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(ASSEMBLY_PATTERN)?;
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let mut written = Vec::new();
    for path in runtime.read_dir(dir)? {
        let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if runtime.is_dir(&path) || !pattern.matches_with(&file_name, options) {
            continue;
        }

        let bytes = runtime.read(&path)?;
        let kind = classify(&bytes);
        runtime
            .write(&meta_path(&path), assembly_meta(&file_name, kind).as_bytes())
            .with_context(|| format!("Failed to write metadata for {:?}", path))?;
        debug!("{}: {} assembly", file_name, kind);
        written.push(path);
    }
    Ok(written)
}
