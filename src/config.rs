use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::runtime::Runtime;
use crate::source::SourceKey;
use crate::store::ASSET_EXTENSION;

/// Environment variable overriding the project root.
pub const ROOT_ENV: &str = "PKGSOURCE_ROOT";
/// Environment variable holding an optional bearer token for HTTP requests.
pub const TOKEN_ENV: &str = "PKGSOURCE_TOKEN";

/// Project layout and credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub root: PathBuf,
    /// Persisted sources.
    pub sources_dir: PathBuf,
    /// One directory per installed package.
    pub packages_dir: PathBuf,
    /// Scratch area for manifests during an install.
    pub staging_dir: PathBuf,
    /// Temporary location of downloaded archives.
    pub download_dir: PathBuf,
    pub token: Option<String>,
}

impl Config {
    /// Layout rooted at `root` (or the current directory), with the token
    /// and download cache taken from the environment.
    pub fn new<R: Runtime>(runtime: &R, root: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(root) => root,
            None => runtime.current_dir()?,
        };

        let mut config = Self::for_root(root);
        if let Some(cache) = runtime.cache_dir() {
            config.download_dir = cache.join("pkgsource").join("downloads");
        }
        config.token = runtime
            .env_var(TOKEN_ENV)
            .ok()
            .filter(|token| !token.is_empty());
        if config.token.is_some() {
            debug!("Using {} for authentication", TOKEN_ENV);
        }

        debug!("Project root: {:?}", config.root);
        Ok(config)
    }

    /// Layout rooted at `root` with no token; downloads stay inside the project.
    pub fn for_root(root: PathBuf) -> Self {
        Self {
            sources_dir: root.join("Sources"),
            packages_dir: root.join("Packages"),
            staging_dir: root.join("Staging").join("Temp"),
            download_dir: root.join("Staging").join("Downloads"),
            token: None,
            root,
        }
    }

    /// Directories scanned by the asset store.
    pub fn asset_roots(&self) -> Vec<PathBuf> {
        vec![
            self.sources_dir.clone(),
            self.packages_dir.clone(),
            self.staging_dir.clone(),
        ]
    }

    /// Where the document of source `key` is persisted.
    pub fn source_asset_path(&self, key: &SourceKey) -> PathBuf {
        self.sources_dir
            .join(sanitize(&key.source_group))
            .join(format!("{}.{}", sanitize(&key.name), ASSET_EXTENSION))
    }
}

/// Make a display name usable as a single path segment.
fn sanitize(segment: &str) -> String {
    let clean: String = segment
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | ' ' => c,
            _ => '_',
        })
        .collect();
    let clean = clean.trim_matches(|c| c == '.' || c == ' ');
    if clean.is_empty() {
        "_".to_string()
    } else {
        clean.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    #[test]
    fn test_config_from_environment() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_current_dir()
            .returning(|| Ok(PathBuf::from("/work/project")));
        runtime
            .expect_cache_dir()
            .returning(|| Some(PathBuf::from("/home/user/.cache")));
        runtime
            .expect_env_var()
            .with(eq(TOKEN_ENV))
            .returning(|_| Ok("secret".to_string()));

        let config = Config::new(&runtime, None).unwrap();

        assert_eq!(config.root, PathBuf::from("/work/project"));
        assert_eq!(config.packages_dir, PathBuf::from("/work/project/Packages"));
        assert_eq!(config.staging_dir, PathBuf::from("/work/project/Staging/Temp"));
        assert_eq!(
            config.download_dir,
            PathBuf::from("/home/user/.cache/pkgsource/downloads")
        );
        assert_eq!(config.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_config_explicit_root_without_token() {
        let mut runtime = MockRuntime::new();
        runtime.expect_cache_dir().returning(|| None);
        runtime
            .expect_env_var()
            .with(eq(TOKEN_ENV))
            .returning(|_| Err(std::env::VarError::NotPresent));

        let config = Config::new(&runtime, Some(PathBuf::from("/p"))).unwrap();

        assert_eq!(config.root, PathBuf::from("/p"));
        assert_eq!(config.download_dir, PathBuf::from("/p/Staging/Downloads"));
        assert!(config.token.is_none());
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let mut runtime = MockRuntime::new();
        runtime.expect_cache_dir().returning(|| None);
        runtime
            .expect_env_var()
            .returning(|_| Ok(String::new()));

        let config = Config::new(&runtime, Some(PathBuf::from("/p"))).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn test_source_asset_path_is_sanitized() {
        let config = Config::for_root(PathBuf::from("/p"));
        assert_eq!(
            config.source_asset_path(&SourceKey::new("My Source", "mods")),
            PathBuf::from("/p/Sources/mods/My Source.asset")
        );
        assert_eq!(
            config.source_asset_path(&SourceKey::new("a/b:c", "..")),
            PathBuf::from("/p/Sources/_/a_b_c.asset")
        );
    }

    #[test]
    fn test_asset_roots() {
        let config = Config::for_root(PathBuf::from("/p"));
        assert_eq!(
            config.asset_roots(),
            vec![
                PathBuf::from("/p/Sources"),
                PathBuf::from("/p/Packages"),
                PathBuf::from("/p/Staging/Temp"),
            ]
        );
    }
}
