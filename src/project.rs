//! Project configuration read from the app's `package.json`
//!
//! Only the fields the cache engine consumes are read: the declared cache
//! directories and the engine versions that feed the signature. Everything
//! else in the manifest is ignored.

use crate::error::{CairnError, CairnResult};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Manifest file name inside the workspace
pub const MANIFEST_FILE: &str = "package.json";

/// Cache-relevant view of the project manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Declared cache directories, in declaration order (None when absent)
    pub cache_directories: Option<Vec<String>>,
    /// Requested runtime version (`engines.node`)
    pub runtime_version: Option<String>,
    /// Requested package manager version (`engines.npm`)
    pub package_manager_version: Option<String>,
}

impl ProjectConfig {
    /// Build a config from an explicit directory list
    pub fn with_directories<I, S>(dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cache_directories: Some(dirs.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Load from `<workspace>/package.json`. A missing manifest yields an
    /// empty config.
    pub fn load(workspace: &Path) -> CairnResult<Self> {
        let path = workspace.join(MANIFEST_FILE);
        if !path.is_file() {
            debug!("No {} in {}", MANIFEST_FILE, workspace.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| CairnError::io(format!("reading {}", path.display()), e))?;
        Self::parse(&content).map_err(|reason| CairnError::ManifestInvalid { path, reason })
    }

    /// Parse manifest JSON text
    fn parse(content: &str) -> Result<Self, String> {
        let manifest: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;

        // `cacheDirectories` wins over the snake_case alias when both exist
        let cache_directories = match manifest
            .get("cacheDirectories")
            .or_else(|| manifest.get("cache_directories"))
        {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value::<Vec<String>>(value.clone())
                    .map_err(|_| "cacheDirectories must be an array of strings".to_string())?,
            ),
        };

        // Each engine is read on its own; a non-string value counts as unset
        let engine = |name: &str| {
            let value = manifest.get("engines")?.get(name)?;
            match value.as_str() {
                Some(version) => Some(version.to_string()),
                None => {
                    debug!("Ignoring non-string engines.{}: {}", name, value);
                    None
                }
            }
        };

        Ok(Self {
            cache_directories,
            runtime_version: engine("node"),
            package_manager_version: engine("npm"),
        })
    }
}
