//! Cache directory selection
//!
//! Determines which workspace-relative directories take part in caching. An
//! absent or empty declaration means "use the default directory", never
//! "cache nothing".

use crate::error::{CairnError, CairnResult};
use crate::project::ProjectConfig;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A validated, workspace-relative cache directory
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CachePath {
    /// Path as declared, used for display
    raw: String,
    /// Normalized relative path (only normal components)
    relative: PathBuf,
}

impl CachePath {
    /// Validate a declared cache directory
    ///
    /// Rejects empty strings, absolute paths, paths with `..` components and
    /// paths that resolve to the workspace root itself.
    pub fn parse(raw: &str) -> CairnResult<Self> {
        if raw.trim().is_empty() {
            return Err(CairnError::cache_dir(raw, "path is empty"));
        }

        let path = Path::new(raw);
        if path.is_absolute() || path.has_root() {
            return Err(CairnError::cache_dir(
                raw,
                "absolute paths are not allowed; use a path relative to the app directory",
            ));
        }

        let mut relative = PathBuf::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(CairnError::cache_dir(
                        raw,
                        "path escapes the app directory",
                    ));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(CairnError::cache_dir(raw, "absolute paths are not allowed"));
                }
            }
        }

        if relative.as_os_str().is_empty() {
            return Err(CairnError::cache_dir(
                raw,
                "path refers to the app directory itself",
            ));
        }

        Ok(Self {
            raw: raw.to_string(),
            relative,
        })
    }

    /// The normalized relative path
    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// The path as it was declared
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Resolve against a root directory (workspace or store namespace)
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(&self.relative)
    }
}

impl fmt::Display for CachePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Ordered, non-empty set of cache directories for one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDirectories(Vec<CachePath>);

impl CacheDirectories {
    /// Validate an explicit list of paths. Order and duplicates are kept.
    pub fn from_paths<S: AsRef<str>>(paths: &[S]) -> CairnResult<Self> {
        if paths.is_empty() {
            return Err(CairnError::User(
                "at least one cache directory is required".to_string(),
            ));
        }
        let parsed = paths
            .iter()
            .map(|p| CachePath::parse(p.as_ref()))
            .collect::<CairnResult<Vec<_>>>()?;
        Ok(Self(parsed))
    }

    /// Iterate in selection order
    pub fn iter(&self) -> impl Iterator<Item = &CachePath> {
        self.0.iter()
    }

    /// Number of selected directories
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty; a selection never is
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a CacheDirectories {
    type Item = &'a CachePath;
    type IntoIter = std::slice::Iter<'a, CachePath>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Declared cache directories, verbatim. Empty means "caller should use the
/// default".
pub fn cache_directories(project: &ProjectConfig) -> Vec<String> {
    project.cache_directories.clone().unwrap_or_default()
}

/// Select the directories to cache for this build, falling back to
/// `default_directory` when the project declares none
pub fn select_directories(
    project: &ProjectConfig,
    default_directory: &str,
) -> CairnResult<CacheDirectories> {
    let declared = cache_directories(project);
    if declared.is_empty() {
        return CacheDirectories::from_paths(&[default_directory]);
    }
    CacheDirectories::from_paths(declared.as_slice())
}
