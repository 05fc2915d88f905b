//! Error types for cairn
//!
//! All modules use `CairnResult<T>` as their return type. Expected absence
//! (no signature yet, a directory missing from the store) is never an error;
//! those cases are modelled as `Option` or `TransferOutcome::Skipped`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cairn operations
pub type CairnResult<T> = Result<T, CairnError>;

/// All errors that can occur in cairn
#[derive(Error, Debug)]
pub enum CairnError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid project manifest {path}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("Invalid cache directory {path:?}: {reason}")]
    CacheDirInvalid { path: String, reason: String },

    // Location errors
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(PathBuf),

    #[error("Cache store location is not a directory: {0}")]
    StoreNotDirectory(PathBuf),

    #[error("Invalid signature: {0}")]
    SignatureInvalid(String),

    // IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl CairnError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a cache directory misconfiguration error
    pub fn cache_dir(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CacheDirInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error comes from project or tool misconfiguration rather
    /// than a failing filesystem operation
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            Self::ConfigInvalid { .. }
                | Self::ManifestInvalid { .. }
                | Self::CacheDirInvalid { .. }
                | Self::SignatureInvalid(_)
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CacheDirInvalid { .. } => Some(
                "cacheDirectories entries must be relative paths inside the app directory, e.g. \"node_modules\"",
            ),
            Self::ManifestInvalid { .. } => {
                Some("cacheDirectories must be an array of strings in package.json")
            }
            Self::ConfigInvalid { .. } => Some("Run: cairn config init --force"),
            Self::WorkspaceNotFound(_) => Some("Pass the build directory with --workspace"),
            Self::StoreNotDirectory(_) => Some("Pass the cache directory with --store"),
            _ => None,
        }
    }
}
