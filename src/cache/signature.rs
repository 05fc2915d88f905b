//! Signature persistence
//!
//! A signature identifies what produced the current cache generation. It is
//! stored as a single line at a fixed path inside the cache store, next to the
//! cache-format marker. Both are written through a temporary sibling and a
//! rename so a crash mid-write never leaves a truncated value behind.

use crate::error::{CairnError, CairnResult};
use crate::project::ProjectConfig;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Fingerprint of the runtime/tool versions that produced a cache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    /// Create a signature from an explicit value. The value is trimmed and
    /// must fit on one line.
    pub fn new(value: impl Into<String>) -> CairnResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CairnError::SignatureInvalid("signature is empty".to_string()));
        }
        if trimmed.contains(['\n', '\r']) {
            return Err(CairnError::SignatureInvalid(format!(
                "signature must be a single line: {:?}",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Compute the signature from the project's requested engine versions
    ///
    /// Whitespace runs inside a version, newlines included, collapse to one
    /// space so the result always fits the one-line signature file.
    pub fn for_project(project: &ProjectConfig) -> Self {
        let version = |value: Option<&str>| {
            let words: Vec<&str> = value.unwrap_or_default().split_whitespace().collect();
            if words.is_empty() {
                "unspecified".to_string()
            } else {
                words.join(" ")
            }
        };
        Self(format!(
            "node {}; npm {}",
            version(project.runtime_version.as_deref()),
            version(project.package_manager_version.as_deref())
        ))
    }

    /// Resolve the signature for this build: an explicit override wins over
    /// the value computed from the project
    pub fn resolve(explicit: Option<&str>, project: &ProjectConfig) -> CairnResult<Self> {
        match explicit {
            Some(value) => Self::new(value),
            None => Ok(Self::for_project(project)),
        }
    }

    /// Get the signature text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reads and writes the signature and format marker files of a store
#[derive(Debug, Clone)]
pub struct SignatureStore {
    signature_path: PathBuf,
    format_path: PathBuf,
}

impl SignatureStore {
    /// File name of the signature inside the store root
    pub const SIGNATURE_FILE: &'static str = "signature";
    /// File name of the cache-format marker inside the store root
    pub const FORMAT_FILE: &'static str = "format";

    /// Create a signature store rooted at the cache store root
    pub fn new(store_root: &Path) -> Self {
        Self {
            signature_path: store_root.join(Self::SIGNATURE_FILE),
            format_path: store_root.join(Self::FORMAT_FILE),
        }
    }

    /// Path of the signature file
    pub fn signature_path(&self) -> &Path {
        &self.signature_path
    }

    /// Read the persisted signature. Returns `None` if none was ever written.
    pub fn read_signature(&self) -> CairnResult<Option<Signature>> {
        Ok(read_line(&self.signature_path)?.map(Signature))
    }

    /// Overwrite the persisted signature
    pub fn write_signature(&self, signature: &Signature) -> CairnResult<()> {
        write_atomic(&self.signature_path, signature.as_str())?;
        debug!("Wrote signature {:?}", signature.as_str());
        Ok(())
    }

    /// Read the persisted cache-format marker. An unparseable marker is
    /// reported as `Some(None)` so callers can treat it as a mismatch.
    pub fn read_format(&self) -> CairnResult<Option<Option<u32>>> {
        Ok(read_line(&self.format_path)?.map(|line| line.parse().ok()))
    }

    /// Overwrite the persisted cache-format marker
    pub fn write_format(&self, format_version: u32) -> CairnResult<()> {
        write_atomic(&self.format_path, &format_version.to_string())
    }

    /// Remove both marker files. Missing files are not an error.
    pub fn remove(&self) -> CairnResult<()> {
        for path in [&self.signature_path, &self.format_path] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CairnError::io(format!("removing {}", path.display()), e));
                }
            }
        }
        Ok(())
    }
}

/// Read the first line of a file, `None` if the file does not exist or is blank
fn read_line(path: &Path) -> CairnResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let line = content.lines().next().unwrap_or("").trim();
            if line.is_empty() {
                Ok(None)
            } else {
                Ok(Some(line.to_string()))
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CairnError::io(format!("reading {}", path.display()), e)),
    }
}

/// Write a single line to `path` via a temporary sibling and rename
fn write_atomic(path: &Path, line: &str) -> CairnResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| CairnError::Internal(format!("{} has no parent", path.display())))?;
    fs::create_dir_all(parent)
        .map_err(|e| CairnError::io(format!("creating {}", parent.display()), e))?;

    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("marker");
    let tmp = parent.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        writeln!(file, "{}", line)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(CairnError::io(format!("writing {}", path.display()), e));
    }
    Ok(())
}
