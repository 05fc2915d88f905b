//! Persistent cache store layout
//!
//! ```text
//! <store root>/
//!   signature      one line, the producing signature
//!   format         one line, the cache-format marker
//!   <namespace>/   one directory tree per cached path
//! ```

use crate::cache::select::CachePath;
use crate::cache::signature::{Signature, SignatureStore};
use crate::cache::status::{self, CacheReport, Invalidation, ValidationInputs};
use crate::cache::transfer;
use crate::config::CacheConfig;
use crate::error::{CairnError, CairnResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The durable cache area outside the build workspace
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    entries: PathBuf,
    signatures: SignatureStore,
}

impl CacheStore {
    /// Open a store at `root` with entries under `namespace`. The root does
    /// not have to exist yet.
    pub fn open(root: &Path, namespace: &str) -> CairnResult<Self> {
        if root.exists() && !root.is_dir() {
            return Err(CairnError::StoreNotDirectory(root.to_path_buf()));
        }

        let invalid = |reason: String| CairnError::ConfigInvalid {
            path: PathBuf::from("cache.namespace"),
            reason,
        };
        let parsed = CachePath::parse(namespace)
            .map_err(|_| invalid(format!("{:?} is not a relative directory name", namespace)))?;
        let reserved = [SignatureStore::SIGNATURE_FILE, SignatureStore::FORMAT_FILE];
        if parsed
            .relative()
            .components()
            .next()
            .is_some_and(|first| reserved.iter().any(|name| first.as_os_str() == *name))
        {
            return Err(invalid(format!(
                "{:?} collides with a cache marker file",
                namespace
            )));
        }
        let namespace = parsed;

        Ok(Self {
            root: root.to_path_buf(),
            entries: namespace.under(root),
            signatures: SignatureStore::new(root),
        })
    }

    /// Open a store using the namespace from configuration
    pub fn from_config(root: &Path, config: &CacheConfig) -> CairnResult<Self> {
        Self::open(root, &config.namespace)
    }

    /// Store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the cached trees
    pub fn entries_dir(&self) -> &Path {
        &self.entries
    }

    /// Location of a cached directory inside the store
    pub fn entry_path(&self, path: &CachePath) -> PathBuf {
        path.under(&self.entries)
    }

    /// Signature and format marker files
    pub fn signatures(&self) -> &SignatureStore {
        &self.signatures
    }

    /// Whether the store holds at least one entry
    pub fn is_populated(&self) -> CairnResult<bool> {
        match fs::read_dir(&self.entries) {
            Ok(mut iter) => Ok(iter.next().is_some()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CairnError::io(
                format!("reading cache directory {}", self.entries.display()),
                e,
            )),
        }
    }

    /// Names of the top-level entries, sorted
    pub fn entry_names(&self) -> CairnResult<Vec<String>> {
        let iter = match fs::read_dir(&self.entries) {
            Ok(iter) => iter,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(CairnError::io(
                    format!("reading cache directory {}", self.entries.display()),
                    e,
                ))
            }
        };

        let mut names = Vec::new();
        for entry in iter {
            let entry = entry.map_err(|e| CairnError::io("reading cache entry", e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Forced invalidation for this build, if any
    pub fn invalidation(
        &self,
        config: &CacheConfig,
        requested: bool,
    ) -> CairnResult<Option<Invalidation>> {
        if requested {
            return Ok(Some(Invalidation::Requested));
        }
        if !config.enabled {
            return Ok(Some(Invalidation::Disabled));
        }

        // A store written before the marker existed has none; that is not a mismatch
        match self.signatures.read_format()? {
            Some(Some(stored)) if stored == config.format_version => Ok(None),
            Some(stored) => Ok(Some(Invalidation::FormatChanged {
                stored,
                current: config.format_version,
            })),
            None => Ok(None),
        }
    }

    /// Classify the cache for the current build
    pub fn status(
        &self,
        current: &Signature,
        config: &CacheConfig,
        invalidate: bool,
    ) -> CairnResult<CacheReport> {
        let invalidation = self.invalidation(config, invalidate)?;
        let stored = self.signatures.read_signature()?;
        let store_populated = self.is_populated()?;

        let report = status::evaluate(&ValidationInputs {
            current,
            stored: stored.as_ref(),
            store_populated,
            invalidation,
        });
        debug!(
            "Cache status {} (populated: {}, stored: {:?})",
            report.status,
            store_populated,
            stored.as_ref().map(Signature::as_str)
        );
        Ok(report)
    }

    /// Remove every entry and both marker files, leaving an empty store.
    /// Calling it on an empty or missing store is fine.
    pub fn clear(&self) -> CairnResult<()> {
        // Markers before entries: a store without a signature is never valid
        self.signatures.remove()?;

        transfer::remove_path(&self.entries).map_err(|e| {
            CairnError::io(
                format!("clearing cache directory {}", self.entries.display()),
                e,
            )
        })?;

        fs::create_dir_all(&self.entries).map_err(|e| {
            CairnError::io(
                format!("creating cache directory {}", self.entries.display()),
                e,
            )
        })?;

        info!("Cleared cache at {}", self.root.display());
        Ok(())
    }

    /// Persist the signature and format marker that describe the saved trees
    pub fn save_signature(&self, signature: &Signature, format_version: u32) -> CairnResult<()> {
        self.signatures.write_format(format_version)?;
        self.signatures.write_signature(signature)?;
        info!("Saved cache signature {}", signature);
        Ok(())
    }
}
