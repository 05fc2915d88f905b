//! Moving cached trees between the workspace and the store
//!
//! Every selected directory is copied as a whole tree. The copy is staged in a
//! temporary sibling of the destination and renamed into place, so readers see
//! either the old tree or the complete new one. Permission bits are carried
//! over and symlinks are recreated rather than followed.

use crate::cache::select::{CacheDirectories, CachePath};
use crate::cache::store::CacheStore;
use crate::error::{CairnError, CairnResult};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Why a directory was not transferred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Restore: the store has no entry for this path
    NotCached,
    /// Save: the workspace has nothing at this path
    NothingToCache,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCached => write!(f, "not cached - skipping"),
            Self::NothingToCache => write!(f, "nothing to cache"),
        }
    }
}

/// Result of transferring one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Copied { path: CachePath },
    Skipped { path: CachePath, reason: SkipReason },
}

impl TransferOutcome {
    /// The directory this outcome is about
    pub fn path(&self) -> &CachePath {
        match self {
            Self::Copied { path } | Self::Skipped { path, .. } => path,
        }
    }

    /// Whether anything was copied
    pub fn is_copied(&self) -> bool {
        matches!(self, Self::Copied { .. })
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copied { path } => write!(f, "- {}", path),
            Self::Skipped { path, reason } => write!(f, "- {} ({})", path, reason),
        }
    }
}

/// Copy cached trees from the store into the workspace
///
/// Directories absent from the store are skipped. Anything already present in
/// the workspace at a restored path is replaced.
pub fn restore(
    directories: &CacheDirectories,
    store: &CacheStore,
    workspace: &Path,
) -> CairnResult<Vec<TransferOutcome>> {
    let mut outcomes = Vec::with_capacity(directories.len());

    for path in directories {
        let source = store.entry_path(path);
        let dest = path.under(workspace);

        if !exists(&source)? {
            debug!("{} not in cache at {}", path, source.display());
            outcomes.push(TransferOutcome::Skipped {
                path: path.clone(),
                reason: SkipReason::NotCached,
            });
            continue;
        }

        // Checked per path: an earlier restore may have placed a symlink
        check_path(path, workspace, store)?;
        replace_tree(&source, &dest)
            .map_err(|e| CairnError::io(format!("restoring {} from cache", path), e))?;
        info!("Restored {}", path);
        outcomes.push(TransferOutcome::Copied { path: path.clone() });
    }

    Ok(outcomes)
}

/// Copy workspace trees into the store, replacing prior entries
///
/// Directories absent from the workspace are skipped.
pub fn save(
    directories: &CacheDirectories,
    workspace: &Path,
    store: &CacheStore,
) -> CairnResult<Vec<TransferOutcome>> {
    let mut outcomes = Vec::with_capacity(directories.len());

    for path in directories {
        let source = path.under(workspace);
        let dest = store.entry_path(path);

        if !exists(&source)? {
            debug!("{} not present at {}", path, source.display());
            outcomes.push(TransferOutcome::Skipped {
                path: path.clone(),
                reason: SkipReason::NothingToCache,
            });
            continue;
        }

        check_path(path, workspace, store)?;
        replace_tree(&source, &dest)
            .map_err(|e| CairnError::io(format!("saving {} to cache", path), e))?;
        info!("Cached {}", path);
        outcomes.push(TransferOutcome::Copied { path: path.clone() });
    }

    Ok(outcomes)
}

/// Reject misconfigured selections before anything is cleared or copied
///
/// Every path must stay inside the workspace once symlinks are resolved and
/// must not contain the store.
pub fn check_selection(
    directories: &CacheDirectories,
    workspace: &Path,
    store: &CacheStore,
) -> CairnResult<()> {
    for path in directories {
        check_path(path, workspace, store)?;
    }
    Ok(())
}

fn check_path(path: &CachePath, workspace: &Path, store: &CacheStore) -> CairnResult<()> {
    let resolved = confine(path, workspace)?;
    ensure_disjoint(&resolved, store.root())
}

/// Resolve `path` under the workspace, refusing a route out of it through a
/// symlinked parent directory
///
/// The last component may be a symlink: it is copied or replaced as a link
/// and never followed.
fn confine(path: &CachePath, workspace: &Path) -> CairnResult<PathBuf> {
    let target = path.under(workspace);
    let root = match fs::canonicalize(workspace) {
        Ok(root) => root,
        // Nothing under a missing workspace can point elsewhere
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(target),
        Err(e) => {
            return Err(CairnError::io(
                format!("resolving {}", workspace.display()),
                e,
            ))
        }
    };

    let components: Vec<_> = path.relative().components().collect();
    let mut current = workspace.to_path_buf();
    for component in &components[..components.len().saturating_sub(1)] {
        current.push(component);
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(CairnError::cache_dir(
                    path.as_str(),
                    format!("{} is a symlink", current.display()),
                ));
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => break,
            Err(e) => {
                return Err(CairnError::io(
                    format!("inspecting {}", current.display()),
                    e,
                ))
            }
        }
    }

    let mut ancestor = target.parent();
    while let Some(dir) = ancestor {
        match fs::canonicalize(dir) {
            Ok(real) if real.starts_with(&root) => break,
            Ok(real) => {
                return Err(CairnError::cache_dir(
                    path.as_str(),
                    format!("resolves outside the app directory to {}", real.display()),
                ));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => ancestor = dir.parent(),
            Err(e) => {
                return Err(CairnError::io(format!("resolving {}", dir.display()), e));
            }
        }
    }

    Ok(target)
}

/// Replace `dest` with a copy of `source`
///
/// The copy is built in a hidden sibling of `dest` and renamed over it once
/// complete. A failed copy leaves `dest` untouched.
pub fn replace_tree(source: &Path, dest: &Path) -> io::Result<()> {
    let parent = dest.parent().ok_or_else(|| {
        io::Error::new(
            ErrorKind::InvalidInput,
            format!("{} has no parent directory", dest.display()),
        )
    })?;
    fs::create_dir_all(parent)?;

    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "entry".to_string());
    let staging = parent.join(format!(".{}.cairn-{}", name, Uuid::new_v4().simple()));

    if let Err(e) = copy_entry(source, &staging) {
        let _ = remove_path(&staging);
        return Err(e);
    }

    remove_path(dest)?;
    if let Err(e) = fs::rename(&staging, dest) {
        let _ = remove_path(&staging);
        return Err(e);
    }
    Ok(())
}

/// Copy one filesystem entry, recursing into directories
fn copy_entry(source: &Path, dest: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(source)?;
    let file_type = meta.file_type();

    if file_type.is_symlink() {
        copy_symlink(source, dest)
    } else if file_type.is_dir() {
        fs::create_dir(dest)?;
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            copy_entry(&entry.path(), &dest.join(entry.file_name()))?;
        }
        // Applied last so read-only directories can still be filled
        fs::set_permissions(dest, meta.permissions())
    } else if file_type.is_file() {
        fs::copy(source, dest).map(|_| ())
    } else {
        debug!("Skipping special file {}", source.display());
        Ok(())
    }
}

#[cfg(unix)]
fn copy_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    let target = fs::read_link(source)?;
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    let target = fs::read_link(source)?;
    let resolved = source
        .parent()
        .map(|p| p.join(&target))
        .unwrap_or_else(|| target.clone());
    if resolved.is_dir() {
        std::os::windows::fs::symlink_dir(target, dest)
    } else {
        std::os::windows::fs::symlink_file(target, dest)
    }
}

/// Remove a file, symlink or directory tree. Missing paths are fine.
pub(crate) fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => {
            make_writable(path)?;
            fs::remove_dir_all(path)
        }
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Grant the owner full access to every directory in a tree. Copied trees
/// keep read-only directory modes, which would otherwise block removal.
#[cfg(unix)]
fn make_writable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let meta = fs::symlink_metadata(path)?;
    if !meta.is_dir() {
        return Ok(());
    }
    let mode = meta.permissions().mode();
    if mode & 0o700 != 0o700 {
        fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o700))?;
    }
    for entry in fs::read_dir(path)? {
        make_writable(&entry?.path())?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn make_writable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Whether anything (including a dangling symlink) exists at `path`
fn exists(path: &Path) -> CairnResult<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CairnError::io(format!("inspecting {}", path.display()), e)),
    }
}

/// Reject a workspace path that contains the store: replacing or copying it
/// would destroy or recurse into the store itself
fn ensure_disjoint(workspace_path: &Path, store_root: &Path) -> CairnResult<()> {
    let (Ok(workspace_path), Ok(store_root)) =
        (fs::canonicalize(workspace_path), fs::canonicalize(store_root))
    else {
        return Ok(());
    };

    if store_root.starts_with(&workspace_path) {
        return Err(CairnError::cache_dir(
            workspace_path.display().to_string(),
            format!("contains the cache store {}", store_root.display()),
        ));
    }
    Ok(())
}

/// Fingerprint and size of a directory tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeSummary {
    /// SHA-256 over relative paths, entry kinds, permission modes, file
    /// contents and symlink targets
    pub digest: String,
    /// Number of regular files
    pub files: u64,
    /// Total size of regular files in bytes
    pub bytes: u64,
}

/// Walk a tree once, fingerprinting and measuring it
pub fn summarize_tree(path: &Path) -> CairnResult<TreeSummary> {
    let mut walk = DigestWalk {
        hasher: Sha256::new(),
        files: 0,
        bytes: 0,
    };
    walk.entry(path, PathBuf::new())
        .map_err(|e| CairnError::io(format!("fingerprinting {}", path.display()), e))?;

    Ok(TreeSummary {
        digest: hex::encode(walk.hasher.finalize()),
        files: walk.files,
        bytes: walk.bytes,
    })
}

/// SHA-256 fingerprint of a tree. Two trees with equal digests are
/// byte-identical, permission bits included.
pub fn tree_digest(path: &Path) -> CairnResult<String> {
    Ok(summarize_tree(path)?.digest)
}

struct DigestWalk {
    hasher: Sha256,
    files: u64,
    bytes: u64,
}

impl DigestWalk {
    fn entry(&mut self, path: &Path, relative: PathBuf) -> io::Result<()> {
        let meta = fs::symlink_metadata(path)?;
        let file_type = meta.file_type();

        self.hasher.update(relative.to_string_lossy().as_bytes());
        self.hasher.update([0u8]);
        self.hasher.update(mode_bits(&meta).to_le_bytes());

        if file_type.is_symlink() {
            self.hasher.update(b"l");
            self.hasher
                .update(fs::read_link(path)?.to_string_lossy().as_bytes());
        } else if file_type.is_dir() {
            self.hasher.update(b"d");
            let mut names: Vec<_> = fs::read_dir(path)?
                .map(|entry| entry.map(|e| e.file_name()))
                .collect::<io::Result<_>>()?;
            names.sort();
            for name in names {
                self.entry(&path.join(&name), relative.join(&name))?;
            }
        } else if file_type.is_file() {
            self.hasher.update(b"f");
            let contents = fs::read(path)?;
            self.hasher.update((contents.len() as u64).to_le_bytes());
            self.hasher.update(&contents);
            self.files += 1;
            self.bytes += contents.len() as u64;
        }
        self.hasher.update([0u8]);
        Ok(())
    }
}

#[cfg(unix)]
fn mode_bits(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_bits(meta: &fs::Metadata) -> u32 {
    u32::from(meta.permissions().readonly())
}
