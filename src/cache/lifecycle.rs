//! Pre-build and post-build cache sequencing
//!
//! The surrounding build calls [`CacheLifecycle::before_build`] before
//! installing dependencies and [`CacheLifecycle::after_build`] once the build
//! has finished. Cache misses are normal results; only I/O failures and
//! misconfiguration come back as errors.

use crate::cache::select::{self, CacheDirectories};
use crate::cache::signature::Signature;
use crate::cache::status::{CacheReport, CacheStatus};
use crate::cache::store::CacheStore;
use crate::cache::transfer::{self, TransferOutcome};
use crate::config::CacheConfig;
use crate::error::{CairnError, CairnResult};
use crate::project::ProjectConfig;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of the pre-build step
#[derive(Debug, Clone)]
pub struct BeforeBuild {
    /// Validity decision for this build
    pub report: CacheReport,
    /// Per-directory restore results (empty unless the cache was valid)
    pub restored: Vec<TransferOutcome>,
}

/// Result of the post-build step
#[derive(Debug, Clone)]
pub struct AfterBuild {
    /// Per-directory save results
    pub saved: Vec<TransferOutcome>,
    /// Signature recorded for the new cache generation
    pub signature: Signature,
}

/// Cache engine bound to one build's workspace, store and configuration
#[derive(Debug, Clone)]
pub struct CacheLifecycle {
    workspace: PathBuf,
    store: CacheStore,
    settings: CacheConfig,
    project: ProjectConfig,
    signature: Signature,
}

impl CacheLifecycle {
    /// Bind the engine to explicit inputs
    pub fn new(
        workspace: &Path,
        store_root: &Path,
        settings: &CacheConfig,
        project: ProjectConfig,
        signature: Signature,
    ) -> CairnResult<Self> {
        if !workspace.is_dir() {
            return Err(CairnError::WorkspaceNotFound(workspace.to_path_buf()));
        }

        Ok(Self {
            workspace: workspace.to_path_buf(),
            store: CacheStore::from_config(store_root, settings)?,
            settings: settings.clone(),
            project,
            signature,
        })
    }

    /// Read the project manifest from the workspace and resolve the signature,
    /// preferring `explicit_signature` when given
    pub fn load(
        workspace: &Path,
        store_root: &Path,
        settings: &CacheConfig,
        explicit_signature: Option<&str>,
    ) -> CairnResult<Self> {
        if !workspace.is_dir() {
            return Err(CairnError::WorkspaceNotFound(workspace.to_path_buf()));
        }
        let project = ProjectConfig::load(workspace)?;
        let signature = Signature::resolve(explicit_signature, &project)?;
        Self::new(workspace, store_root, settings, project, signature)
    }

    /// The store this build uses
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// The build workspace
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Signature of the current build environment
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Project configuration the engine reads from
    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }

    /// Classify the cache for this build
    pub fn status(&self, invalidate: bool) -> CairnResult<CacheReport> {
        self.store.status(&self.signature, &self.settings, invalidate)
    }

    /// Declared cache directories, possibly empty
    pub fn declared_directories(&self) -> Vec<String> {
        select::cache_directories(&self.project)
    }

    /// Directories taking part in caching this build
    pub fn directories(&self) -> CairnResult<CacheDirectories> {
        select::select_directories(&self.project, &self.settings.default_directory)
    }

    /// Restore explicit directories from the store
    pub fn restore(&self, directories: &CacheDirectories) -> CairnResult<Vec<TransferOutcome>> {
        transfer::restore(directories, &self.store, &self.workspace)
    }

    /// Save explicit directories into the store
    pub fn save(&self, directories: &CacheDirectories) -> CairnResult<Vec<TransferOutcome>> {
        transfer::save(directories, &self.workspace, &self.store)
    }

    /// Empty the store
    pub fn clear(&self) -> CairnResult<()> {
        self.store.clear()
    }

    /// Record the current signature as the producer of the store contents
    pub fn save_signature(&self) -> CairnResult<()> {
        self.store
            .save_signature(&self.signature, self.settings.format_version)
    }

    /// Pre-build step: restore the selected directories when the cache is
    /// valid. Never modifies the store.
    pub fn before_build(&self, invalidate: bool) -> CairnResult<BeforeBuild> {
        let report = self.status(invalidate)?;

        if report.status != CacheStatus::Valid {
            info!("Skipping cache restore ({}): {}", report.status, report.reason);
            return Ok(BeforeBuild {
                report,
                restored: vec![],
            });
        }

        let directories = self.directories()?;
        info!("Restoring {} cached director(ies)", directories.len());
        let restored = self.restore(&directories)?;
        Ok(BeforeBuild { report, restored })
    }

    /// Post-build step: clear the store, save the selected directories, then
    /// record the signature. A misconfigured selection fails before the store
    /// is touched.
    pub fn after_build(&self) -> CairnResult<AfterBuild> {
        let directories = self.directories()?;
        transfer::check_selection(&directories, &self.workspace, &self.store)?;

        self.clear()?;
        let saved = self.save(&directories)?;
        self.save_signature()?;

        info!(
            "Cached {} of {} director(ies) under {}",
            saved.iter().filter(|o| o.is_copied()).count(),
            saved.len(),
            self.signature
        );
        Ok(AfterBuild {
            saved,
            signature: self.signature.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Build {
        _dir: TempDir,
        workspace: PathBuf,
        store: PathBuf,
    }

    fn build() -> Build {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path().join("app");
        fs::create_dir_all(&workspace).unwrap();
        let store = dir.path().join("cache");
        Build {
            _dir: dir,
            workspace,
            store,
        }
    }

    fn engine(b: &Build, dirs: &[&str], sig: &str) -> CacheLifecycle {
        CacheLifecycle::new(
            &b.workspace,
            &b.store,
            &CacheConfig::default(),
            ProjectConfig::with_directories(dirs.iter().copied()),
            Signature::new(sig).unwrap(),
        )
        .unwrap()
    }

    fn install(workspace: &Path, dir: &str, file: &str, body: &str) {
        let path = workspace.join(dir);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(file), body).unwrap();
    }

    #[test]
    fn cold_start_then_valid_restore() {
        let b = build();
        let first = engine(&b, &[], "v1");

        let before = first.before_build(false).unwrap();
        assert_eq!(before.report.status, CacheStatus::NoCache);
        assert!(before.restored.is_empty());

        install(&b.workspace, "node_modules", "index.js", "v1 deps");
        let after = first.after_build().unwrap();
        assert_eq!(after.signature.as_str(), "v1");
        assert!(after.saved[0].is_copied());

        fs::remove_dir_all(b.workspace.join("node_modules")).unwrap();
        let second = engine(&b, &[], "v1");
        let before = second.before_build(false).unwrap();
        assert_eq!(before.report.status, CacheStatus::Valid);
        assert_eq!(before.restored.len(), 1);
        assert_eq!(
            fs::read_to_string(b.workspace.join("node_modules/index.js")).unwrap(),
            "v1 deps"
        );
    }

    #[test]
    fn signature_change_skips_restore_but_keeps_cache() {
        let b = build();
        install(&b.workspace, "node_modules", "index.js", "v1 deps");
        engine(&b, &[], "v1").after_build().unwrap();
        fs::remove_dir_all(b.workspace.join("node_modules")).unwrap();

        let second = engine(&b, &[], "v2");
        let before = second.before_build(false).unwrap();
        assert_eq!(before.report.status, CacheStatus::NewVersion);
        assert!(before.restored.is_empty());
        assert!(!b.workspace.join("node_modules").exists());

        // stale cache survives until the next save
        assert!(second.store().is_populated().unwrap());
        assert_eq!(
            second.store().signatures().read_signature().unwrap().unwrap().as_str(),
            "v1"
        );

        install(&b.workspace, "node_modules", "index.js", "v2 deps");
        second.after_build().unwrap();
        let third = engine(&b, &[], "v2");
        assert_eq!(third.status(false).unwrap().status, CacheStatus::Valid);
    }

    #[test]
    fn after_build_drops_directories_no_longer_selected() {
        let b = build();
        install(&b.workspace, "node_modules", "a.js", "a");
        install(&b.workspace, "bower_components", "b.js", "b");
        engine(&b, &["node_modules", "bower_components"], "v1")
            .after_build()
            .unwrap();

        let narrowed = engine(&b, &["bower_components"], "v1");
        narrowed.after_build().unwrap();
        assert_eq!(
            narrowed.store().entry_names().unwrap(),
            vec!["bower_components".to_string()]
        );
    }

    #[test]
    fn forced_invalidation_skips_restore() {
        let b = build();
        install(&b.workspace, "node_modules", "index.js", "deps");
        let engine = engine(&b, &[], "v1");
        engine.after_build().unwrap();

        let before = engine.before_build(true).unwrap();
        assert_eq!(before.report.status, CacheStatus::Invalidated);
        assert!(before.restored.is_empty());
    }

    #[test]
    fn after_build_with_nothing_to_cache_still_signs() {
        let b = build();
        let engine = engine(&b, &[], "v1");
        let after = engine.after_build().unwrap();
        assert!(!after.saved[0].is_copied());
        assert!(!engine.store().is_populated().unwrap());
        assert_eq!(engine.status(false).unwrap().status, CacheStatus::NoCache);
    }

    #[test]
    fn misconfigured_directory_fails_after_build() {
        let b = build();
        let engine = engine(&b, &["../escape"], "v1");
        let err = engine.after_build().unwrap_err();
        assert!(err.is_misconfiguration());
    }

    #[test]
    fn selection_containing_store_keeps_prior_cache() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path().to_path_buf();
        let store = workspace.join("tmp/cache");
        install(&workspace, "node_modules", "index.js", "deps");
        let bind = |dirs: &[&str]| {
            CacheLifecycle::new(
                &workspace,
                &store,
                &CacheConfig::default(),
                ProjectConfig::with_directories(dirs.iter().copied()),
                Signature::new("v1").unwrap(),
            )
            .unwrap()
        };
        bind(&["node_modules"]).after_build().unwrap();

        let widened = bind(&["node_modules", "tmp"]);
        let err = widened.after_build().unwrap_err();
        assert!(err.is_misconfiguration());
        assert_eq!(widened.status(false).unwrap().status, CacheStatus::Valid);
        assert_eq!(widened.store().entry_names().unwrap(), vec!["node_modules".to_string()]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn copy_failure_reaches_after_build_caller() {
        let b = build();
        // Deepest path just under PATH_MAX: the store copy cannot be created
        let segment = "d".repeat(100);
        let mut deep = b.workspace.join("node_modules");
        while deep.as_os_str().len() + segment.len() + 1 < 3990 {
            deep.push(&segment);
        }
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("f".repeat(4080 - deep.as_os_str().len() - 1)), "x").unwrap();

        let err = engine(&b, &[], "v1").after_build().unwrap_err();
        assert!(matches!(err, CairnError::Io { .. }));
        assert!(engine(&b, &[], "v1")
            .store()
            .signatures()
            .read_signature()
            .unwrap()
            .is_none());
    }

    #[test]
    fn missing_workspace_is_an_error() {
        let b = build();
        let err = CacheLifecycle::load(
            &b.workspace.join("missing"),
            &b.store,
            &CacheConfig::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CairnError::WorkspaceNotFound(_)));
    }

    #[test]
    fn load_reads_manifest() {
        let b = build();
        fs::write(
            b.workspace.join("package.json"),
            r#"{"cacheDirectories":["vendor"],"engines":{"node":"20.x"}}"#,
        )
        .unwrap();

        let engine =
            CacheLifecycle::load(&b.workspace, &b.store, &CacheConfig::default(), None).unwrap();
        assert_eq!(engine.declared_directories(), vec!["vendor".to_string()]);
        assert_eq!(engine.signature().as_str(), "node 20.x; npm unspecified");
    }
}
