//! Integration tests for cairn

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// A build workspace, a cache store and an isolated config file
    struct Build {
        _root: TempDir,
        workspace: PathBuf,
        store: PathBuf,
        config: PathBuf,
    }

    impl Build {
        fn new() -> Self {
            let root = TempDir::new().unwrap();
            let workspace = root.path().join("app");
            let store = root.path().join("cache");
            fs::create_dir_all(&workspace).unwrap();
            let config = root.path().join("config.toml");
            Self {
                workspace,
                store,
                config,
                _root: root,
            }
        }

        fn cairn(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("cairn");
            cmd.env("CAIRN_CONFIG", &self.config)
                .env("CAIRN_WORKSPACE", &self.workspace)
                .env("CAIRN_STORE", &self.store)
                .env_remove("CAIRN_SIGNATURE")
                .env_remove("CAIRN_INVALIDATE");
            cmd
        }

        fn manifest(&self, json: &str) {
            fs::write(self.workspace.join("package.json"), json).unwrap();
        }

        fn install(&self, dir: &str, file: &str, contents: &str) {
            let path = self.workspace.join(dir).join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }

        fn entry(&self, name: &str) -> PathBuf {
            self.store.join("node").join(name)
        }

        fn wipe_workspace_dir(&self, dir: &str) {
            fs::remove_dir_all(self.workspace.join(dir)).unwrap();
        }
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("cairn")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build artifact cache"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("cairn")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("cairn"));
    }

    #[test]
    fn cold_build_skips_restore_then_saves() {
        let build = Build::new();
        build.install("node_modules/left-pad", "index.js", "module.exports = pad;\n");

        build
            .cairn()
            .args(["before-build", "--signature", "v1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Skipping cache restore (no-cache)"));
        assert!(!build.store.join("signature").exists());

        build
            .cairn()
            .args(["after-build", "--signature", "v1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("- node_modules"));

        assert_eq!(read(&build.store.join("signature")), "v1\n");
        assert_eq!(read(&build.store.join("format")), "1\n");
        assert_eq!(
            read(&build.entry("node_modules/left-pad/index.js")),
            "module.exports = pad;\n"
        );
    }

    #[test]
    fn valid_cache_restores_saved_content() {
        let build = Build::new();
        build.install("node_modules/left-pad", "index.js", "module.exports = pad;\n");
        build
            .cairn()
            .args(["after-build", "--signature", "v1"])
            .assert()
            .success();

        build.wipe_workspace_dir("node_modules");

        build
            .cairn()
            .args(["before-build", "--signature", "v1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Loading cached directories"))
            .stdout(predicate::str::contains("- node_modules"));

        assert_eq!(
            read(&build.workspace.join("node_modules/left-pad/index.js")),
            "module.exports = pad;\n"
        );
    }

    #[test]
    fn new_signature_skips_restore_and_keeps_cache_until_after_build() {
        let build = Build::new();
        build.install("node_modules/a", "index.js", "old\n");
        build
            .cairn()
            .args(["after-build", "--signature", "v1"])
            .assert()
            .success();
        build.wipe_workspace_dir("node_modules");

        build
            .cairn()
            .args(["before-build", "--signature", "v2"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Skipping cache restore (new-version)"));

        assert!(!build.workspace.join("node_modules").exists());
        assert_eq!(read(&build.store.join("signature")), "v1\n");
        assert!(build.entry("node_modules/a/index.js").exists());

        build.install("node_modules/b", "index.js", "new\n");
        build
            .cairn()
            .args(["after-build", "--signature", "v2"])
            .assert()
            .success();

        assert_eq!(read(&build.store.join("signature")), "v2\n");
        assert!(!build.entry("node_modules/a").exists());
        assert_eq!(read(&build.entry("node_modules/b/index.js")), "new\n");
    }

    #[test]
    fn narrowed_selection_drops_old_entries() {
        let build = Build::new();
        build.manifest(r#"{"cacheDirectories": ["node_modules", "bower_components"]}"#);
        build.install("node_modules/a", "index.js", "a\n");
        build.install("bower_components/b", "index.js", "b\n");
        build
            .cairn()
            .args(["after-build", "--signature", "v1"])
            .assert()
            .success();
        assert!(build.entry("bower_components").exists());

        build.manifest(r#"{"cacheDirectories": ["node_modules"]}"#);
        build
            .cairn()
            .args(["after-build", "--signature", "v1"])
            .assert()
            .success();

        assert!(build.entry("node_modules").exists());
        assert!(!build.entry("bower_components").exists());
    }

    #[test]
    fn missing_declared_directory_is_reported() {
        let build = Build::new();
        build.manifest(r#"{"cacheDirectories": ["node_modules", "vendor"]}"#);
        build.install("node_modules/a", "index.js", "a\n");

        build
            .cairn()
            .args(["after-build", "--signature", "v1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("- vendor (nothing to cache)"));
    }

    #[test]
    fn invalidate_flag_skips_restore() {
        let build = Build::new();
        build.install("node_modules/a", "index.js", "a\n");
        build
            .cairn()
            .args(["after-build", "--signature", "v1"])
            .assert()
            .success();

        build
            .cairn()
            .args(["before-build", "--signature", "v1", "--invalidate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Skipping cache restore (invalidated)"));
    }

    #[test]
    fn status_json_reports_signature_from_engines() {
        let build = Build::new();
        build.manifest(r#"{"engines": {"node": "18.x", "npm": "9.x"}}"#);

        let output = build
            .cairn()
            .args(["status", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["status"], "no-cache");
        assert_eq!(json["signature"], "node 18.x; npm 9.x");
    }

    #[test]
    fn dirs_lists_declared_or_resolved() {
        let build = Build::new();

        build
            .cairn()
            .arg("dirs")
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        build
            .cairn()
            .args(["dirs", "--resolved"])
            .assert()
            .success()
            .stdout("node_modules\n");

        build.manifest(r#"{"cache_directories": ["vendor/bundle"]}"#);
        build
            .cairn()
            .arg("dirs")
            .assert()
            .success()
            .stdout("vendor/bundle\n");
    }

    #[test]
    fn escaping_cache_directory_fails() {
        let build = Build::new();
        build.manifest(r#"{"cacheDirectories": ["../outside"]}"#);

        build
            .cairn()
            .args(["after-build", "--signature", "v1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid cache directory"));
        assert!(!build.store.join("signature").exists());
    }

    #[test]
    fn clear_is_idempotent() {
        let build = Build::new();
        build.install("node_modules/a", "index.js", "a\n");
        build
            .cairn()
            .args(["after-build", "--signature", "v1"])
            .assert()
            .success();

        for _ in 0..2 {
            build
                .cairn()
                .args(["clear", "--yes"])
                .assert()
                .success()
                .stdout(predicate::str::contains("Cache cleared"));
        }

        assert!(!build.store.join("signature").exists());
        assert!(!build.entry("node_modules").exists());
    }

    #[test]
    fn info_on_empty_store() {
        let build = Build::new();
        build
            .cairn()
            .arg("info")
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached directories"));
    }

    #[test]
    fn config_path() {
        let build = Build::new();
        build
            .cairn()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let build = Build::new();
        build
            .cairn()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"));
    }

    #[test]
    fn disabled_cache_is_invalidated() {
        let build = Build::new();
        build
            .cairn()
            .args(["config", "set", "cache.enabled", "false"])
            .assert()
            .success();

        build
            .cairn()
            .args(["status", "--signature", "v1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("invalidated"));
    }
}
