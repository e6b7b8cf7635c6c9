//! Integration tests for vres

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const DESCRIPTOR: &str = r#"
[component]
group = "com.example"
module = "lib"
version = "1.0"

[configurations.default]
artifacts = [{ name = "lib", extension = "jar" }]

[configurations.testFixtures]
capabilities = ["com.example:lib-test-fixtures:1.0"]

[[variants]]
name = "runtimeElements"
attributes = { "org.gradle.usage" = "java-runtime" }
artifacts = [
    { name = "lib", extension = "jar" },
    { name = "lib", extension = "jar", classifier = "sources" },
]

[[variants]]
name = "testFixturesRuntimeElements"
capabilities = ["com.example:lib-test-fixtures:1.0"]
artifacts = [{ name = "lib", extension = "jar", classifier = "test-fixtures" }]
"#;

    fn vres() -> Command {
        let mut cmd = cargo_bin_cmd!("vres");
        cmd.env_remove("VRES_CONFIG");
        cmd
    }

    /// Descriptor plus a repository holding the files it names
    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            std::fs::write(dir.path().join("lib.toml"), DESCRIPTOR).unwrap();
            let module_dir = dir.path().join("repo/com/example/lib/1.0");
            std::fs::create_dir_all(&module_dir).unwrap();
            for file in ["lib-1.0.jar", "lib-1.0-sources.jar", "lib-1.0-test-fixtures.jar"] {
                std::fs::write(module_dir.join(file), b"abc").unwrap();
            }
            Self { dir }
        }

        fn descriptor(&self) -> PathBuf {
            self.dir.path().join("lib.toml")
        }

        fn repository(&self) -> PathBuf {
            self.dir.path().join("repo")
        }

        fn config(&self) -> PathBuf {
            self.dir.path().join("config.toml")
        }
    }

    fn s(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    #[test]
    fn help_displays() {
        vres()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("variant selection"));
    }

    #[test]
    fn version_displays() {
        vres()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("vres"));
    }

    #[test]
    fn select_uses_graph_variants() {
        let ws = Workspace::new();
        vres()
            .args(["select", s(&ws.descriptor()), "default", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::eq("runtimeElements\n"));
    }

    #[test]
    fn select_matches_capabilities_exactly() {
        let ws = Workspace::new();
        vres()
            .args(["select", s(&ws.descriptor()), "testFixtures", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::eq("testFixturesRuntimeElements\n"));
    }

    #[test]
    fn resolve_lists_files() {
        let ws = Workspace::new();
        vres()
            .args(["resolve", s(&ws.descriptor()), "default"])
            .args(["--repository", s(&ws.repository()), "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("lib-1.0.jar"))
            .stdout(predicate::str::contains("lib-1.0-sources.jar"));
    }

    #[test]
    fn resolve_honors_excludes() {
        let ws = Workspace::new();
        vres()
            .args(["resolve", s(&ws.descriptor()), "default"])
            .args(["--repository", s(&ws.repository()), "--format", "plain"])
            .args(["--exclude", "com.example:lib:lib:jar:sources"])
            .assert()
            .success()
            .stdout(predicate::str::contains("lib-1.0.jar"))
            .stdout(predicate::str::contains("sources").not());
    }

    #[test]
    fn resolve_json_includes_attributes_and_checksums() {
        let ws = Workspace::new();
        vres()
            .args(["resolve", s(&ws.descriptor()), "default"])
            .args(["--repository", s(&ws.repository()), "--format", "json"])
            .args(["--checksums", "--attribute", "org.gradle.docstype=sources"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"artifactType\": \"jar\""))
            .stdout(predicate::str::contains("\"org.gradle.docstype\": \"sources\""))
            .stdout(predicate::str::contains(
                "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
            ));
    }

    #[test]
    fn resolve_reports_missing_artifact() {
        let ws = Workspace::new();
        std::fs::remove_file(ws.repository().join("com/example/lib/1.0/lib-1.0-sources.jar"))
            .unwrap();
        vres()
            .args(["resolve", s(&ws.descriptor()), "default"])
            .args(["--repository", s(&ws.repository()), "--format", "plain"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("lib-1.0.jar"))
            .stderr(predicate::str::contains("Artifact not found"));
    }

    #[test]
    fn unknown_configuration_fails() {
        let ws = Workspace::new();
        vres()
            .args(["resolve", s(&ws.descriptor()), "compile"])
            .args(["--repository", s(&ws.repository())])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration 'compile' not found"));
    }

    #[test]
    fn invalid_exclude_rejected() {
        let ws = Workspace::new();
        vres()
            .args(["resolve", s(&ws.descriptor()), "default", "--exclude", "a::b"])
            .assert()
            .failure();
    }

    #[test]
    fn missing_explicit_config_fails() {
        let ws = Workspace::new();
        vres()
            .args(["--config", s(&ws.config()), "select", s(&ws.descriptor()), "default"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration file not found"));
    }

    #[test]
    fn config_path() {
        vres()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_init_set_show() {
        let ws = Workspace::new();
        let config = ws.config();

        vres()
            .args(["--config", s(&config), "config", "init"])
            .assert()
            .success();
        vres()
            .args(["--config", s(&config), "config", "set", "resolution.checksums", "true"])
            .assert()
            .success();
        vres()
            .args(["--config", s(&config), "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("checksums = true"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let ws = Workspace::new();
        vres()
            .args(["--config", s(&ws.config()), "config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }
}
