#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::{tempdir, TempDir};

const FAKE_CLI: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "boringcache 9.9.9"
  exit 0
fi
for arg in "$@"; do
  printf '%s\n' "$arg" >> "$FAKE_LOG"
done
printf 'token=%s\n---\n' "$BORINGCACHE_API_TOKEN" >> "$FAKE_LOG"
exit "${FAKE_EXIT:-0}"
"#;

/// Written once, before any test spawns a process.
fn fake_cli() -> &'static Path {
    static FAKE: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
    let (_, path) = FAKE.get_or_init(|| {
        let dir = tempdir().unwrap();
        let path = dir.path().join("boringcache");
        fs::write(&path, FAKE_CLI).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        (dir, path)
    });
    path
}

/// `-{os}-{arch}` as cache keys name the host platform
fn platform_suffix() -> String {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "windows",
        _ => "linux",
    };
    let arch = match std::env::consts::ARCH {
        "aarch64" => "arm64",
        _ => "amd64",
    };
    format!("-{}-{}", os, arch)
}

struct Job {
    _temp: TempDir,
    root: PathBuf,
}

/// One recorded CLI call
#[derive(Debug)]
struct Call {
    args: Vec<String>,
    token: String,
}

impl Job {
    fn new() -> Self {
        let temp = tempdir().unwrap();
        let root = temp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("work")).unwrap();
        fs::create_dir_all(root.join("home")).unwrap();
        Self { _temp: temp, root }
    }

    fn work(&self) -> PathBuf {
        self.root.join("work")
    }

    fn home(&self) -> PathBuf {
        self.root.join("home")
    }

    fn log(&self) -> PathBuf {
        self.root.join("calls.log")
    }

    fn output_file(&self) -> PathBuf {
        self.root.join("github_output")
    }

    fn mkdir(&self, relative: &str) {
        fs::create_dir_all(self.work().join(relative)).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("boringcache-action"));
        cmd.env_clear()
            .env("PATH", std::env::var_os("PATH").unwrap_or_default())
            .env("HOME", self.home())
            .env("GITHUB_ACTIONS", "true")
            .env("GITHUB_OUTPUT", self.output_file())
            .env("BORINGCACHE_BIN", fake_cli())
            .env("BORINGCACHE_SKIP_INSTALL", "true")
            .env("FAKE_LOG", self.log())
            .current_dir(self.work());
        cmd
    }

    fn calls(&self) -> Vec<Call> {
        let Ok(content) = fs::read_to_string(self.log()) else {
            return Vec::new();
        };
        content
            .split("---\n")
            .filter(|block| !block.trim().is_empty())
            .map(|block| {
                let mut lines: Vec<String> = block.lines().map(str::to_string).collect();
                let token = lines
                    .pop()
                    .and_then(|l| l.strip_prefix("token=").map(str::to_string))
                    .unwrap_or_default();
                Call { args: lines, token }
            })
            .collect()
    }
}

#[test]
fn save_passes_entries_through() {
    let job = Job::new();
    job.mkdir("node_modules");
    job.mkdir("dist");

    job.cmd()
        .env("INPUT_WORKSPACE", "my-org/my-project")
        .env("INPUT_ENTRIES", "node_modules:deps,dist:build")
        .arg("save")
        .assert()
        .success();

    let calls = job.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].args,
        vec!["save", "my-org/my-project", "node_modules:deps,dist:build"]
    );
}

#[test]
fn save_defaults_workspace_to_repository() {
    let job = Job::new();
    job.mkdir("node_modules");

    job.cmd()
        .env("GITHUB_REPOSITORY", "owner/repo")
        .env("INPUT_ENTRIES", "node_modules:deps")
        .arg("save")
        .assert()
        .success();

    assert_eq!(
        job.calls()[0].args,
        vec!["save", "owner/repo", "node_modules:deps"]
    );
}

#[test]
fn save_converts_path_and_key() {
    let job = Job::new();
    fs::create_dir_all(job.home().join(".npm")).unwrap();

    job.cmd()
        .env("GITHUB_REPOSITORY", "owner/repo")
        .env("INPUT_PATH", "~/.npm")
        .env("INPUT_KEY", "deps-hash123")
        .arg("save")
        .assert()
        .success();

    let npm = job.home().join(".npm");
    assert_eq!(
        job.calls()[0].args,
        vec![
            "save".to_string(),
            "owner/repo".to_string(),
            format!("{}:deps-hash123{}", npm.to_string_lossy(), platform_suffix()),
        ]
    );
}

#[test]
fn save_path_and_key_without_platform() {
    let job = Job::new();
    fs::create_dir_all(job.home().join(".npm")).unwrap();

    job.cmd()
        .env("INPUT_WORKSPACE", "org/project")
        .env("INPUT_PATH", "~/.npm")
        .env("INPUT_KEY", "deps-hash123")
        .env("INPUT_NO-PLATFORM", "true")
        .arg("save")
        .assert()
        .success()
        .stdout(predicate::str::contains("::warning::Both").not());

    let npm = job.home().join(".npm");
    assert_eq!(
        job.calls()[0].args,
        vec![
            "save".to_string(),
            "org/project".to_string(),
            format!("{}:deps-hash123", npm.to_string_lossy()),
            "--no-platform".to_string(),
        ]
    );
}

#[test]
fn save_trims_positional_fields() {
    let job = Job::new();
    job.mkdir("node_modules");

    job.cmd()
        .env("INPUT_WORKSPACE", "my-org/my-project")
        .env("INPUT_ENTRIES", "node_modules : deps")
        .arg("save")
        .assert()
        .success();

    assert_eq!(
        job.calls()[0].args,
        vec!["save", "my-org/my-project", "node_modules:deps"]
    );
}

#[test]
fn save_always_adds_force() {
    let job = Job::new();
    job.mkdir("node_modules");

    job.cmd()
        .env("INPUT_WORKSPACE", "my-org/my-project")
        .env("INPUT_ENTRIES", "node_modules:deps")
        .env("INPUT_SAVE-ALWAYS", "true")
        .arg("save")
        .assert()
        .success();

    assert_eq!(
        job.calls()[0].args,
        vec!["save", "--force", "my-org/my-project", "node_modules:deps"]
    );
}

#[test]
fn save_forwards_token_and_trailing_flags() {
    let job = Job::new();
    job.mkdir("target");

    job.cmd()
        .env("BORINGCACHE_API_TOKEN", "secret-token")
        .arg("--workspace")
        .arg("org/project")
        .arg("--entries")
        .arg("target:rust")
        .arg("--no-platform")
        .arg("--exclude")
        .arg("*.log")
        .arg("save")
        .assert()
        .success();

    let calls = job.calls();
    assert_eq!(
        calls[0].args,
        vec!["save", "org/project", "target:rust", "--no-platform", "--exclude", "*.log"]
    );
    assert_eq!(calls[0].token, "secret-token");
}

#[test]
fn missing_inputs_fail() {
    let job = Job::new();

    job.cmd().arg("save").assert().failure().stdout(predicate::str::contains(
        "::error::Cache save failed: Either (workspace + entries) or (path + key) inputs are required",
    ));

    assert!(job.calls().is_empty());
}

#[test]
fn workspace_without_separator_fails() {
    let job = Job::new();

    job.cmd()
        .env("INPUT_WORKSPACE", "myproject")
        .env("INPUT_ENTRIES", "node_modules:deps")
        .arg("save")
        .assert()
        .failure()
        .stdout(predicate::str::contains("namespace/workspace"));
}

#[test]
fn malformed_entry_fails() {
    let job = Job::new();

    job.cmd()
        .env("INPUT_WORKSPACE", "org/project")
        .env("INPUT_ENTRIES", "node_modules")
        .arg("save")
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Invalid entry format: node_modules. Expected format: path:tag",
        ));
}

#[test]
fn save_failure_is_only_a_warning() {
    let job = Job::new();
    job.mkdir("node_modules");

    job.cmd()
        .env("INPUT_WORKSPACE", "my-org/my-project")
        .env("INPUT_ENTRIES", "node_modules:deps")
        .env("FAKE_EXIT", "1")
        .arg("save")
        .assert()
        .success()
        .stdout(predicate::str::contains("::warning::Failed to save cache entries"));

    assert_eq!(job.calls().len(), 1);
}

#[test]
fn save_skips_cli_when_no_paths_exist() {
    let job = Job::new();

    job.cmd()
        .env("INPUT_WORKSPACE", "my-org/my-project")
        .env("INPUT_ENTRIES", "node_modules:deps,dist:build")
        .arg("save")
        .assert()
        .success()
        .stdout(predicate::str::contains("::warning::Some cache paths do not exist"))
        .stdout(predicate::str::contains(
            "::warning::No valid cache paths found, skipping save",
        ));

    assert!(job.calls().is_empty());
}

#[test]
fn save_drops_missing_entries() {
    let job = Job::new();
    job.mkdir("dist");

    job.cmd()
        .env("INPUT_WORKSPACE", "my-org/my-project")
        .env("INPUT_ENTRIES", "node_modules:deps,dist:build")
        .arg("save")
        .assert()
        .success();

    assert_eq!(
        job.calls()[0].args,
        vec!["save", "my-org/my-project", "dist:build"]
    );
}

#[test]
fn restore_sets_cache_hit() {
    let job = Job::new();

    job.cmd()
        .env("INPUT_WORKSPACE", "my-org/my-project")
        .env("INPUT_ENTRIES", "deps:node_modules")
        .arg("restore")
        .assert()
        .success();

    assert_eq!(
        job.calls()[0].args,
        vec!["restore", "my-org/my-project", "deps:node_modules"]
    );
    let output = fs::read_to_string(job.output_file()).unwrap();
    assert!(output.contains("cache-hit=true"));
}

#[test]
fn restore_miss_is_not_fatal() {
    let job = Job::new();

    job.cmd()
        .env("INPUT_WORKSPACE", "my-org/my-project")
        .env("INPUT_ENTRIES", "deps:node_modules")
        .env("FAKE_EXIT", "3")
        .arg("restore")
        .assert()
        .success();

    let output = fs::read_to_string(job.output_file()).unwrap();
    assert!(output.contains("cache-hit=false"));
}

#[test]
fn restore_tagged_redirect_uses_restore_path() {
    let job = Job::new();

    job.cmd()
        .env("INPUT_WORKSPACE", "org/project")
        .env("INPUT_ENTRIES", "deps:cache/in=>cache/out")
        .env("INPUT_ENTRY-SYNTAX", "tagged")
        .arg("restore")
        .assert()
        .success();

    let expected = format!("deps:{}", job.work().join("cache/in").to_string_lossy());
    assert_eq!(job.calls()[0].args[2], expected);
}

#[test]
fn plan_prints_resolved_invocation() {
    let job = Job::new();

    let assert = job
        .cmd()
        .arg("--workspace")
        .arg("org/project")
        .arg("--entries")
        .arg("deps:node_modules=>dist")
        .arg("--syntax")
        .arg("tagged")
        .arg("plan")
        .arg("save")
        .assert()
        .success();

    let plan: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(plan["workspace"], "org/project");
    assert_eq!(plan["syntax"], "tagged");
    assert_eq!(plan["entries"][0]["tag"], "deps");
    assert_eq!(plan["args"][0], "save");
    assert_eq!(
        plan["args"][2],
        format!("deps:{}", job.work().join("dist").to_string_lossy())
    );
    assert!(job.calls().is_empty());
}

#[test]
fn plan_includes_platform_key() {
    let job = Job::new();

    let assert = job
        .cmd()
        .env("INPUT_PATH", "~/.cargo/registry\n\ntarget\n")
        .env("INPUT_KEY", "cargo-abc")
        .env("INPUT_ENABLECROSSOSARCHIVE", "true")
        .arg("plan")
        .arg("restore")
        .assert()
        .success();

    let plan: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(plan["workspace"], "default/default");
    assert_eq!(plan["cache"]["full_key"], "cargo-abc");
    assert_eq!(plan["entries"].as_array().unwrap().len(), 2);
    assert_eq!(plan["args"][3], "--no-platform");
}

#[test]
fn plan_keeps_annotations_off_stdout() {
    let job = Job::new();

    let assert = job
        .cmd()
        .env("INPUT_ENTRIES", "node_modules:deps")
        .env("INPUT_PATH", "~/.npm")
        .env("INPUT_KEY", "deps")
        .arg("plan")
        .arg("save")
        .assert()
        .success()
        .stderr(predicate::str::contains("::warning::Both CLI format"));

    let plan: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(plan["args"][2], "node_modules:deps");
    assert!(plan.get("cache").is_none());
}
