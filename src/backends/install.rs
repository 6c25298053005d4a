//! Locate or install the boringcache CLI
//!
//! The CLI is probed with `--version`. When it is missing, or does not match a
//! pinned version, the upstream install script is downloaded and run, and the
//! install directory is added to the job PATH.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::core::model::ActionError;
use crate::core::report::Reporter;
use crate::core::util::{command_exists, first_line};

pub const DEFAULT_INSTALL_URL: &str = "https://install.boringcache.com/install.sh";

#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub program: PathBuf,
    /// Version pin (`1.2.3` or `v1.2.3`)
    pub version: Option<String>,
    pub install_url: String,
    pub install_dir: PathBuf,
    pub skip_install: bool,
}

/// Default install location under the home directory
pub fn default_install_dir(home: Option<&Path>, cwd: &Path) -> PathBuf {
    home.unwrap_or(cwd).join(".boringcache").join("bin")
}

fn executable_name() -> &'static str {
    if cfg!(windows) {
        "boringcache.exe"
    } else {
        "boringcache"
    }
}

/// `program --version`, silenced. `None` when it cannot run or exits non-zero.
pub fn probe_version(program: &Path) -> Option<String> {
    let output = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(first_line(&output.stdout).unwrap_or_default())
}

pub fn version_matches(found: &str, pin: Option<&str>) -> bool {
    match pin.map(|p| p.trim().trim_start_matches('v')) {
        None | Some("") | Some("latest") => true,
        Some(pin) => found.contains(pin),
    }
}

fn install_command(url: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("powershell");
        cmd.args(["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command"])
            .arg(format!("irm {} | iex", url));
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(format!("curl -fsSL '{}' | sh", url));
        cmd
    }
}

fn run_installer(opts: &InstallOptions) -> Result<(), ActionError> {
    if !cfg!(windows) && !command_exists("curl") {
        return Err(ActionError::InstallFailed(
            "curl is required to download the installer".to_string(),
        ));
    }

    info!(url = %opts.install_url, dir = ?opts.install_dir, "installing boringcache CLI");
    let mut cmd = install_command(&opts.install_url);
    cmd.env("BORINGCACHE_INSTALL_DIR", &opts.install_dir);
    if let Some(version) = opts.version.as_deref().filter(|v| !v.trim().is_empty()) {
        cmd.env("BORINGCACHE_VERSION", version.trim());
    }

    let status = cmd
        .status()
        .map_err(|e| ActionError::InstallFailed(e.to_string()))?;
    if !status.success() {
        return Err(ActionError::InstallFailed(format!(
            "installer exited with {}",
            status
        )));
    }
    Ok(())
}

/// Return a program path that answers `--version`, installing it when needed.
pub fn ensure_boringcache(opts: &InstallOptions, reporter: &Reporter) -> Result<PathBuf> {
    let pin = opts.version.as_deref();

    if let Some(found) = probe_version(&opts.program) {
        if version_matches(&found, pin) {
            debug!(version = %found, "boringcache CLI available");
            return Ok(opts.program.clone());
        }
        info!(found = %found, wanted = ?pin, "boringcache CLI version mismatch");
    }

    if opts.skip_install {
        return Err(ActionError::InstallFailed(format!(
            "{:?} is not available and installation is disabled",
            opts.program
        ))
        .into());
    }

    run_installer(opts)?;

    let installed = opts.install_dir.join(executable_name());
    let found = probe_version(&installed).ok_or_else(|| {
        ActionError::InstallFailed(format!("{:?} does not run after install", installed))
    })?;
    reporter.add_path(&opts.install_dir)?;
    reporter.info(&format!("Installed boringcache CLI: {}", found));
    Ok(installed)
}

/// Report whether the CLI is usable
pub fn run_doctor(opts: &InstallOptions) -> Result<()> {
    match probe_version(&opts.program) {
        Some(found) => {
            let status = if version_matches(&found, opts.version.as_deref()) {
                "✓"
            } else {
                "✗ (version mismatch)"
            };
            println!("{} boringcache - found: {}", status, found);
        }
        None => {
            println!(
                "✗ boringcache - not found\n  Note: will be installed from {}",
                opts.install_url
            );
        }
    }
    println!("  curl: {}", if command_exists("curl") { "found" } else { "not found" });
    Ok(())
}
