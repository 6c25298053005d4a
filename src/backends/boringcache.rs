//! boringcache CLI integration
//!
//! Builds the argument vector for `boringcache save|restore` and runs it.
//! The CLI is opaque: only its exit code is observed.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

use crate::core::inputs::Prepared;
use crate::core::model::Action;

pub const DEFAULT_PROGRAM: &str = "boringcache";
pub const TOKEN_ENV: &str = "BORINGCACHE_API_TOKEN";

/// Optional flags forwarded to the CLI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliFlags {
    /// Overwrite an existing entry (save only)
    pub force: bool,
    pub no_platform: bool,
    pub verbose: bool,
    pub exclude: Option<String>,
}

/// A fully described process launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

/// `<action> [--force] <workspace> <entries> [--no-platform] [--verbose] [--exclude <pattern>]`
pub fn build_args(action: Action, workspace: &str, entries: &str, flags: &CliFlags) -> Vec<String> {
    let mut args = vec![action.to_string()];
    if flags.force && action == Action::Save {
        args.push("--force".to_string());
    }
    args.push(workspace.to_string());
    args.push(entries.to_string());

    if flags.no_platform {
        args.push("--no-platform".to_string());
    }
    if flags.verbose {
        args.push("--verbose".to_string());
    }
    if let Some(pattern) = flags.exclude.as_deref().filter(|p| !p.trim().is_empty()) {
        args.push("--exclude".to_string());
        args.push(pattern.trim().to_string());
    }
    args
}

/// Comma joined entry arguments for the prepared action
pub fn entries_argument(prepared: &Prepared) -> String {
    prepared
        .entries
        .iter()
        .map(|entry| entry.argument(prepared.action, prepared.syntax))
        .collect::<Vec<_>>()
        .join(",")
}

impl Invocation {
    pub fn new(
        program: impl Into<PathBuf>,
        prepared: &Prepared,
        flags: &CliFlags,
        api_token: Option<&str>,
    ) -> Self {
        let args = build_args(
            prepared.action,
            &prepared.workspace,
            &entries_argument(prepared),
            flags,
        );
        let env = api_token
            .map(|token| vec![(TOKEN_ENV.to_string(), token.to_string())])
            .unwrap_or_default();
        Self {
            program: program.into(),
            args,
            env,
        }
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

/// Run the invocation with inherited stdio and return its exit code.
///
/// A child killed by a signal reports `-1`. Failing to spawn is an error.
pub fn execute(invocation: &Invocation) -> Result<i32> {
    debug!(program = ?invocation.program, args = ?invocation.args, "running boringcache");
    let status = invocation
        .command()
        .status()
        .with_context(|| format!("Failed to run {:?}", invocation.program))?;
    Ok(status.code().unwrap_or(-1))
}
