//! Save flow
//!
//! Drops entries whose save path is missing, then hands the rest to
//! `boringcache save`. Missing paths and a failing CLI are warnings only.

use anyhow::Result;
use std::path::Path;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::backends::boringcache::{entries_argument, execute, CliFlags, Invocation};
use crate::core::inputs::Prepared;
use crate::core::model::{Action, CacheEntry};
use crate::core::report::Reporter;

/// Outcome of a save run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing to save, the CLI was not invoked
    Skipped,
    Saved(usize),
    Failed(i32),
}

fn path_exists(path: &Path) -> bool {
    let exists = path.exists();
    if exists {
        debug!("Path exists: {}", path.display());
    } else {
        debug!("Path not found: {}", path.display());
    }
    exists
}

#[cfg(feature = "parallel")]
fn existence(entries: &[CacheEntry]) -> Vec<bool> {
    entries
        .par_iter()
        .map(|entry| path_exists(&entry.save_path))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn existence(entries: &[CacheEntry]) -> Vec<bool> {
    entries
        .iter()
        .map(|entry| path_exists(&entry.save_path))
        .collect()
}

/// Keep only entries whose save path exists, warning about the rest.
pub fn filter_existing(prepared: &Prepared, reporter: &Reporter) -> Prepared {
    let exists = existence(&prepared.entries);

    let (present, missing): (Vec<_>, Vec<_>) = prepared
        .entries
        .iter()
        .zip(exists)
        .partition(|(_, exists)| *exists);

    if !missing.is_empty() {
        let listed = missing
            .iter()
            .map(|(entry, _)| entry.save_path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        reporter.warning(&format!("Some cache paths do not exist: {}", listed));
    }

    Prepared {
        entries: present.into_iter().map(|(entry, _)| entry.clone()).collect(),
        ..prepared.clone()
    }
}

/// Save every existing entry through the CLI
pub fn run_save(
    program: &Path,
    prepared: &Prepared,
    flags: &CliFlags,
    api_token: Option<&str>,
    reporter: &Reporter,
) -> Result<SaveOutcome> {
    debug_assert_eq!(prepared.action, Action::Save);

    let valid = filter_existing(prepared, reporter);
    if valid.entries.is_empty() {
        reporter.warning("No valid cache paths found, skipping save");
        return Ok(SaveOutcome::Skipped);
    }

    reporter.info(&format!("Saving cache entries: {}", entries_argument(&valid)));
    let invocation = Invocation::new(program, &valid, flags, api_token);

    let code = execute(&invocation)?;
    if code == 0 {
        reporter.info(&format!(
            "Successfully saved {} cache entries",
            valid.entries.len()
        ));
        Ok(SaveOutcome::Saved(valid.entries.len()))
    } else {
        reporter.warning(&format!("Failed to save cache entries (exit code {})", code));
        Ok(SaveOutcome::Failed(code))
    }
}
