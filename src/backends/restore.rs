//! Restore flow

use anyhow::Result;
use std::path::Path;

use crate::backends::boringcache::{entries_argument, execute, CliFlags, Invocation};
use crate::core::inputs::Prepared;
use crate::core::report::Reporter;

pub const CACHE_HIT_OUTPUT: &str = "cache-hit";

/// Restore every entry and publish `cache-hit`. Returns whether it was a hit.
pub fn run_restore(
    program: &Path,
    prepared: &Prepared,
    flags: &CliFlags,
    api_token: Option<&str>,
    reporter: &Reporter,
) -> Result<bool> {
    if prepared.entries.is_empty() {
        reporter.warning("No cache entries to restore");
        reporter.set_output(CACHE_HIT_OUTPUT, "false")?;
        return Ok(false);
    }

    reporter.info(&format!(
        "Restoring cache entries: {}",
        entries_argument(prepared)
    ));
    let invocation = Invocation::new(program, prepared, flags, api_token);

    let hit = execute(&invocation)? == 0;
    if hit {
        reporter.info(&format!(
            "Restored {} cache entries",
            prepared.entries.len()
        ));
    } else {
        reporter.warning("Cache not restored; continuing without it");
    }

    reporter.set_output(CACHE_HIT_OUTPUT, if hit { "true" } else { "false" })?;
    Ok(hit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Action, EntrySyntax};

    #[test]
    fn test_empty_restore_is_a_miss() {
        let prepared = Prepared {
            action: Action::Restore,
            workspace: "org/project".to_string(),
            syntax: EntrySyntax::Positional,
            cache: None,
            entries: Vec::new(),
            warnings: Vec::new(),
        };
        let reporter = Reporter::default();
        let hit = run_restore(
            Path::new("/definitely/not/boringcache"),
            &prepared,
            &CliFlags::default(),
            None,
            &reporter,
        )
        .unwrap();
        assert!(!hit);
        assert_eq!(reporter.warnings(), vec!["No cache entries to restore"]);
    }
}
