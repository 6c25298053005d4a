//! Entry parser
//!
//! Parses the comma separated `entries` input in two passes: the list is split
//! into entries first, then each entry is split into its fields.
//!
//! Positional syntax:
//!   save     `path:tag`      split on the last colon
//!   restore  `tag:path`      split on the first colon
//!
//! Tagged syntax (both actions):
//!   `tag:path`
//!   `tag:restore_path=>save_path`
//!
//! A colon at byte 1 of a positional save entry is a bare drive letter
//! (`C:cache`) and is rejected rather than guessed at.

use crate::core::model::{Action, ActionError, CacheEntry, EntrySyntax};
use crate::core::paths::{resolve_path, PathContext};

pub const REDIRECT: &str = "=>";

/// Split the raw list into trimmed, non-empty entries
pub fn split_entries(input: &str) -> Vec<&str> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Parse every entry of the list, preserving order.
pub fn parse_entries(
    input: &str,
    action: Action,
    syntax: EntrySyntax,
    ctx: &PathContext,
) -> Result<Vec<CacheEntry>, ActionError> {
    split_entries(input)
        .into_iter()
        .map(|entry| parse_entry(entry, action, syntax, ctx))
        .collect()
}

/// Parse one trimmed entry
pub fn parse_entry(
    entry: &str,
    action: Action,
    syntax: EntrySyntax,
    ctx: &PathContext,
) -> Result<CacheEntry, ActionError> {
    match syntax {
        EntrySyntax::Positional => parse_positional(entry, action, ctx),
        EntrySyntax::Tagged => parse_tagged(entry, action, ctx),
    }
}

fn parse_positional(
    entry: &str,
    action: Action,
    ctx: &PathContext,
) -> Result<CacheEntry, ActionError> {
    let invalid = || ActionError::invalid_entry(entry, EntrySyntax::Positional, action);

    let colon = match action {
        Action::Save => entry.rfind(':'),
        Action::Restore => entry.find(':'),
    }
    .ok_or_else(invalid)?;

    if action == Action::Save && colon == 1 {
        return Err(invalid());
    }

    let (left, right) = (entry[..colon].trim(), entry[colon + 1..].trim());
    let (tag, path) = match action {
        Action::Save => (right, left),
        Action::Restore => (left, right),
    };

    if tag.is_empty() || path.is_empty() {
        return Err(invalid());
    }

    // The CLI receives the trimmed fields, not the raw entry text
    let spec = format!("{}:{}", left, right);
    Ok(CacheEntry::new(tag, resolve_path(path, ctx)?, spec))
}

fn parse_tagged(entry: &str, action: Action, ctx: &PathContext) -> Result<CacheEntry, ActionError> {
    let invalid = || ActionError::invalid_entry(entry, EntrySyntax::Tagged, action);

    let (tag, path_spec) = entry.split_once(':').ok_or_else(invalid)?;
    let (tag, path_spec) = (tag.trim(), path_spec.trim());

    if tag.is_empty() || path_spec.is_empty() {
        return Err(invalid());
    }

    let Some((restore, save)) = path_spec.split_once(REDIRECT) else {
        return Ok(CacheEntry::new(tag, resolve_path(path_spec, ctx)?, entry));
    };

    let (restore, save) = (restore.trim(), save.trim());
    if restore.is_empty() || save.is_empty() || save.contains(REDIRECT) {
        return Err(invalid());
    }

    Ok(CacheEntry {
        tag: tag.to_string(),
        restore_path: resolve_path(restore, ctx)?,
        save_path: resolve_path(save, ctx)?,
        spec: entry.to_string(),
    })
}
