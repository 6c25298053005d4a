//! Path resolution
//!
//! Turns user supplied cache paths into absolute paths against an explicit
//! working directory and home directory.

use std::path::{Component, Path, PathBuf};

use crate::core::model::ActionError;

/// Directories relative paths are resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathContext {
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
}

impl PathContext {
    pub fn new(cwd: impl Into<PathBuf>, home: Option<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            home,
        }
    }
}

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// `C:\x`, `C:/x` or a UNC path, regardless of the host platform
pub fn is_windows_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    let drive = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/');
    drive || path.starts_with("\\\\")
}

pub fn is_absolute(path: &str) -> bool {
    Path::new(path).is_absolute() || path.starts_with('/') || is_windows_absolute(path)
}

/// Fold `.` and `..` components without touching the filesystem
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` never climbs above the root
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve a single path.
///
/// Absolute paths pass through unchanged, `~/` expands to the home directory
/// and anything else is resolved against the working directory.
pub fn resolve_path(raw: &str, ctx: &PathContext) -> Result<PathBuf, ActionError> {
    let trimmed = raw.trim();

    if is_absolute(trimmed) {
        return Ok(PathBuf::from(trimmed));
    }

    if let Some(rest) = trimmed.strip_prefix("~/") {
        let home = ctx
            .home
            .as_ref()
            .ok_or_else(|| ActionError::NoHomeDir(trimmed.to_string()))?;
        return Ok(lexical_normalize(&home.join(rest)));
    }

    Ok(lexical_normalize(&ctx.cwd.join(trimmed)))
}

/// Split a newline separated block into trimmed, non-blank lines
pub fn split_lines(block: &str) -> Vec<String> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve every line of a newline separated block, re-joined with '\n'
pub fn resolve_paths(block: &str, ctx: &PathContext) -> Result<String, ActionError> {
    let resolved = split_lines(block)
        .iter()
        .map(|line| resolve_path(line, ctx).map(|p| p.to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(resolved.join("\n"))
}
