//! Cache entry model
//!
//! Everything the parser produces and the backends consume. Values are built
//! fresh for every invocation and never persisted.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The operation handed to the boringcache CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Save,
    Restore,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Save => "save",
            Action::Restore => "restore",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry mini-language accepted in the `entries` input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySyntax {
    /// `path:tag` when saving, `tag:path` when restoring
    #[default]
    Positional,
    /// `tag:path` or `tag:restore_path=>save_path` for both actions
    Tagged,
}

impl EntrySyntax {
    /// Human readable pattern used in error messages
    pub fn expected(&self, action: Action) -> &'static str {
        match (self, action) {
            (EntrySyntax::Positional, Action::Save) => "path:tag",
            (EntrySyntax::Positional, Action::Restore) => "tag:path",
            (EntrySyntax::Tagged, _) => "tag:path or tag:restore_path=>save_path",
        }
    }
}

impl std::str::FromStr for EntrySyntax {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "positional" => Ok(EntrySyntax::Positional),
            "tagged" | "tag" => Ok(EntrySyntax::Tagged),
            _ => Err(format!("Unknown entry syntax: {}", s)),
        }
    }
}

/// One cache unit: a tag plus where to restore it and where to save it from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    /// Never empty
    pub tag: String,

    /// Absolute path the entry is restored into
    pub restore_path: PathBuf,

    /// Absolute path the entry is saved from (same as `restore_path` unless redirected)
    pub save_path: PathBuf,

    /// Entry text rebuilt from its trimmed fields
    pub spec: String,
}

impl CacheEntry {
    /// Entry that uses one path for both directions
    pub fn new(tag: impl Into<String>, path: PathBuf, spec: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            restore_path: path.clone(),
            save_path: path,
            spec: spec.into(),
        }
    }

    pub fn path_for(&self, action: Action) -> &Path {
        match action {
            Action::Save => &self.save_path,
            Action::Restore => &self.restore_path,
        }
    }

    pub fn is_redirected(&self) -> bool {
        self.restore_path != self.save_path
    }

    /// Text passed to the CLI for this entry
    pub fn argument(&self, action: Action, syntax: EntrySyntax) -> String {
        match syntax {
            EntrySyntax::Positional => self.spec.clone(),
            EntrySyntax::Tagged => {
                format!("{}:{}", self.tag, self.path_for(action).to_string_lossy())
            }
        }
    }
}

/// Workspace and key after platform derivation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheConfig {
    pub workspace: String,
    pub full_key: String,
    pub platform_suffix: String,
}

/// Fatal configuration errors. Any of these aborts the run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Either (workspace + entries) or (path + key) inputs are required")]
    MissingInputs,

    #[error("Input \"{name}\" is required when using {format} format")]
    MissingInput {
        name: &'static str,
        format: &'static str,
    },

    #[error("Workspace must be in format \"namespace/workspace\" (e.g., \"my-org/my-project\"), got \"{0}\"")]
    InvalidWorkspace(String),

    #[error("Invalid entry format: {entry}. Expected format: {expected}")]
    InvalidEntry {
        entry: String,
        expected: &'static str,
    },

    #[error("Cannot expand \"{0}\": home directory is unknown")]
    NoHomeDir(String),

    #[error("boringcache CLI installation failed: {0}")]
    InstallFailed(String),
}

impl ActionError {
    pub fn invalid_entry(entry: &str, syntax: EntrySyntax, action: Action) -> Self {
        ActionError::InvalidEntry {
            entry: entry.to_string(),
            expected: syntax.expected(action),
        }
    }
}
