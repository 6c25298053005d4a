//! Input validation and workspace resolution
//!
//! Raw inputs are validated once and collapsed into an [`InputMode`]; nothing
//! past this module checks which fields were present.

use serde::Serialize;
use std::path::PathBuf;

use crate::core::entries::parse_entries;
use crate::core::model::{Action, ActionError, CacheConfig, CacheEntry, EntrySyntax};
use crate::core::paths::{resolve_paths, PathContext};
use crate::core::platform::{Platform, SuffixFlags};

pub const DEFAULT_WORKSPACE: &str = "default/default";

/// Inputs as the user supplied them. Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    pub workspace: Option<String>,
    pub entries: Option<String>,
    pub path: Option<String>,
    pub key: Option<String>,
}

/// Ambient process state, captured once at startup
#[derive(Debug, Clone)]
pub struct Environment {
    /// `owner/repo` of the running workflow
    pub repository: Option<String>,
    pub api_token: Option<String>,
    pub default_workspace: Option<String>,
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
    pub platform: Platform,
    /// Running inside a GitHub Actions job
    pub github_actions: bool,
    pub output_file: Option<PathBuf>,
    pub path_file: Option<PathBuf>,
}

impl Environment {
    pub fn path_context(&self) -> PathContext {
        PathContext::new(self.cwd.clone(), self.home.clone())
    }
}

/// Which configuration style is in effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// `workspace` + `entries`
    Entries {
        workspace: Option<String>,
        entries: String,
    },
    /// newline separated `path` block + a single `key`
    PathKey {
        workspace: Option<String>,
        paths: String,
        key: String,
    },
}

impl InputMode {
    pub fn workspace(&self) -> Option<&str> {
        match self {
            InputMode::Entries { workspace, .. } | InputMode::PathKey { workspace, .. } => {
                workspace.as_deref()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub mode: InputMode,
    pub warnings: Vec<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Gate the raw inputs. Ambiguity is a warning, everything else is fatal.
pub fn validate_inputs(inputs: &RawInputs) -> Result<Validated, ActionError> {
    let workspace = present(&inputs.workspace);
    let entries = present(&inputs.entries);
    let path = present(&inputs.path);
    let key = present(&inputs.key);

    let has_cache_format = path.is_some() || key.is_some();
    // A lone workspace selects the entry-list form; next to path/key it scopes that form.
    let has_cli_format = entries.is_some() || (workspace.is_some() && !has_cache_format);

    if !has_cli_format && !has_cache_format {
        return Err(ActionError::MissingInputs);
    }

    let mut warnings = Vec::new();
    if entries.is_some() && has_cache_format {
        warnings.push(
            "Both CLI format (workspace/entries) and actions/cache format (path/key) provided. Using CLI format."
                .to_string(),
        );
    }

    let workspace = workspace.map(str::to_string);
    let mode = if has_cli_format {
        let entries = entries.ok_or(ActionError::MissingInput {
            name: "entries",
            format: "CLI",
        })?;
        InputMode::Entries {
            workspace,
            entries: entries.to_string(),
        }
    } else {
        let paths = path.ok_or(ActionError::MissingInput {
            name: "path",
            format: "actions/cache",
        })?;
        let key = key.ok_or(ActionError::MissingInput {
            name: "key",
            format: "actions/cache",
        })?;
        InputMode::PathKey {
            workspace,
            paths: paths.to_string(),
            key: key.to_string(),
        }
    };

    if let Some(ws) = mode.workspace() {
        if !ws.contains('/') {
            return Err(ActionError::InvalidWorkspace(ws.to_string()));
        }
    }

    Ok(Validated { mode, warnings })
}

/// `owner/repo` from a repository identifier, if it has two non-empty segments
fn workspace_from_repository(repository: &str) -> Option<String> {
    let mut parts = repository.trim().split('/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let repo = parts.next().filter(|s| !s.is_empty())?;
    Some(format!("{}/{}", owner, repo))
}

/// Explicit input, else the repository, else the configured or fixed default.
pub fn resolve_workspace(explicit: Option<&str>, env: &Environment) -> String {
    if let Some(ws) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return ws.to_string();
    }
    if let Some(ws) = env.repository.as_deref().and_then(workspace_from_repository) {
        return ws;
    }
    env.default_workspace
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_WORKSPACE)
        .to_string()
}

/// One entry per path, all tagged with the full key
pub fn entries_from_paths(
    paths: &str,
    full_key: &str,
    action: Action,
    ctx: &PathContext,
) -> Result<Vec<CacheEntry>, ActionError> {
    let resolved = resolve_paths(paths, ctx)?;
    Ok(resolved
        .lines()
        .map(|path| {
            let spec = match action {
                Action::Save => format!("{}:{}", path, full_key),
                Action::Restore => format!("{}:{}", full_key, path),
            };
            CacheEntry::new(full_key, PathBuf::from(path), spec)
        })
        .collect())
}

/// Everything a backend needs to build an invocation
#[derive(Debug, Clone, Serialize)]
pub struct Prepared {
    pub action: Action,
    pub workspace: String,
    pub syntax: EntrySyntax,
    /// Only set in path/key mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,
    pub entries: Vec<CacheEntry>,
    #[serde(skip)]
    pub warnings: Vec<String>,
}

/// Validate, resolve the workspace and parse the entries for one action.
pub fn prepare(
    action: Action,
    inputs: &RawInputs,
    syntax: EntrySyntax,
    flags: SuffixFlags,
    env: &Environment,
) -> Result<Prepared, ActionError> {
    let Validated { mode, warnings } = validate_inputs(inputs)?;
    let workspace = resolve_workspace(mode.workspace(), env);
    let ctx = env.path_context();

    let (cache, entries) = match &mode {
        InputMode::Entries { entries, .. } => {
            (None, parse_entries(entries, action, syntax, &ctx)?)
        }
        InputMode::PathKey { paths, key, .. } => {
            let cache = CacheConfig::derive(workspace.clone(), key, env.platform, flags);
            let entries = entries_from_paths(paths, &cache.full_key, action, &ctx)?;
            (Some(cache), entries)
        }
    };

    Ok(Prepared {
        action,
        workspace,
        syntax,
        cache,
        entries,
        warnings,
    })
}
