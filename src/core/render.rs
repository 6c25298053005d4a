//! Renderer module
//!
//! Renders a resolved plan to json, jsonl or md for the `plan` command.

use serde::Serialize;
use std::io::Write;

use crate::core::inputs::Prepared;
use crate::core::paths::normalize_path;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Jsonl,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "jsonl" => Ok(OutputFormat::Jsonl),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// What would be run, without running it
#[derive(Debug, Serialize)]
pub struct Plan<'a> {
    #[serde(flatten)]
    pub prepared: &'a Prepared,
    pub program: String,
    pub args: &'a [String],
}

pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, plan: &Plan) -> String {
        match self.config.format {
            OutputFormat::Json => self.render_json(plan),
            OutputFormat::Jsonl => self.render_jsonl(plan),
            OutputFormat::Markdown => self.render_markdown(plan),
        }
    }

    /// Render to a writer
    pub fn render_to<W: Write>(&self, plan: &Plan, mut writer: W) -> std::io::Result<()> {
        let output = self.render(plan);
        writeln!(writer, "{}", output)
    }

    fn to_json<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.config.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|_| "{}".to_string())
    }

    fn render_json(&self, plan: &Plan) -> String {
        self.to_json(plan)
    }

    /// One object per entry
    fn render_jsonl(&self, plan: &Plan) -> String {
        plan.prepared
            .entries
            .iter()
            .map(|entry| self.to_json(entry))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_markdown(&self, plan: &Plan) -> String {
        let prepared = plan.prepared;
        let mut output = String::new();

        output.push_str(&format!("## {} `{}`\n\n", prepared.action, prepared.workspace));

        if let Some(cache) = &prepared.cache {
            output.push_str(&format!("Key: `{}`\n\n", cache.full_key));
        }

        output.push_str("## Entries\n\n");
        if prepared.entries.is_empty() {
            output.push_str("_none_\n");
        }
        for entry in &prepared.entries {
            output.push_str(&format!(
                "- **{}**: `{}`",
                entry.tag,
                normalize_path(entry.path_for(prepared.action))
            ));
            if entry.is_redirected() {
                output.push_str(&format!(
                    " (restore `{}`, save `{}`)",
                    normalize_path(&entry.restore_path),
                    normalize_path(&entry.save_path)
                ));
            }
            output.push('\n');
        }

        output.push_str("\n## Command\n\n```\n");
        output.push_str(&plan.program);
        for arg in plan.args {
            output.push(' ');
            output.push_str(arg);
        }
        output.push_str("\n```\n");

        output
    }
}
