//! Workflow reporter
//!
//! Logs through `tracing` and, inside a GitHub Actions job, mirrors warnings
//! and failures as workflow commands so they surface as annotations. Step
//! outputs and PATH additions are appended to the runner's command files.

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::core::inputs::Environment;

#[derive(Debug, Default)]
pub struct Reporter {
    annotations: bool,
    /// Keep stdout clean for commands that print data there
    annotations_on_stderr: bool,
    output_file: Option<PathBuf>,
    path_file: Option<PathBuf>,
    warnings: RefCell<Vec<String>>,
}

/// Escape a message for a workflow command
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

impl Reporter {
    pub fn new(env: &Environment) -> Self {
        Self {
            annotations: env.github_actions,
            annotations_on_stderr: false,
            output_file: env.output_file.clone(),
            path_file: env.path_file.clone(),
            warnings: RefCell::new(Vec::new()),
        }
    }

    /// Send workflow commands to stderr instead of stdout
    pub fn annotations_on_stderr(mut self) -> Self {
        self.annotations_on_stderr = true;
        self
    }

    fn annotate(&self, command: &str, message: &str) {
        if !self.annotations {
            return;
        }
        let line = format!("::{}::{}", command, escape_data(message));
        if self.annotations_on_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    pub fn info(&self, message: &str) {
        info!("{}", message);
    }

    pub fn warning(&self, message: &str) {
        warn!("{}", message);
        self.annotate("warning", message);
        self.warnings.borrow_mut().push(message.to_string());
    }

    /// Report a fatal error; the caller decides the exit code
    pub fn failure(&self, message: &str) {
        error!("{}", message);
        self.annotate("error", message);
    }

    #[cfg(test)]
    pub(crate) fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }

    /// Set a step output. Outside a job the value is only logged.
    pub fn set_output(&self, name: &str, value: &str) -> Result<()> {
        info!(output = name, value, "step output");
        match &self.output_file {
            Some(file) => append_line(file, &format!("{}={}", name, value)),
            None => Ok(()),
        }
    }

    /// Prepend a directory to PATH for later steps of the job
    pub fn add_path(&self, dir: &Path) -> Result<()> {
        match &self.path_file {
            Some(file) => append_line(file, &dir.to_string_lossy()),
            None => Ok(()),
        }
    }
}

fn append_line(file: &Path, line: &str) -> Result<()> {
    let mut handle = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .with_context(|| format!("Failed to open {:?}", file))?;
    writeln!(handle, "{}", line).with_context(|| format!("Failed to write {:?}", file))?;
    Ok(())
}
