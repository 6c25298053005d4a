//! CLI module - Command-line interface definitions and handlers
//!
//! Every input doubles as an `INPUT_<NAME>` environment variable, which is how
//! a GitHub Actions runner passes `with:` values to a step.

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::backends::boringcache::{CliFlags, Invocation, DEFAULT_PROGRAM, TOKEN_ENV};
use crate::backends::install::{
    default_install_dir, ensure_boringcache, run_doctor, InstallOptions, DEFAULT_INSTALL_URL,
};
use crate::backends::restore::run_restore;
use crate::backends::save::run_save;
use crate::core::inputs::{prepare, Environment, Prepared, RawInputs};
use crate::core::model::{Action, EntrySyntax};
use crate::core::platform::{Platform, SuffixFlags};
use crate::core::render::{OutputFormat, Plan, RenderConfig, Renderer};
use crate::core::report::Reporter;
use crate::core::util::non_empty;

/// boringcache-action - save and restore CI cache entries through the boringcache CLI.
#[derive(Parser, Debug)]
#[command(name = "boringcache-action")]
#[command(
    author,
    version,
    about,
    long_about = r#"boringcache-action validates cache inputs, resolves paths and runs
`boringcache save` or `boringcache restore` with the resulting entries.

Inputs can be given as flags or as INPUT_<NAME> environment variables.

Entry syntax (--syntax):
- positional (default): path:tag when saving, tag:path when restoring
- tagged: tag:path, or tag:restore_path=>save_path

Examples:
    boringcache-action --workspace my-org/my-project --entries node_modules:deps save
    boringcache-action --path ~/.npm --key deps-abc123 restore
    boringcache-action --entries deps:node_modules --syntax tagged plan save
"#
)]
pub struct Cli {
    /// Workspace as namespace/name.
    #[arg(long, global = true, env = "INPUT_WORKSPACE", value_name = "NS/NAME")]
    pub workspace: Option<String>,

    /// Comma-separated cache entries.
    #[arg(long, global = true, env = "INPUT_ENTRIES", value_name = "ENTRIES")]
    pub entries: Option<String>,

    /// Newline-separated paths (used with --key).
    #[arg(long, global = true, env = "INPUT_PATH", value_name = "PATHS")]
    pub path: Option<String>,

    /// Cache key for --path.
    #[arg(long, global = true, env = "INPUT_KEY", value_name = "KEY")]
    pub key: Option<String>,

    /// Share entries across operating systems (disables the platform suffix).
    #[arg(
        long,
        global = true,
        alias = "enableCrossOsArchive",
        env = "INPUT_ENABLECROSSOSARCHIVE",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub enable_cross_os_archive: bool,

    /// Do not append -{os}-{arch} to cache keys.
    #[arg(
        long,
        global = true,
        env = "INPUT_NO-PLATFORM",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub no_platform: bool,

    /// Overwrite existing entries when saving.
    #[arg(
        long,
        global = true,
        alias = "force",
        env = "INPUT_SAVE-ALWAYS",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub save_always: bool,

    /// Verbose mode (debug logs, forwarded to the CLI).
    #[arg(
        short,
        long,
        global = true,
        env = "INPUT_VERBOSE",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub verbose: bool,

    /// Glob of files to leave out of saved entries.
    #[arg(long, global = true, env = "INPUT_EXCLUDE", value_name = "GLOB")]
    pub exclude: Option<String>,

    /// Pin the boringcache CLI version.
    #[arg(long, global = true, env = "INPUT_CLI-VERSION", value_name = "VERSION")]
    pub cli_version: Option<String>,

    /// Entry syntax (positional/tagged).
    #[arg(
        long,
        global = true,
        env = "INPUT_ENTRY-SYNTAX",
        default_value = "positional",
        value_name = "SYNTAX"
    )]
    pub syntax: String,

    /// boringcache executable to run.
    #[arg(
        long,
        global = true,
        env = "BORINGCACHE_BIN",
        default_value = DEFAULT_PROGRAM,
        value_name = "PROGRAM"
    )]
    pub cli_path: PathBuf,

    /// Installer script used when the CLI is missing.
    #[arg(
        long,
        global = true,
        env = "BORINGCACHE_INSTALL_URL",
        default_value = DEFAULT_INSTALL_URL,
        value_name = "URL"
    )]
    pub install_url: String,

    /// Never install the CLI; fail if it is missing.
    #[arg(
        long,
        global = true,
        env = "BORINGCACHE_SKIP_INSTALL",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub skip_install: bool,

    /// Output format for `plan` (json/jsonl/md).
    #[arg(long, global = true, default_value = "json", value_name = "FORMAT")]
    pub format: String,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Save existing cache paths with `boringcache save`.
    #[command(
        long_about = "Parse the entries, drop the ones whose path does not exist and run\n\
`boringcache save`. Missing paths and a failing CLI are reported as warnings;\n\
only invalid inputs fail the step."
    )]
    Save,

    /// Restore cache entries with `boringcache restore`.
    #[command(
        long_about = "Parse the entries and run `boringcache restore`. Sets the `cache-hit`\n\
step output to true when the CLI succeeds."
    )]
    Restore,

    /// Print the resolved entries and CLI arguments without running anything.
    Plan {
        /// Action to plan.
        #[arg(value_parser = ["save", "restore"], default_value = "save")]
        action: String,
    },

    /// Check whether the boringcache CLI is available.
    Doctor,
}

impl Commands {
    pub fn label(&self) -> &'static str {
        match self {
            Commands::Save => "save",
            Commands::Restore => "restore",
            Commands::Plan { .. } => "plan",
            Commands::Doctor => "doctor",
        }
    }

    /// Machine-readable output goes to stdout
    pub fn prints_to_stdout(&self) -> bool {
        matches!(self, Commands::Plan { .. })
    }
}

impl Cli {
    pub fn raw_inputs(&self) -> RawInputs {
        RawInputs {
            workspace: non_empty(self.workspace.clone()),
            entries: non_empty(self.entries.clone()),
            path: non_empty(self.path.clone()),
            key: non_empty(self.key.clone()),
        }
    }

    pub fn suffix_flags(&self) -> SuffixFlags {
        SuffixFlags {
            no_platform: self.no_platform,
            cross_os_archive: self.enable_cross_os_archive,
        }
    }

    pub fn cli_flags(&self) -> CliFlags {
        CliFlags {
            force: self.save_always,
            no_platform: self.suffix_flags().suppressed(),
            verbose: self.verbose,
            exclude: non_empty(self.exclude.clone()),
        }
    }

    fn install_options(&self, env: &Environment) -> InstallOptions {
        InstallOptions {
            program: self.cli_path.clone(),
            version: non_empty(self.cli_version.clone()),
            install_url: self.install_url.clone(),
            install_dir: default_install_dir(env.home.as_deref(), &env.cwd),
            skip_install: self.skip_install,
        }
    }
}

/// Snapshot the process environment. The only place ambient state is read.
pub fn capture_environment() -> Result<Environment> {
    let var = |name: &str| non_empty(std::env::var(name).ok());
    Ok(Environment {
        repository: var("GITHUB_REPOSITORY"),
        api_token: var(TOKEN_ENV),
        default_workspace: var("BORINGCACHE_DEFAULT_WORKSPACE"),
        cwd: std::env::current_dir().context("Failed to read the current directory")?,
        home: dirs::home_dir(),
        platform: Platform::current(),
        github_actions: var("GITHUB_ACTIONS").as_deref() == Some("true"),
        output_file: var("GITHUB_OUTPUT").map(PathBuf::from),
        path_file: var("GITHUB_PATH").map(PathBuf::from),
    })
}

fn prepare_action(
    cli: &Cli,
    action: Action,
    env: &Environment,
    reporter: &Reporter,
) -> Result<Prepared> {
    let syntax: EntrySyntax = cli.syntax.parse().map_err(anyhow::Error::msg)?;
    let prepared = prepare(action, &cli.raw_inputs(), syntax, cli.suffix_flags(), env)?;
    for warning in &prepared.warnings {
        reporter.warning(warning);
    }
    Ok(prepared)
}

/// Run the CLI command
pub fn run(cli: Cli, env: &Environment, reporter: &Reporter) -> Result<()> {
    match &cli.command {
        Commands::Save | Commands::Restore => {
            let action = match cli.command {
                Commands::Save => Action::Save,
                _ => Action::Restore,
            };
            let prepared = prepare_action(&cli, action, env, reporter)?;
            let program = ensure_boringcache(&cli.install_options(env), reporter)?;

            if env.api_token.is_none() {
                reporter.warning(&format!(
                    "{} is not set; the boringcache CLI may fail to authenticate",
                    TOKEN_ENV
                ));
            }

            let flags = cli.cli_flags();
            let token = env.api_token.as_deref();
            match action {
                Action::Save => run_save(&program, &prepared, &flags, token, reporter).map(|_| ()),
                Action::Restore => {
                    run_restore(&program, &prepared, &flags, token, reporter).map(|_| ())
                }
            }
        }

        Commands::Plan { action } => {
            let action = match action.as_str() {
                "restore" => Action::Restore,
                _ => Action::Save,
            };
            let format: OutputFormat = cli.format.parse().map_err(anyhow::Error::msg)?;
            let prepared = prepare_action(&cli, action, env, reporter)?;
            let invocation = Invocation::new(&cli.cli_path, &prepared, &cli.cli_flags(), None);
            let plan = Plan {
                prepared: &prepared,
                program: invocation.program.to_string_lossy().into_owned(),
                args: &invocation.args,
            };
            let renderer = Renderer::with_config(RenderConfig::with_pretty(format, cli.pretty));
            renderer
                .render_to(&plan, std::io::stdout().lock())
                .context("Failed to write plan")
        }

        Commands::Doctor => run_doctor(&cli.install_options(env)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("boringcache-action").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_flags_after_subcommand() {
        let cli = parse(&["save", "--workspace", "org/p", "--entries", "a:b", "--force"]);
        assert_eq!(cli.command.label(), "save");
        assert!(!cli.command.prints_to_stdout());
        assert!(cli.save_always);
        assert_eq!(cli.raw_inputs().workspace.as_deref(), Some("org/p"));
    }

    #[test]
    fn test_cli_flags_forward_suppression() {
        let cli = parse(&["--enable-cross-os-archive", "restore"]);
        let flags = cli.cli_flags();
        assert!(flags.no_platform);
        assert!(!flags.force);
    }

    #[test]
    fn test_blank_inputs_are_absent() {
        let cli = parse(&["--workspace", "", "--exclude", " ", "save"]);
        assert_eq!(cli.raw_inputs().workspace, None);
        assert_eq!(cli.cli_flags().exclude, None);
    }

    #[test]
    fn test_plan_defaults_to_save() {
        let cli = parse(&["plan"]);
        assert!(cli.command.prints_to_stdout());
        match cli.command {
            Commands::Plan { action } => assert_eq!(action, "save"),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
