use crate::config::{load_config, ConfigModel};
use crate::generator::{assemble, load_schema, render_schema, ProjectConfig};
use crate::ir::build_ir;
use crate::linter::{has_errors, lint_config, print_lint_issues, LintSeverity};
use crate::logging::{LogConfig, LogFormat};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// Command-line interface for the grip project compiler
#[derive(Parser)]
#[command(name = "grip-gen")]
#[command(about = "Compile declarative GraphQL definitions into a runnable project", long_about = None)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "GRIP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormatArg>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// `--log-format` values
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Json,
    Pretty,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build the schema and project sources from a configuration file
    BuildSchema {
        /// Configuration file (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Project name; the schema is written to <project_home>/<name>.graphql
        #[arg(short, long)]
        project_name: String,

        /// Overwrite existing files
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },
    /// Generate bootstrap sources for an existing schema file
    LoadSchema {
        /// Configuration file (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Existing schema file; a relative path is resolved against project_home
        #[arg(short, long)]
        schema: PathBuf,

        /// Overwrite existing bootstrap sources
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },
    /// Lint a configuration file
    ///
    /// Checks names, type references, undeclared types, list declarations and
    /// module names.
    Lint {
        /// Configuration file (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Exit with error code if any errors are found
        #[arg(long, default_value_t = false)]
        fail_on_error: bool,

        /// Show only errors (hide warnings and info)
        #[arg(long, default_value_t = false)]
        errors_only: bool,
    },
    /// Print the schema a configuration file compiles to
    Inspect {
        /// Configuration file (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,
    },
}

impl Cli {
    /// Logging configuration from the environment and global flags
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::from_env();
        if let Some(level) = &self.log_level {
            config = config.with_level(level.clone());
        }
        if let Some(format) = self.log_format {
            config = config.with_format(match format {
                LogFormatArg::Json => LogFormat::Json,
                LogFormatArg::Pretty => LogFormat::Pretty,
            });
        }
        config
    }
}

/// Execute a parsed command
///
/// # Errors
///
/// Returns an error if:
/// - The configuration cannot be read, parsed or compiled
/// - `build-schema` / `load-schema` found lint errors in the configuration
/// - An artifact already exists and `--force` was not given
/// - Writing an artifact fails
/// - `lint --fail-on-error` found errors
pub fn run_cli(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::BuildSchema {
            config,
            project_name,
            force,
        } => {
            let model = load_config(config)?;
            refuse_lint_errors(&model, config)?;
            let ir = build_ir(&model)?;
            let project = ProjectConfig::from_config(&model, config, project_name)?;
            let written = assemble(&ir, &project, *force)
                .with_context(|| format!("building project '{project_name}'"))?;
            report_written(&written);
            Ok(())
        }
        Commands::LoadSchema {
            config,
            schema,
            force,
        } => {
            let model = load_config(config)?;
            refuse_lint_errors(&model, config)?;
            let ir = build_ir(&model)?;
            let project = ProjectConfig::from_config(&model, config, "")?;
            let schema = project.home_dir.join(schema);
            let project = project.with_schema_file(schema);
            let written = load_schema(&ir, &project, *force)
                .with_context(|| format!("loading schema {}", project.schema_file.display()))?;
            report_written(&written);
            Ok(())
        }
        Commands::Lint {
            config,
            fail_on_error,
            errors_only,
        } => {
            let model = load_config(config)?;
            let mut issues = lint_config(&model);
            if *errors_only {
                issues.retain(|i| i.severity == LintSeverity::Error);
            }
            print_lint_issues(&issues);
            if *fail_on_error && has_errors(&issues) {
                bail!("{} contains lint errors", config.display());
            }
            Ok(())
        }
        Commands::Inspect { config } => {
            let model = load_config(config)?;
            let ir = build_ir(&model)?;
            print!("{}", render_schema(&ir)?);
            Ok(())
        }
    }
}

/// Generation would emit a schema or sources that do not compile
fn refuse_lint_errors(model: &ConfigModel, config: &Path) -> anyhow::Result<()> {
    let errors: Vec<_> = lint_config(model)
        .into_iter()
        .filter(|i| i.severity == LintSeverity::Error)
        .collect();
    if errors.is_empty() {
        return Ok(());
    }
    print_lint_issues(&errors);
    bail!(
        "{} has {} lint error(s); nothing was generated",
        config.display(),
        errors.len()
    );
}

fn report_written(paths: &[PathBuf]) {
    for path in paths {
        println!("✅ Generated: {}", path.display());
    }
}
