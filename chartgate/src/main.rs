//! chartgate - CI gate for Helm charts
//!
//! Finds every chart under the charts directory, renders it once per fixture
//! values file with `helm template`, and validates the output with
//! `kubeconform`. Exits non-zero if any case fails.

#![forbid(unsafe_code)]

mod commands;

use anyhow::Result;
use chartgate_common::{ConfigOverrides, GateConfig, GateError, LogConfig, init_logging};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status for configuration and charts-root errors.
const EXIT_SETUP_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "chartgate")]
#[command(
    author,
    version,
    about = "chartgate - render Helm chart fixtures and validate them with kubeconform"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read settings from this file instead of ./.env
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Charts root (overrides CHARTS_DIRECTORY)
    #[arg(long, global = true, value_name = "DIR")]
    charts_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Render and validate every fixture (default)
    Run,

    /// List discovered test cases without running anything
    List,

    /// Show the resolved configuration and where each value came from
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("chartgate: {err}");
            ExitCode::from(EXIT_SETUP_ERROR)
        }
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let overrides = ConfigOverrides {
        charts_directory: cli.charts_dir,
        log_level: cli.verbose.then(|| "trace".to_string()),
    };
    let config = GateConfig::load(cli.env_file.as_deref(), &overrides).map_err(GateError::from)?;

    let _logging_guards = init_logging(&LogConfig::from_gate_config(&config).with_stderr())?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::run(&config, cli.report).await,
        Commands::List => commands::list::list(&config, cli.report),
        Commands::Config => commands::show_config::show_config(&config, cli.report),
    }
}
