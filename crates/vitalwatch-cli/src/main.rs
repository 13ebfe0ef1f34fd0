//! VitalWatch CLI - batch anomaly detection over physiological observations
//!
//! This CLI lets clinicians and integrators:
//! - Run JSON-lines observation files through the detection engine
//! - Persist per-subject baselines between runs
//! - Summarize and export per-subject anomaly history
//! - Inspect and validate configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod output;

use commands::process::ProcessArgs;
use config::AppConfig;
use error::CliResult;

/// VitalWatch CLI application
#[derive(Parser)]
#[command(name = "vitalwatch")]
#[command(about = "VitalWatch - Adaptive physiological anomaly detection", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "VITALWATCH_CONFIG")]
    config: Option<String>,

    /// Log level (overrides the configuration file)
    #[arg(long, env = "VITALWATCH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Process JSON-lines observations and report anomalies
    Process(ProcessArgs),

    /// Show the effective configuration
    Config,

    /// Validate a configuration file
    Check {
        /// Configuration file to validate
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    init_tracing(
        cli.log_level.as_deref().unwrap_or(&config.logging.level),
        cli.json_logs || config.logging.json,
    );

    match cli.command {
        Commands::Process(args) => commands::process::execute(args, &config, cli.output),
        Commands::Config => commands::config::show(&config, cli.output),
        Commands::Check { file } => commands::config::check(&file),
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
