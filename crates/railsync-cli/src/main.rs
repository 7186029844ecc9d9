//! railsync CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use railsync_cli::cli::{Cli, Command};
use railsync_cli::config::AppConfig;
use railsync_cli::error::{CliError, CliResult};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = if let Some(ref path) = cli.config {
        AppConfig::load_from(path).map_err(CliError::Config)?
    } else {
        AppConfig::load().map_err(CliError::Config)?
    };

    match cli.command {
        Some(Command::Fetch { output }) => railsync_cli::commands::fetch::run(&config, output).await,
        Some(Command::Sync {
            input,
            debug,
            no_clear,
            calendar,
        }) => railsync_cli::commands::sync::run(&config, input, debug, no_clear, calendar).await,
        Some(Command::Run { debug, no_clear }) => {
            railsync_cli::commands::run::run(&config, debug, no_clear).await
        }
        None => railsync_cli::commands::run::run(&config, false, false).await,
    }
}
