//! parsekit CLI - run, scaffold and hot-reload parser units

mod cli;
mod commands;
mod error;
mod output;
mod session;

use clap::Parser;
use cli::{Cli, Commands};
pub use error::CliError;
use parsekit_plugins::config::HostConfig;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    tracing::debug!("Source root: {}", config.source_root.display());

    match dispatch(cli.command, config) {
        // Already reported with its remediation
        Err(CliError::Resolve(_)) => std::process::exit(1),
        result => Ok(result?),
    }
}

fn dispatch(command: Commands, config: HostConfig) -> Result<(), CliError> {
    match command {
        Commands::Run { name, interactive } => {
            commands::run::run(config, name.as_deref(), interactive)?;
        }

        Commands::New { name } => {
            commands::new::run(&config, &name)?;
        }

        Commands::Units { name, json } => {
            commands::units::run(config, &name, json)?;
        }
    }

    Ok(())
}

/// Host configuration from file and environment, with `--root` applied last
fn load_config(cli: &Cli) -> Result<HostConfig, CliError> {
    let config = HostConfig::load(cli.config.as_deref())?;

    Ok(match &cli.root {
        Some(root) => config.with_source_root(root),
        None => config,
    })
}
