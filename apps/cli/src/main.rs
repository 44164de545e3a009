//! dbauthd - short-lived database credentials with background rotation
//!
//! Hosts the authorization service over the in-process backend:
//! - `run` serves until interrupted, rotating on the configured cadence
//! - `authorize` issues credentials for one or more databases
//! - `rotate` runs a single rotation batch
//! - `config` prints the effective configuration

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{AppConfig, Overrides};

#[derive(Parser)]
#[command(name = "dbauthd", version, about = "Short-lived database credentials with background rotation")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "DBAUTH_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `dbauth_credential=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_parser = ["pretty", "compact", "json"])]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve until Ctrl+C, rotating credentials in the background
    Run {
        /// Rotation interval, e.g. `30s` or `5m`
        #[arg(long)]
        interval: Option<String>,
    },

    /// Issue credentials for the given databases
    Authorize {
        #[arg(required = true)]
        databases: Vec<String>,

        /// Print the password instead of `[REDACTED]`
        #[arg(long)]
        show_password: bool,
    },

    /// Run one rotation batch and print the report
    Rotate {
        /// Database to rotate, in addition to those configured
        #[arg(short, long = "database")]
        databases: Vec<String>,
    },

    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = Overrides {
        log_level: cli.log_level,
        log_format: cli.log_format,
        rotation_interval: match &cli.command {
            Command::Run { interval } => interval.clone(),
            _ => None,
        },
    };
    let config = AppConfig::load(cli.config.as_deref(), &overrides)?;

    let _log_guard = dbauth_log::init(config.log.clone())?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Configuration loaded");

    match cli.command {
        Command::Run { .. } => commands::run(config).await,
        Command::Authorize {
            databases,
            show_password,
        } => commands::authorize(config, databases, show_password).await,
        Command::Rotate { databases } => commands::rotate(config, databases).await,
        Command::Config => commands::show_config(&config),
    }
}
