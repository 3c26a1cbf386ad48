//! uyuni-ldap-sync - Synchronize Uyuni users and roles from LDAP
//!
//! Provides commands for:
//! - Running a synchronization (or a dry run that only plans it)
//! - Showing and validating the configuration

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{config::ConfigCommand, sync::SyncCommand, Context};
use ldapsync_core::config::Config;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "uyuni-ldap-sync",
    version,
    about = "One-way synchronization of Uyuni users and roles from an LDAP directory"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Synchronize users and roles from the directory
    Sync(SyncCommand),
    /// View and check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// `-v` and `-vv` win over `RUST_LOG`, which wins over `logging.level`
fn log_filter(verbose: u8, config_level: &str) -> EnvFilter {
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

fn configured_level(config_path: &Path) -> String {
    Config::load(config_path)
        .map(|config| config.logging.level)
        .unwrap_or_else(|_| "info".to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    // Logs go to stderr so `--json` output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose, &configured_level(&config_path)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let context = Context {
        config_path,
        format: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        },
        quiet: cli.quiet,
    };

    let result = match &cli.command {
        Commands::Sync(cmd) => cmd.execute(&context).await,
        Commands::Config(cmd) => cmd.execute(&context).await,
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            context.formatter().error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
