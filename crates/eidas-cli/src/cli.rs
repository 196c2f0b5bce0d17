//! CLI argument parsing.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// eIDAS CLI - Verifies eIDAS authentication responses.
#[derive(Debug, Parser)]
#[command(name = "eidas")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (TOML). Without it `EIDAS_*` variables are used.
    #[arg(short, long, env = "EIDAS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Enable debug logging of the pipeline stages.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify a captured SAMLResponse.
    Verify(VerifyArgs),

    /// Configuration management.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments of `eidas verify`.
#[derive(Debug, clap::Args)]
pub struct VerifyArgs {
    /// File holding the base64 SAMLResponse, or `-` for stdin.
    #[arg(short, long)]
    pub response: String,

    /// URL the response was received on (scheme, host and path).
    #[arg(short, long)]
    pub endpoint: String,

    /// Treat the input as an `application/x-www-form-urlencoded` body.
    #[arg(long)]
    pub form: bool,

    /// Relay state received with the response.
    #[arg(long)]
    pub relay_state: Option<String>,

    /// Verify as of this RFC 3339 instant instead of the current time.
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
}
