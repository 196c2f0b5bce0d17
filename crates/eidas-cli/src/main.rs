//! # eIDAS CLI
//!
//! Verifies eIDAS authentication responses from the command line.

#![forbid(unsafe_code)]

use clap::Parser;
use eidas_cli::{
    cli::{Cli, Command},
    commands::{run_config, run_verify},
    output::error,
};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "eidas_saml=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Command::Verify(args) => run_verify(args, config, cli.output),
        Command::Config(cmd) => run_config(cmd, config, cli.output),
    };

    if let Err(e) = result {
        error(&e.to_string());
        std::process::exit(1);
    }
}
