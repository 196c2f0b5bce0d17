//! Configuration management commands.

use std::path::Path;

use crate::cli::ConfigCommand;
use crate::config::{load_config, render_config};
use crate::output::OutputFormat;

/// Runs a config command.
pub fn run_config(
    cmd: ConfigCommand,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> crate::CliResult<()> {
    match cmd {
        ConfigCommand::Show => show_config(config_path, format),
    }
}

/// Shows the effective configuration.
fn show_config(config_path: Option<&Path>, format: OutputFormat) -> crate::CliResult<()> {
    let config = load_config(config_path)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Table => {
            match config_path {
                Some(path) => println!("# {}", path.display()),
                None => println!("# from EIDAS_* environment"),
            }
            print!("{}", render_config(&config)?);
        }
    }
    Ok(())
}
