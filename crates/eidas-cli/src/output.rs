//! Output formatting utilities.

use colored::Colorize;
use eidas_saml::AuthenticationResult;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// One row of the attribute table.
#[derive(Debug, Tabled, Serialize)]
pub struct AttributeRow {
    /// Friendly name or URI.
    #[tabled(rename = "Attribute")]
    pub name: String,
    /// First value.
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Builds the attribute rows of a result.
#[must_use]
pub fn attribute_rows(result: &AuthenticationResult) -> Vec<AttributeRow> {
    result
        .attributes()
        .into_iter()
        .map(|(name, value)| AttributeRow { name, value })
        .collect()
}

/// Prints a verification result.
pub fn print_result(result: &AuthenticationResult, format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Table => print_result_table(result),
    }
    Ok(())
}

fn print_result_table(result: &AuthenticationResult) {
    let status = result.status();
    let Some(assertion) = result.assertion() else {
        warning(&format!(
            "Identity provider returned {}",
            status.status_code.value
        ));
        if let Some(sub) = status.status_code.sub_status_value() {
            println!("sub_status: {sub}");
        }
        if let Some(message) = &status.status_message {
            println!("message: {message}");
        }
        return;
    };

    success(&format!("Response {} verified", result.response_id()));
    println!("issuer: {}", assertion.issuer);
    if let Some(name_id) = assertion.name_id() {
        println!("subject: {name_id}");
    }
    if let Some(loa) = assertion.level_of_assurance() {
        println!("level_of_assurance: {loa}");
    }
    if let Some(relay_state) = result.relay_state() {
        println!("relay_state: {relay_state}");
    }

    let rows = attribute_rows(result);
    if !rows.is_empty() {
        println!();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }
}
