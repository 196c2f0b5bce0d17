//! # eidas-cli
//!
//! Command-line verification of eIDAS authentication responses.
//!
//! This crate provides:
//! - `eidas verify` to run a captured `SAMLResponse` through the
//!   verification pipeline and print the verified attributes
//! - `eidas config show` to print the effective client configuration

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use error::{CliError, CliResult};
