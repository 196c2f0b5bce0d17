//! CLI command implementations.

mod config;
mod verify;

pub use config::run_config;
pub use verify::{read_inbound, run_verify, verify_inbound};
