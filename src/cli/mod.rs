//! CLI module for pr-agent
//!
//! Command definitions and the one-shot handlers. Each handler prints a
//! single pretty JSON document to stdout.

pub mod analyze;
pub mod commands;
pub mod config;
pub mod suggest;
pub mod templates;

pub use commands::{Cli, Commands};

use serde::Serialize;

use crate::error::Result;

/// Print `value` as pretty JSON on stdout
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
