//! pr-agent - PR template suggestions from git changes
//!
//! This library collects a summary of the changes between a base branch
//! and the working tree, ranks PR description templates against it, and
//! exposes both through an MCP stdio server and a small CLI.

pub mod analysis;
pub mod cli;
pub mod core;
pub mod error;
pub mod server;
pub mod templates;

pub use error::{PrAgentError, Result};
