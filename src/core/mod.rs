//! Core functionality for pr-agent
//!
//! This module contains shared plumbing:
//! - Application configuration
//! - Git repository access
//! - The per-process application context

pub mod config;
pub mod context;
pub mod git;

pub use config::Config;
pub use context::AppContext;
pub use git::{GitCli, GitRepository};
