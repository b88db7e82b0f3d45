//! Custom error types for pr-agent
//!
//! Every failure surfaced to the host carries a stable kind name so the
//! MCP layer can report it as structured data.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for pr-agent
#[derive(Error, Debug)]
pub enum PrAgentError {
    /// No git metadata at or above the working directory
    #[error("'{}' is not inside a git repository.\n\n  → Run the tool from a git working tree, or pass --repo <DIR>.", path.display())]
    NotARepository {
        /// Directory the lookup started from
        path: PathBuf,
    },

    /// The base reference does not resolve
    #[error("Reference '{0}' does not exist in this repository.\n\n  → Run 'git branch -a' to see available branches.")]
    UnknownReference(String),

    /// The git executable could not be run, or did not finish in time
    #[error("Cannot run '{command}': {reason}\n\n  → Make sure git is installed and on your PATH.")]
    ToolUnavailable { command: String, reason: String },

    /// git ran but exited with a failure we could not classify
    #[error("'{command}' failed: {stderr}")]
    GitCommand { command: String, stderr: String },

    /// A template record could not be parsed
    #[error("Invalid template '{source_name}': {reason}")]
    TemplateCatalog { source_name: String, reason: String },

    /// No templates were found at the catalog location
    #[error("No PR templates found in {location}.\n\n  → Template listings and suggestions will be empty.")]
    TemplateCatalogEmpty { location: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input from the caller
    #[error("{0}")]
    InvalidInput(String),

    /// Git library error
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    /// IO error
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization/deserialization error
    #[error("Configuration file is invalid: {0}")]
    Toml(String),
}

impl PrAgentError {
    /// Stable kind name reported to the host
    pub fn kind(&self) -> &'static str {
        match self {
            PrAgentError::NotARepository { .. } => "NotARepository",
            PrAgentError::UnknownReference(_) => "UnknownReference",
            PrAgentError::ToolUnavailable { .. } => "ToolUnavailable",
            PrAgentError::GitCommand { .. } => "GitCommandFailed",
            PrAgentError::TemplateCatalog { .. } => "TemplateCatalogInvalid",
            PrAgentError::TemplateCatalogEmpty { .. } => "TemplateCatalogEmpty",
            PrAgentError::Config(_) | PrAgentError::Toml(_) => "ConfigError",
            PrAgentError::InvalidInput(_) | PrAgentError::Json(_) => "InvalidInput",
            PrAgentError::Git(_) => "GitError",
            PrAgentError::Io(_) => "IoError",
        }
    }

    /// The reference, path or command the failure is about, if any
    pub fn reference(&self) -> Option<String> {
        match self {
            PrAgentError::NotARepository { path } => Some(path.display().to_string()),
            PrAgentError::UnknownReference(name) => Some(name.clone()),
            PrAgentError::ToolUnavailable { command, .. }
            | PrAgentError::GitCommand { command, .. } => Some(command.clone()),
            PrAgentError::TemplateCatalog { source_name, .. } => Some(source_name.clone()),
            PrAgentError::TemplateCatalogEmpty { location } => Some(location.clone()),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for PrAgentError {
    fn from(err: toml::de::Error) -> Self {
        PrAgentError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for PrAgentError {
    fn from(err: toml::ser::Error) -> Self {
        PrAgentError::Toml(err.to_string())
    }
}

/// Result type alias using PrAgentError
pub type Result<T> = std::result::Result<T, PrAgentError>;
