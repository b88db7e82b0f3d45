//! Application configuration management
//!
//! Handles loading settings from `config.toml`:
//! - Default base branch for comparisons
//! - Diff line cap and git timeout
//! - Template catalog location

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{PrAgentError, Result};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Branch compared against when the caller names none
    #[serde(default = "default_base_branch")]
    pub default_base_branch: String,

    /// Line cap applied to diff text when the caller names none
    #[serde(default = "default_max_diff_lines")]
    pub max_diff_lines: i64,

    /// Upper bound for a single git invocation, in seconds
    #[serde(default = "default_git_timeout_secs")]
    pub git_timeout_secs: u64,

    /// Directory of template records; built-in templates when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_max_diff_lines() -> i64 {
    500
}

fn default_git_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_base_branch: default_base_branch(),
            max_diff_lines: default_max_diff_lines(),
            git_timeout_secs: default_git_timeout_secs(),
            templates_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "pr-agent", "pr-agent")
            .ok_or_else(|| PrAgentError::Config("Could not determine config directory".into()))?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// Timeout for each git invocation
    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }

    /// Render as TOML for `config show`
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<()> {
        if self.default_base_branch.trim().is_empty() {
            return Err(PrAgentError::Config(
                "default_base_branch must not be empty".into(),
            ));
        }
        if self.git_timeout_secs == 0 {
            return Err(PrAgentError::Config(
                "git_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_base_branch, "main");
        assert_eq!(config.max_diff_lines, 500);
        assert_eq!(config.git_timeout(), Duration::from_secs(30));
        assert!(config.templates_dir.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_base_branch = \"develop\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_base_branch, "develop");
        assert_eq!(config.max_diff_lines, 500);
        assert_eq!(config.git_timeout_secs, 30);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "git_timeout_secs = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, PrAgentError::Config(_)));
    }

    #[test]
    fn test_malformed_file_is_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_diff_lines = \"many\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, PrAgentError::Toml(_)));
    }
}
