//! CLI command definitions using clap
//!
//! Defines the command structure for the `pr-agent` tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// pr-agent - PR template suggestions from git changes
///
/// Serves the MCP tools over stdio by default. The subcommands run the
/// same operations once and print JSON.
#[derive(Parser, Debug)]
#[command(name = "pr-agent", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: the per-user config location)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory inside the repository to analyze
    #[arg(long, global = true, env = "PR_AGENT_REPO", value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Directory of template records (default: built-in templates)
    #[arg(long, global = true, env = "PR_AGENT_TEMPLATES_DIR", value_name = "DIR")]
    pub templates_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the MCP tools over stdin/stdout
    Serve,

    /// Summarize changes against a base branch
    Analyze {
        /// Base reference (defaults to the configured base branch)
        #[arg(long, short)]
        base: Option<String>,

        /// Include the unified diff text
        #[arg(long)]
        diff: bool,

        /// Maximum diff lines to include
        #[arg(long, value_name = "N", allow_negative_numbers = true)]
        max_lines: Option<i64>,
    },

    /// List the available PR templates
    Templates,

    /// Rank PR templates for the current changes
    Suggest {
        /// Base reference (defaults to the configured base branch)
        #[arg(long, short)]
        base: Option<String>,

        /// Change type you already know (bug, feature, docs, ...)
        #[arg(long, short = 't', value_name = "TYPE")]
        change_type: Option<String>,

        /// Number of suggestions to show
        #[arg(short = 'n', long, value_name = "N")]
        top: Option<usize>,
    },

    /// Inspect configuration
    Config(ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration commands
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file location
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["pr-agent"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_analyze_flags() {
        let cli = Cli::try_parse_from([
            "pr-agent",
            "--repo",
            "/tmp/work",
            "analyze",
            "--base",
            "develop",
            "--diff",
            "--max-lines",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.repo, Some(PathBuf::from("/tmp/work")));
        match cli.command {
            Some(Commands::Analyze {
                base,
                diff,
                max_lines,
            }) => {
                assert_eq!(base.as_deref(), Some("develop"));
                assert!(diff);
                assert_eq!(max_lines, Some(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["pr-agent", "suggest", "-n", "3", "--templates-dir", "tpl"])
                .unwrap();
        assert_eq!(cli.templates_dir, Some(PathBuf::from("tpl")));
        assert!(matches!(cli.command, Some(Commands::Suggest { top: Some(3), .. })));
    }
}
