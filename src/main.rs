//! pr-agent - PR template suggestions from git changes
//!
//! Run without arguments to serve the MCP tools over stdio, or use
//! subcommands for one-shot JSON output.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pr_agent::cli::commands::{Cli, Commands};
use pr_agent::cli::{analyze, config, suggest, templates};
use pr_agent::core::config::Config;
use pr_agent::core::context::AppContext;
use pr_agent::error::Result;
use pr_agent::server;

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries protocol messages
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = cli.templates_dir {
        cfg.templates_dir = Some(dir);
    }

    match cli.command {
        // Config commands don't need the catalog or a repository
        Some(Commands::Config(args)) => config::handle_config(args.command, &cfg),

        command => {
            let workdir = match cli.repo {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            let ctx = AppContext::load(cfg, workdir)?;

            match command {
                None | Some(Commands::Serve) => server::serve(&ctx).await,
                Some(Commands::Analyze {
                    base,
                    diff,
                    max_lines,
                }) => analyze::handle_analyze(&ctx, base, diff, max_lines).await,
                Some(Commands::Templates) => templates::handle_templates(&ctx),
                Some(Commands::Suggest {
                    base,
                    change_type,
                    top,
                }) => suggest::handle_suggest(&ctx, base, change_type, top).await,
                Some(Commands::Config(_)) => unreachable!(),
            }
        }
    }
}
