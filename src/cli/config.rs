//! Configuration CLI command handlers

use crate::cli::commands::ConfigCommand;
use crate::core::config::Config;
use crate::error::Result;

/// Handle configuration commands
pub fn handle_config(command: ConfigCommand, config: &Config) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            print!("{}", config.to_toml()?);
        }
        ConfigCommand::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}
