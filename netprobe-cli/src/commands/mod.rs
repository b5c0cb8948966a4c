//! Command handler modules for the CLI.

mod check;
mod completions;
mod describe;
mod scrape;

use std::path::Path;

use crate::cli::Commands;
use crate::error::CliError;
use crate::util::load_config;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(config_path: Option<&Path>, debug: bool, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Scrape { targets, format } => {
            let config = load_config(config_path, debug, &targets)?;
            scrape::cmd_scrape(&config, format)
        }
        Commands::Describe { targets } => {
            let config = load_config(config_path, debug, &targets)?;
            describe::cmd_describe(&config)
        }
        Commands::Check { targets } => {
            let config = load_config(config_path, debug, &targets)?;
            check::cmd_check(&config)
        }
        Commands::Completions { shell } => completions::cmd_completions(shell),
    }
}
