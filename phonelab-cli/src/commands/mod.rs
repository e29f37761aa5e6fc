//! Command handlers -- one module per subcommand

pub mod config;
pub mod parse;
pub mod walk;

use std::path::Path;

use phonelab_logfile::WalkConfig;

use crate::cli::Commands;
use crate::error::CliError;
use crate::output::OutputWriter;

/// Route a parsed subcommand to its handler.
pub async fn dispatch(
    command: Commands,
    config_path: Option<&Path>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match command {
        Commands::Walk(args) => walk::execute(args, config_path, writer).await,
        Commands::Parse(args) => parse::execute(args, writer).await,
        Commands::Config(args) => config::execute(args, config_path, writer).await,
    }
}

/// Load the effective walker configuration.
///
/// With a path: file, then env overrides, then validation. Without: defaults plus env overrides.
pub fn load_walk_config(config_path: Option<&Path>) -> Result<WalkConfig, CliError> {
    match config_path {
        Some(path) => Ok(WalkConfig::load(path)?),
        None => {
            let mut config = WalkConfig::default();
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
    }
}
