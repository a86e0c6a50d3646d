//! Taskweave CLI entry point.

use clap::Parser;
use tracing::warn;

use taskweave::cli::{Cli, Commands};
use taskweave::infrastructure::{ConfigLoader, LoggerImpl};
use taskweave::services::{defaults, Defaults};

fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(err) => taskweave::cli::handle_error(err, cli.json),
    };
    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("Warning: logging disabled: {err:#}");
            None
        }
    };
    if defaults::install(Defaults::from_config(&config.defaults)).is_err() {
        warn!("process defaults were already installed");
    }

    let result = match cli.command {
        Commands::Inspect(args) => taskweave::cli::commands::inspect::execute(args, cli.json),
        Commands::Tools(args) => taskweave::cli::commands::tools::execute(args, cli.json),
        Commands::Call(args) => taskweave::cli::commands::call::execute(args, cli.json),
    };

    if let Err(err) = result {
        taskweave::cli::handle_error(err, cli.json);
    }
}
