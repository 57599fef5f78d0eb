// ABOUTME: Entry point for the fleetkeeper CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use fleetkeeper::config::Config;
use fleetkeeper::error::Result;
use fleetkeeper::output::{Output, OutputMode};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force, blue, green } => {
            let cwd = env::current_dir()?;
            commands::init(&cwd, blue.as_deref(), green.as_deref(), force, output)
        }
        Commands::Check => commands::check(load_config(config_path)?, output).await,
        Commands::Switch { force } => {
            commands::switch(load_config(config_path)?, force, output).await
        }
        Commands::Rightsize => commands::rightsize(load_config(config_path)?, output).await,
        Commands::Capacity => commands::capacity(load_config(config_path)?, output).await,
        Commands::Status => commands::status(load_config(config_path)?, output).await,
    }
}

/// `--config` when given, otherwise discovered in the working directory.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::discover(&env::current_dir()?),
    }
}
