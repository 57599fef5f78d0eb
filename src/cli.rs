// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fleetkeeper")]
#[command(about = "Blue/green fleet switching and right-sizing")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (discovered in the current directory by default)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new fleetkeeper.yml configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,

        /// Name of the blue fleet
        #[arg(long)]
        blue: Option<String>,

        /// Name of the green fleet
        #[arg(long)]
        green: Option<String>,
    },

    /// Report the health of the active environment
    Check,

    /// Switch traffic to the standby environment
    Switch {
        /// Break an existing switch lock
        #[arg(short, long)]
        force: bool,
    },

    /// Step the active fleet's instance class up or down
    Rightsize,

    /// Adjust the worker fleet to the current queue
    Capacity,

    /// Show the active environment and fleet capacities
    Status,
}
