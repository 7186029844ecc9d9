//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// railsync - purchase-history scraping and calendar synchronization
#[derive(Debug, Parser)]
#[command(name = "railsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "RAILSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands. Without one, `run` executes with its defaults.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch reservations from the portal and write them to a file
    Fetch {
        /// Output path for the reservation file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Sync a saved reservation file to the calendar
    Sync {
        /// Input reservation file
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Stop after the first insertion attempt
        #[arg(long)]
        debug: bool,

        /// Skip the purge pass
        #[arg(long)]
        no_clear: bool,

        /// Target calendar name override
        #[arg(long)]
        calendar: Option<String>,
    },

    /// Fetch then sync in one pass
    Run {
        /// Stop after the first insertion attempt
        #[arg(long)]
        debug: bool,

        /// Skip the purge pass
        #[arg(long)]
        no_clear: bool,
    },
}
