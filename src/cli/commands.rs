//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: drive the scheduler with the configured tasks
//! - config: print the effective configuration
//! - units: list the calendar units periodic tasks can use

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tickr - a tick-driven in-process task scheduler
#[derive(Parser, Debug)]
#[command(name = "tickr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the heartbeat with the configured tasks until killed, or for --seconds
    Run {
        /// Stop after this many seconds and print stats (without it, runs until killed and prints none)
        #[arg(short, long)]
        seconds: Option<u64>,

        /// Schedule a one-shot task this many milliseconds after start (repeatable)
        #[arg(long = "once", value_name = "DELAY_MS")]
        once: Vec<u64>,

        /// Override the heartbeat interval in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Print final execution stats as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as YAML
    Config,

    /// List calendar units
    Units,
}
