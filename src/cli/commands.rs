//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// AgencyZoom SMS export and Todoist bridge
///
/// Settings are read from the environment and from a `.env` file in the
/// working directory.
#[derive(Parser, Debug)]
#[command(name = "az-sms-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format for command results
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a Todoist task for every new message
    Relay {
        /// Log the tasks instead of creating them
        #[arg(long)]
        dry_run: bool,

        /// Skip outbound messages
        #[arg(long)]
        inbound_only: bool,

        /// Create tasks through the sync endpoint in batches
        #[arg(long)]
        batch: bool,
    },

    /// Write the text and JSON exports without touching Todoist
    Export {
        /// Skip outbound messages
        #[arg(long)]
        inbound_only: bool,

        /// Directory for the export files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Save raw threads and messages for debugging
    Dump {
        /// Directory for the dump files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Also save every raw API page
        #[arg(long)]
        save_raw: bool,
    },

    /// Call each text-thread endpoint once and save the raw responses
    Probe {
        /// Directory for the probe files
        #[arg(short, long, default_value = "probe_out")]
        output_dir: PathBuf,

        /// Threads whose messages are fetched
        #[arg(long, default_value_t = 10)]
        sample_threads: usize,

        /// Also save every raw API page
        #[arg(long)]
        save_raw: bool,
    },

    /// List the sections of a Todoist project
    Sections {
        /// Todoist project id
        project_id: String,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one document per line)
    Json,
    /// Human-readable output
    Pretty,
}
