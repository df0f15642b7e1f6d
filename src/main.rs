// Allow common clippy pedantic lints
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unused_async)]

//! AgencyZoom SMS bridge CLI
//!
//! Command-line interface for exporting and relaying text messages

use az_sms_bridge::cli::{Cli, Runner};
use az_sms_bridge::config::{is_truthy, load_env_file};
use clap::Parser;

#[tokio::main]
async fn main() {
    // Logging is not up yet
    if let Err(e) = load_env_file(None) {
        eprintln!("Warning: {e}");
    }

    let cli = Cli::parse();
    let verbose = cli.verbose || std::env::var("DEBUG").is_ok_and(|v| is_truthy(&v));
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // Initialize logging; stdout carries command results
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
