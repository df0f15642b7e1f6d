//! CLI module
//!
//! Command-line interface for the bridge.
//!
//! # Commands
//!
//! - `relay` - Turn new SMS into Todoist tasks and write the exports
//! - `export` - Write the text/JSON exports only
//! - `dump` - Save raw threads and messages for debugging
//! - `probe` - Call each text-thread endpoint once and save the responses
//! - `sections` - List the sections of a Todoist project

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
