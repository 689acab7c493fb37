//! CLI argument definitions using clap
//!
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Skiff - Mirror supervisor snapshots into Dropbox
#[derive(Parser)]
#[command(name = "skiff")]
#[command(about = "Snapshot backup daemon for Dropbox", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the add-on options file
    #[arg(long, default_value = skiff_core::DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll and mirror snapshots forever (the default)
    Run,

    /// Run a single backup cycle and exit
    Once,

    /// Validate the Dropbox credential and exit
    Check,
}
