//! CLI Module
//!
//! Command-line interface for the Layermint generator.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;

/// Layermint - layered collectible image generator
#[derive(Parser, Debug)]
#[command(name = "layermint")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the collection and optionally publish it
    #[command(name = "generate")]
    Generate {
        /// Path to the config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Override the configured edition size
        #[arg(short = 'n', long)]
        count: Option<u32>,

        /// Seed for reproducible selection
        #[arg(long)]
        seed: Option<u64>,

        /// Skip the publish phase
        #[arg(long)]
        no_upload: bool,

        /// Derive content references locally instead of uploading
        #[arg(long)]
        dry_run: bool,

        /// Abort on the first failing item
        #[arg(long)]
        fail_fast: bool,
    },

    /// Upload rendered items that are not yet published
    #[command(name = "publish")]
    Publish {
        /// Path to the config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Derive content references locally instead of uploading
        #[arg(long)]
        dry_run: bool,

        /// Abort on the first failing item
        #[arg(long)]
        fail_fast: bool,
    },

    /// Show layers, elements and selection probabilities
    #[command(name = "catalog")]
    Catalog {
        /// Path to the config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },

    /// Write a default config file
    #[command(name = "init-config")]
    InitConfig {
        /// Where to write the config
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
