//! Layermint CLI - Layered Collectible Image Generator
//!
//! Command-line interface for the Layermint generator.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use layermint::cli::commands::{self, GenerateOptions};
use layermint::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    info!("Layermint v{}", env!("CARGO_PKG_VERSION"));

    handle_command(cli.command)
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Generate {
            config,
            count,
            seed,
            no_upload,
            dry_run,
            fail_fast,
        } => {
            let options = GenerateOptions {
                count,
                seed,
                no_upload,
                dry_run,
                fail_fast,
            };
            commands::generate(&config, &options)
                .map_err(report_error)
                .with_context(|| format!("generate with {}", config.display()))
        }
        Commands::Publish {
            config,
            dry_run,
            fail_fast,
        } => commands::publish(&config, dry_run, fail_fast)
            .map_err(report_error)
            .with_context(|| format!("publish with {}", config.display())),
        Commands::Catalog { config } => commands::show_catalog(&config)
            .map_err(report_error)
            .with_context(|| format!("catalog for {}", config.display())),
        Commands::InitConfig { path, force } => {
            commands::init_config(&path, force).map_err(report_error)
        }
    }
}

fn report_error(err: layermint::LayermintError) -> anyhow::Error {
    for suggestion in err.recovery_suggestions() {
        eprintln!("  hint: {}", suggestion);
    }
    anyhow::Error::new(err)
}
