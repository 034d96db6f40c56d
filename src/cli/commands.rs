//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::catalog::LayerCatalog;
use crate::compose::Composer;
use crate::config::GeneratorConfig;
use crate::error::{LayermintError, Result};
use crate::generate::{self, CancellationToken, FailurePolicy, GenerationReport, Generator};
use crate::metadata::OutputLayout;
use crate::render::ImageRenderer;
use crate::upload;

/// Options for the `generate` command.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub count: Option<u32>,
    pub seed: Option<u64>,
    pub no_upload: bool,
    pub dry_run: bool,
    pub fail_fast: bool,
}

fn policy(config: &GeneratorConfig, fail_fast: bool) -> FailurePolicy {
    if fail_fast {
        FailurePolicy::Abort
    } else {
        config.failure_policy
    }
}

/// Render the collection and publish it unless disabled.
pub fn generate(config_path: &Path, options: &GenerateOptions) -> Result<()> {
    let config = GeneratorConfig::load(config_path)?;
    let count = options.count.unwrap_or(config.edition_size);
    if count == 0 {
        return Err(LayermintError::config("count must be positive"));
    }

    let catalog = LayerCatalog::load(&config)?;
    let renderer = ImageRenderer::new();
    let generator = Generator::new(&config, &catalog, &renderer)?
        .with_policy(policy(&config, options.fail_fast));

    let publish = config.upload.enabled && !options.no_upload;
    let uploader = if publish {
        Some(upload::from_config(&config.upload, options.dry_run)?)
    } else {
        info!("Publish phase disabled");
        None
    };

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let report = generator.run(count, &mut rng, uploader.as_deref())?;
    print_report(&report, generator.layout());
    Ok(())
}

/// Resume the publish phase over an existing output directory.
pub fn publish(config_path: &Path, dry_run: bool, fail_fast: bool) -> Result<()> {
    let config = GeneratorConfig::load(config_path)?;
    let layout = OutputLayout::new(config.output_root());
    let uploader = upload::from_config(&config.upload, dry_run)?;

    let report = generate::publish(
        &layout,
        &config.upload,
        uploader.as_ref(),
        policy(&config, fail_fast),
        &CancellationToken::new(),
    )?;
    print_report(&report, &layout);
    Ok(())
}

/// Print layers, elements and per-element probabilities.
pub fn show_catalog(config_path: &Path) -> Result<()> {
    let config = GeneratorConfig::load(config_path)?;
    let catalog = LayerCatalog::load(&config)?;

    for layer in catalog.layers() {
        if layer.elements.is_empty() {
            warn!("Layer '{}' has no elements", layer.name);
        }
    }
    let composer = Composer::new(&catalog, &config.rarity_weights)?;

    for (layer, pool) in composer.pools() {
        println!(
            "[{}] {} ({} elements, {})",
            layer.id,
            layer.name,
            layer.elements.len(),
            layer.source_dir.display()
        );
        for (i, element) in layer.elements.iter().enumerate() {
            println!(
                "    {:>3}  {:<24} {:<18} {:>6.2}%",
                element.id,
                element.name,
                element.tier,
                pool.probability(i) * 100.0
            );
        }
    }
    Ok(())
}

/// Write the default config to `path`.
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(LayermintError::config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    GeneratorConfig::default().save(path)?;
    println!("Config written: {}", path.display());
    Ok(())
}

fn print_report(report: &GenerationReport, layout: &OutputLayout) {
    println!("{:-<60}", "");
    println!("Requested:  {}", report.requested);
    println!("Rendered:   {}", report.rendered.len());
    println!("Published:  {}", report.published.len());
    if !report.failures.is_empty() {
        println!("Failures:   {}", report.failures.len());
        for failure in &report.failures {
            println!("    #{} {:?}: {}", failure.edition, failure.stage, failure.reason);
        }
    }
    if report.cancelled {
        println!("Run was cancelled");
    }
    if let Some(base_uri) = &report.base_uri {
        println!("Base URI:   {}", base_uri);
    }
    println!("Output:     {}", layout.root().display());
    println!("{:-<60}", "");
}
