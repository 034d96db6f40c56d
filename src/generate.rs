//! Generation loop
//!
//! Runs in two phases:
//! 1. Render: compose, render and save every edition locally. The metadata
//!    record points at the local image until it is published.
//! 2. Publish: upload each unpublished image, rewrite its metadata with the
//!    content URI, then upload the metadata folder for a base URI.
//!
//! A run starts by clearing editions left in the output directory, and its
//! publish phase only touches the editions it rendered. The standalone
//! [`publish`] reads whatever is on disk, so it can be re-run on its own to
//! resume after upload failures.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::catalog::LayerCatalog;
use crate::compose::Composer;
use crate::config::{GeneratorConfig, UploadConfig};
use crate::error::{LayermintError, Result};
use crate::metadata::{MetadataRecord, OutputLayout};
use crate::render::{LayerDraw, Renderer};
use crate::upload::Uploader;

/// What to do when a single item fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure, record it and continue with the next item
    #[default]
    SkipAndContinue,
    /// Stop the run with the item's error
    Abort,
}

/// Cooperative cancellation checked between items
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Stage an item failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Render,
    Save,
    Upload,
    Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub edition: u32,
    pub stage: Stage,
    pub reason: String,
}

/// Summary of a run, written to `report.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub requested: u32,
    pub rendered: Vec<u32>,
    pub published: Vec<u32>,
    pub failures: Vec<ItemFailure>,
    pub base_uri: Option<String>,
    pub cancelled: bool,
}

impl GenerationReport {
    fn start(requested: u32) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            requested,
            rendered: Vec::new(),
            published: Vec::new(),
            failures: Vec::new(),
            base_uri: None,
            cancelled: false,
        }
    }

    fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

/// Output of a finished edition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedItem {
    pub edition: u32,
    pub record: MetadataRecord,
    pub image_path: std::path::PathBuf,
}

/// Drives the render and publish phases for one configuration
pub struct Generator<'a> {
    config: &'a GeneratorConfig,
    composer: Composer<'a>,
    renderer: &'a dyn Renderer,
    layout: OutputLayout,
    policy: FailurePolicy,
    cancel: CancellationToken,
}

impl<'a> Generator<'a> {
    /// Fails before any work if the config is invalid or a layer has no
    /// elements.
    pub fn new(
        config: &'a GeneratorConfig,
        catalog: &'a LayerCatalog,
        renderer: &'a dyn Renderer,
    ) -> Result<Self> {
        config.validate()?;
        catalog.validate()?;
        let composer = Composer::new(catalog, &config.rarity_weights)?;
        Ok(Self {
            config,
            composer,
            renderer,
            layout: OutputLayout::new(config.output_root()),
            policy: config.failure_policy,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Run both phases. `uploader = None` stops after rendering.
    pub fn run<R: Rng + ?Sized>(
        &self,
        count: u32,
        rng: &mut R,
        uploader: Option<&dyn Uploader>,
    ) -> Result<GenerationReport> {
        let mut report = GenerationReport::start(count);

        self.render_phase(count, rng, &mut report)?;
        if let Some(uploader) = uploader {
            if !report.cancelled {
                let rendered = report.rendered.clone();
                publish_into(
                    &rendered,
                    &self.layout,
                    &self.config.upload,
                    uploader,
                    self.policy,
                    &self.cancel,
                    &mut report,
                )?;
            }
        }

        report.finish();
        write_report(&self.layout, &report)?;
        Ok(report)
    }

    fn render_phase<R: Rng + ?Sized>(
        &self,
        count: u32,
        rng: &mut R,
        report: &mut GenerationReport,
    ) -> Result<()> {
        self.layout.prepare()?;
        let stale = self.layout.clear_editions()?;
        if stale > 0 {
            debug!("Removed {} files from a previous run", stale);
        }
        info!(
            "Rendering {} items from {} layers into {}",
            count,
            self.composer.pools().count(),
            self.layout.root().display()
        );

        for edition in 1..=count {
            if self.cancel.is_cancelled() {
                warn!("Cancelled before #{}", edition);
                report.cancelled = true;
                break;
            }

            match self.render_item(edition, rng) {
                Ok(item) => {
                    info!("Created {} ({})", item.record.name, item.image_path.display());
                    report.rendered.push(edition);
                }
                Err((stage, e)) => handle_failure(self.policy, edition, stage, e, report)?,
            }
        }
        Ok(())
    }

    /// Compose, render and save one edition.
    pub fn render_item<R: Rng + ?Sized>(
        &self,
        edition: u32,
        rng: &mut R,
    ) -> std::result::Result<GeneratedItem, (Stage, LayermintError)> {
        let composition = self.composer.compose(edition, rng);
        let draws = LayerDraw::from_composition(&composition);

        let png = self
            .renderer
            .render(&draws, self.config.canvas.width, self.config.canvas.height)
            .map_err(|e| (Stage::Render, e))?;
        let image_path = self
            .layout
            .write_image(edition, &png)
            .map_err(|e| (Stage::Save, e))?;

        let record = MetadataRecord::pending(&self.config.name_prefix, edition, composition.attributes);
        self.layout
            .write_metadata(edition, &record)
            .map_err(|e| (Stage::Metadata, e))?;

        Ok(GeneratedItem {
            edition,
            record,
            image_path,
        })
    }
}

/// Publish phase over an existing output directory.
pub fn publish(
    layout: &OutputLayout,
    upload: &UploadConfig,
    uploader: &dyn Uploader,
    policy: FailurePolicy,
    cancel: &CancellationToken,
) -> Result<GenerationReport> {
    let editions = layout.metadata_editions()?;
    let mut report = GenerationReport::start(editions.len() as u32);
    publish_into(&editions, layout, upload, uploader, policy, cancel, &mut report)?;
    report.finish();
    write_report(layout, &report)?;
    Ok(report)
}

fn publish_into(
    editions: &[u32],
    layout: &OutputLayout,
    upload: &UploadConfig,
    uploader: &dyn Uploader,
    policy: FailurePolicy,
    cancel: &CancellationToken,
    report: &mut GenerationReport,
) -> Result<()> {
    info!("Publishing {} items via {}", editions.len(), uploader.name());

    let mut pending = 0usize;
    for &edition in editions {
        if cancel.is_cancelled() {
            warn!("Cancelled before publishing #{}", edition);
            report.cancelled = true;
            return Ok(());
        }

        match publish_item(layout, upload, uploader, edition) {
            Ok(true) => report.published.push(edition),
            Ok(false) => {}
            Err((stage, e)) => {
                pending += 1;
                handle_failure(policy, edition, stage, e, report)?;
            }
        }
    }

    if !upload.upload_metadata_folder {
        return Ok(());
    }
    if editions.is_empty() {
        warn!("Nothing to publish; skipping metadata folder upload");
        return Ok(());
    }
    if pending > 0 {
        warn!(
            "{} items are still unpublished; skipping metadata folder upload. Run publish again to retry",
            pending
        );
        return Ok(());
    }

    let published = uploader.upload_folder(&layout.metadata_dir()).and_then(|cid| {
        let base_uri = format!("{}{}/", upload.base_uri_prefix, cid);
        layout.write_base_uri(&base_uri)?;
        Ok(base_uri)
    });
    match published {
        Ok(base_uri) => {
            info!("Base URI: {}  (token URI = {}<id>.json)", base_uri, base_uri);
            report.base_uri = Some(base_uri);
        }
        Err(e) => {
            error!("Metadata folder publish failed: {}", e);
            if policy == FailurePolicy::Abort {
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Returns `Ok(false)` if the item was already published.
fn publish_item(
    layout: &OutputLayout,
    upload: &UploadConfig,
    uploader: &dyn Uploader,
    edition: u32,
) -> std::result::Result<bool, (Stage, LayermintError)> {
    let mut record = layout
        .read_metadata(edition)
        .map_err(|e| (Stage::Metadata, e))?;
    if record.is_published(&upload.image_uri_prefix) {
        return Ok(false);
    }

    let cid = uploader
        .upload(&layout.image_path(edition))
        .map_err(|e| (Stage::Upload, e))?;
    record.image = format!("{}{}", upload.image_uri_prefix, cid);
    layout
        .write_metadata(edition, &record)
        .map_err(|e| (Stage::Metadata, e))?;

    info!("Published {} -> {}", record.name, record.image);
    Ok(true)
}

fn handle_failure(
    policy: FailurePolicy,
    edition: u32,
    stage: Stage,
    err: LayermintError,
    report: &mut GenerationReport,
) -> Result<()> {
    error!("#{} failed during {:?}: {}", edition, stage, err);
    match policy {
        FailurePolicy::Abort => Err(err),
        FailurePolicy::SkipAndContinue => {
            report.failures.push(ItemFailure {
                edition,
                stage,
                reason: err.to_string(),
            });
            Ok(())
        }
    }
}

fn write_report(layout: &OutputLayout, report: &GenerationReport) -> Result<()> {
    let path = layout.report_path();
    let content = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, content).map_err(|e| LayermintError::FileWriteError { path, source: e })
}
