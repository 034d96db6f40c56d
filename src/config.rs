//! Generator configuration
//!
//! Loaded from a JSON file. Relative paths resolve against the directory of
//! the config file. Pinata credentials are read from the environment and are
//! never part of the file.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::RarityWeights;
use crate::error::{LayermintError, Result};
use crate::generate::FailurePolicy;

/// Default config file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "layermint.json";

pub const PINATA_API_KEY_ENV: &str = "LAYERMINT_PINATA_API_KEY";
pub const PINATA_API_SECRET_ENV: &str = "LAYERMINT_PINATA_API_SECRET";

/// Output canvas dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// Top-left draw position of a layer on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

/// Draw size of a layer on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// One trait category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Render order; lower ids are drawn first
    pub id: u32,
    /// Trait type written to metadata
    pub name: String,
    /// Source directory; defaults to `<layers_dir>/<name>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub position: Position,
    /// Draw size; defaults to the canvas size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

impl LayerConfig {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            directory: None,
            position: Position::default(),
            size: None,
        }
    }
}

/// Which uploader to use when publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadProvider {
    Pinata,
    /// Derive content references locally from SHA-256 digests
    DryRun,
}

/// Publish phase settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub enabled: bool,
    pub provider: UploadProvider,
    pub api_url: String,
    pub timeout_ms: u64,
    /// Prefix for per-image URIs in metadata
    pub image_uri_prefix: String,
    /// Prefix for the collection base URI written to `baseUri.txt`
    pub base_uri_prefix: String,
    pub upload_metadata_folder: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: UploadProvider::Pinata,
            api_url: "https://api.pinata.cloud".to_string(),
            timeout_ms: 60_000,
            image_uri_prefix: "ipfs://".to_string(),
            base_uri_prefix: "https://ipfs.io/ipfs/".to_string(),
            upload_metadata_folder: true,
        }
    }
}

/// Pinata API credentials
#[derive(Clone)]
pub struct PinataCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl PinataCredentials {
    /// Read credentials from `LAYERMINT_PINATA_API_KEY` / `LAYERMINT_PINATA_API_SECRET`.
    pub fn from_env() -> Result<Self> {
        let read = |name: &str| {
            env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| LayermintError::UploadUnavailable {
                    reason: format!("environment variable {} is not set", name),
                })
        };
        Ok(Self {
            api_key: read(PINATA_API_KEY_ENV)?,
            api_secret: read(PINATA_API_SECRET_ENV)?,
        })
    }
}

impl std::fmt::Debug for PinataCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinataCredentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Full generator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of items to generate
    pub edition_size: u32,
    pub canvas: Canvas,
    #[serde(default = "default_layers_dir")]
    pub layers_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Metadata names are `<name_prefix> #<edition>`
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    #[serde(default)]
    pub rarity_weights: RarityWeights,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    pub layers: Vec<LayerConfig>,
    #[serde(default)]
    pub upload: UploadConfig,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub(crate) base_dir: PathBuf,
}

fn default_layers_dir() -> PathBuf {
    PathBuf::from("layers")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_name_prefix() -> String {
    "NFT".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let layers = [
            "background",
            "spine",
            "body",
            "face",
            "beard",
            "hat",
            "accessories",
            "clothes",
        ]
        .iter()
        .enumerate()
        .map(|(i, name)| LayerConfig::new(i as u32 + 1, name))
        .collect();

        Self {
            edition_size: 100,
            canvas: Canvas {
                width: 1000,
                height: 1000,
            },
            layers_dir: default_layers_dir(),
            output_dir: default_output_dir(),
            name_prefix: default_name_prefix(),
            rarity_weights: RarityWeights::default(),
            failure_policy: FailurePolicy::default(),
            layers,
            upload: UploadConfig::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl GeneratorConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| LayermintError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config: GeneratorConfig = serde_json::from_str(&content)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        config.validate()?;
        Ok(config)
    }

    /// Write this config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| LayermintError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Set the directory relative paths resolve against.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.edition_size == 0 {
            return Err(LayermintError::config("edition_size must be positive"));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(LayermintError::config("canvas dimensions must be positive"));
        }
        if self.layers.is_empty() {
            return Err(LayermintError::config("at least one layer is required"));
        }

        let zero = self.rarity_weights.zero_weight_tiers();
        if let Some(tier) = zero.first() {
            return Err(LayermintError::config(format!(
                "rarity weight for '{}' must be positive",
                tier
            )));
        }

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for layer in &self.layers {
            if layer.name.trim().is_empty() {
                return Err(LayermintError::config(format!(
                    "layer {} has an empty name",
                    layer.id
                )));
            }
            if !ids.insert(layer.id) {
                return Err(LayermintError::config(format!(
                    "duplicate layer id {}",
                    layer.id
                )));
            }
            if !names.insert(layer.name.as_str()) {
                return Err(LayermintError::config(format!(
                    "duplicate layer name '{}'",
                    layer.name
                )));
            }
            if let Some(size) = layer.size {
                if size.width == 0 || size.height == 0 {
                    return Err(LayermintError::config(format!(
                        "layer '{}' has a zero draw size",
                        layer.name
                    )));
                }
            }
        }

        if self.upload.enabled && self.upload.timeout_ms == 0 {
            return Err(LayermintError::config("upload.timeout_ms must be positive"));
        }

        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Source directory of a layer.
    pub fn layer_dir(&self, layer: &LayerConfig) -> PathBuf {
        match &layer.directory {
            Some(dir) => self.resolve(dir),
            None => self.resolve(&self.layers_dir).join(&layer.name),
        }
    }

    /// Draw size of a layer.
    pub fn layer_size(&self, layer: &LayerConfig) -> Size {
        layer.size.unwrap_or(Size {
            width: self.canvas.width,
            height: self.canvas.height,
        })
    }

    pub fn output_root(&self) -> PathBuf {
        self.resolve(&self.output_dir)
    }
}
