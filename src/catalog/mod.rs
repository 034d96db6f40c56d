//! Layer Catalog
//!
//! Scans one directory per trait layer and turns each eligible file into an
//! [`Element`] with a parsed display name and [`RarityTier`]. The catalog is
//! built once at startup and is read-only afterwards.

mod rarity;

pub use rarity::{parse_file_name, ParsedName, RarityTier, RarityWeights, FALLBACK_WEIGHT};

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{GeneratorConfig, Position, Size};
use crate::error::{LayermintError, Result};

/// One selectable image within a layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// 1-based ordinal in directory listing order
    pub id: usize,
    /// Filename with extension and rarity suffix removed
    pub name: String,
    pub file_name: String,
    pub path: PathBuf,
    pub tier: RarityTier,
}

/// A trait category with its element pool
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: u32,
    pub name: String,
    pub source_dir: PathBuf,
    pub position: Position,
    pub size: Size,
    pub elements: Vec<Element>,
}

/// Scan `dir` for layer elements.
///
/// Files are taken in file-name order. Hidden files, subdirectories,
/// non-UTF-8 names and names with nothing left after stripping the rarity
/// suffix are skipped. An empty directory yields an empty list.
pub fn scan_elements(dir: &Path) -> Result<Vec<Element>> {
    let mut elements = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| LayermintError::CatalogError {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            warn!("Skipping non UTF-8 file name in {}", dir.display());
            continue;
        };
        if file_name.starts_with('.') {
            continue;
        }

        let Some(parsed) = parse_file_name(file_name) else {
            warn!("Skipping {}: no display name left after suffix", file_name);
            continue;
        };

        elements.push(Element {
            id: elements.len() + 1,
            name: parsed.display_name,
            file_name: file_name.to_string(),
            path: entry.path().to_path_buf(),
            tier: parsed.tier,
        });
    }

    Ok(elements)
}

/// Ordered collection of layers
#[derive(Debug, Clone)]
pub struct LayerCatalog {
    layers: Vec<Layer>,
}

impl LayerCatalog {
    pub fn new(mut layers: Vec<Layer>) -> Self {
        layers.sort_by_key(|l| l.id);
        Self { layers }
    }

    /// Build the catalog for every configured layer, ordered by layer id.
    pub fn load(config: &GeneratorConfig) -> Result<Self> {
        let mut layers = Vec::with_capacity(config.layers.len());

        for layer in &config.layers {
            let source_dir = config.layer_dir(layer);
            if !source_dir.is_dir() {
                return Err(LayermintError::CatalogError {
                    path: source_dir,
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "layer directory does not exist",
                    ),
                });
            }

            let elements = scan_elements(&source_dir)?;
            debug!(
                "Layer {} '{}': {} elements from {}",
                layer.id,
                layer.name,
                elements.len(),
                source_dir.display()
            );

            layers.push(Layer {
                id: layer.id,
                name: layer.name.clone(),
                source_dir,
                position: layer.position,
                size: config.layer_size(layer),
                elements,
            });
        }

        Ok(Self::new(layers))
    }

    /// Fail with `EmptyPool` for the first layer without elements.
    pub fn validate(&self) -> Result<()> {
        match self.layers.iter().find(|l| l.elements.is_empty()) {
            Some(layer) => Err(LayermintError::EmptyPool {
                layer: layer.name.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerConfig;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_scan_orders_and_parses() {
        let dir = TempDir::new().unwrap();
        for name in ["crown_ssr.png", "beanie.png", "cap_r.png", ".DS_Store", "_sr.png"] {
            touch(dir.path(), name);
        }
        fs::create_dir(dir.path().join("nested")).unwrap();

        let elements = scan_elements(dir.path()).unwrap();
        let summary: Vec<_> = elements
            .iter()
            .map(|e| (e.id, e.name.as_str(), e.tier))
            .collect();

        assert_eq!(
            summary,
            vec![
                (1, "beanie", RarityTier::Original),
                (2, "cap", RarityTier::Rare),
                (3, "crown", RarityTier::SuperSuperRare),
            ]
        );
        assert_eq!(elements[2].path, dir.path().join("crown_ssr.png"));
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(scan_elements(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = scan_elements(&dir.path().join("missing")).unwrap_err();
        assert_eq!(err.error_code(), "CATALOG_ERROR");
    }

    #[test]
    fn test_load_orders_by_id_and_detects_empty_pool() {
        let dir = TempDir::new().unwrap();
        let layers_dir = dir.path().join("layers");
        fs::create_dir_all(layers_dir.join("background")).unwrap();
        fs::create_dir_all(layers_dir.join("hat")).unwrap();
        touch(&layers_dir.join("background"), "blue.png");

        let config = GeneratorConfig {
            layers: vec![LayerConfig::new(2, "hat"), LayerConfig::new(1, "background")],
            ..Default::default()
        }
        .with_base_dir(dir.path());

        let catalog = LayerCatalog::load(&config).unwrap();
        let names: Vec<_> = catalog.layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["background", "hat"]);
        assert_eq!(catalog.layers()[0].size, Size { width: 1000, height: 1000 });

        match catalog.validate() {
            Err(LayermintError::EmptyPool { layer }) => assert_eq!(layer, "hat"),
            other => panic!("expected EmptyPool, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_layer_directory() {
        let dir = TempDir::new().unwrap();
        let config = GeneratorConfig::default().with_base_dir(dir.path());
        let err = LayerCatalog::load(&config).unwrap_err();
        assert!(err.is_fatal());
    }
}
