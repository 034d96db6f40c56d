//! Metadata records and output layout
//!
//! ```text
//! output/
//!   img/<n>.png
//!   metadata/<n>.json
//!   baseUri.txt
//!   report.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{LayermintError, Result};

/// One (trait_type, value) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

impl Attribute {
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

/// Per-item metadata JSON
///
/// Until the publish phase runs, `image` holds the local relative path
/// (`img/<n>.png`) instead of a content URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub image: String,
    pub attributes: Vec<Attribute>,
    pub name: String,
}

impl MetadataRecord {
    pub fn new(name_prefix: &str, edition: u32, image: String, attributes: Vec<Attribute>) -> Self {
        Self {
            image,
            attributes,
            name: format!("{} #{}", name_prefix, edition),
        }
    }

    /// Record whose image still points at the local file.
    pub fn pending(name_prefix: &str, edition: u32, attributes: Vec<Attribute>) -> Self {
        Self::new(
            name_prefix,
            edition,
            OutputLayout::relative_image_path(edition),
            attributes,
        )
    }

    pub fn is_published(&self, image_uri_prefix: &str) -> bool {
        self.image.starts_with(image_uri_prefix)
    }

    /// 4-space indented JSON.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(buf)
    }
}

/// Paths of everything a run writes
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image_dir(&self) -> PathBuf {
        self.root.join("img")
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join("metadata")
    }

    pub fn image_path(&self, edition: u32) -> PathBuf {
        self.image_dir().join(format!("{}.png", edition))
    }

    pub fn metadata_path(&self, edition: u32) -> PathBuf {
        self.metadata_dir().join(format!("{}.json", edition))
    }

    pub fn base_uri_path(&self) -> PathBuf {
        self.root.join("baseUri.txt")
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join("report.json")
    }

    pub fn relative_image_path(edition: u32) -> String {
        format!("img/{}.png", edition)
    }

    /// Create `img/` and `metadata/`.
    pub fn prepare(&self) -> Result<()> {
        for dir in [self.image_dir(), self.metadata_dir()] {
            fs::create_dir_all(&dir)
                .map_err(|e| LayermintError::DirectoryCreateError { path: dir, source: e })?;
        }
        Ok(())
    }

    pub fn write_image(&self, edition: u32, png: &[u8]) -> Result<PathBuf> {
        let path = self.image_path(edition);
        write_file(&path, png)?;
        Ok(path)
    }

    pub fn write_metadata(&self, edition: u32, record: &MetadataRecord) -> Result<PathBuf> {
        let path = self.metadata_path(edition);
        write_file(&path, &record.to_json()?)?;
        Ok(path)
    }

    pub fn read_metadata(&self, edition: u32) -> Result<MetadataRecord> {
        let path = self.metadata_path(edition);
        let content = fs::read_to_string(&path)
            .map_err(|e| LayermintError::FileReadError { path, source: e })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn write_base_uri(&self, base_uri: &str) -> Result<()> {
        write_file(&self.base_uri_path(), base_uri.as_bytes())
    }

    /// Editions with a `metadata/<n>.json` file, ascending.
    pub fn metadata_editions(&self) -> Result<Vec<u32>> {
        let mut editions: Vec<u32> = numbered_files(&self.metadata_dir(), "json")?
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        editions.sort_unstable();
        Ok(editions)
    }

    /// Remove every numbered image and metadata file and the base URI left
    /// by an earlier run. Other files are kept.
    pub fn clear_editions(&self) -> Result<usize> {
        let mut stale = numbered_files(&self.image_dir(), "png")?;
        stale.extend(numbered_files(&self.metadata_dir(), "json")?);
        let base_uri = self.base_uri_path();
        if base_uri.is_file() {
            stale.push((0, base_uri));
        }

        for (_, path) in &stale {
            fs::remove_file(path).map_err(|e| LayermintError::FileWriteError {
                path: path.clone(),
                source: e,
            })?;
        }
        Ok(stale.len())
    }
}

/// Files in `dir` named `<n>.<ext>`.
fn numbered_files(dir: &Path, ext: &str) -> Result<Vec<(u32, PathBuf)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| LayermintError::FileReadError {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }
        if let Some(n) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u32>().ok())
        {
            files.push((n, path.to_path_buf()));
        }
    }
    Ok(files)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| LayermintError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })
}
