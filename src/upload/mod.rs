//! Content-addressed uploads
//!
//! This module provides:
//! - `Uploader` trait for pinning services
//! - Pinata implementation over HTTP (feature `pinata`)
//! - Dry-run implementation deriving content references from SHA-256
//! - Mock implementation for testing

mod dry_run;
mod mock;
mod pinata;

pub use dry_run::DryRunUploader;
pub use mock::MockUploader;
pub use pinata::PinataUploader;

use std::fmt;
use std::path::Path;

use crate::config::{PinataCredentials, UploadConfig, UploadProvider};
use crate::error::Result;

/// Content identifier returned by an uploader (e.g. an IPFS CID)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentRef(String);

impl ContentRef {
    pub fn new(cid: impl Into<String>) -> Self {
        Self(cid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A content-addressable storage service
pub trait Uploader: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Upload one file.
    fn upload(&self, path: &Path) -> Result<ContentRef>;

    /// Upload every regular file in `dir` as a single folder.
    fn upload_folder(&self, dir: &Path) -> Result<ContentRef>;
}

/// Build the uploader selected by `config.provider`.
///
/// `dry_run` forces [`DryRunUploader`] regardless of the provider.
pub fn from_config(config: &UploadConfig, dry_run: bool) -> Result<Box<dyn Uploader>> {
    if dry_run {
        return Ok(Box::new(DryRunUploader::new()));
    }
    match config.provider {
        UploadProvider::DryRun => Ok(Box::new(DryRunUploader::new())),
        UploadProvider::Pinata => {
            let credentials = PinataCredentials::from_env()?;
            Ok(Box::new(PinataUploader::new(
                &config.api_url,
                credentials,
                config.timeout_ms,
            )?))
        }
    }
}

/// Regular files directly inside `dir`, sorted by file name.
pub(crate) fn folder_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| crate::error::LayermintError::FileReadError {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
