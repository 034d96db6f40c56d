//! Mock uploader for pipeline testing
//!
//! Hands out sequential content references and can be told to fail for
//! specific file names.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{ContentRef, Uploader};
use crate::error::{LayermintError, Result};

#[derive(Debug, Default)]
pub struct MockUploader {
    fail_on: HashSet<String>,
    fail_folder: bool,
    uploads: Mutex<Vec<PathBuf>>,
    folders: Mutex<Vec<PathBuf>>,
}

impl MockUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail uploads of files with this name (e.g. `"2.png"`).
    pub fn failing_on(mut self, file_name: &str) -> Self {
        self.fail_on.insert(file_name.to_string());
        self
    }

    pub fn failing_folder(mut self) -> Self {
        self.fail_folder = true;
        self
    }

    /// Files uploaded so far, in call order.
    pub fn uploads(&self) -> Vec<PathBuf> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }

    pub fn folders(&self) -> Vec<PathBuf> {
        self.folders.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl Uploader for MockUploader {
    fn name(&self) -> &str {
        "mock"
    }

    fn upload(&self, path: &Path) -> Result<ContentRef> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.fail_on.contains(&file_name) {
            return Err(LayermintError::UploadError {
                reason: format!("mock failure for {}", file_name),
            });
        }

        let mut uploads = self
            .uploads
            .lock()
            .map_err(|_| LayermintError::UploadError {
                reason: "mock state poisoned".to_string(),
            })?;
        uploads.push(path.to_path_buf());
        Ok(ContentRef::new(format!("QmMockFile{}", uploads.len())))
    }

    fn upload_folder(&self, dir: &Path) -> Result<ContentRef> {
        if self.fail_folder {
            return Err(LayermintError::UploadError {
                reason: "mock folder failure".to_string(),
            });
        }

        let mut folders = self
            .folders
            .lock()
            .map_err(|_| LayermintError::UploadError {
                reason: "mock state poisoned".to_string(),
            })?;
        folders.push(dir.to_path_buf());
        Ok(ContentRef::new(format!("QmMockFolder{}", folders.len())))
    }
}
