//! Error handling for Layermint
//!
//! Configuration-level errors are fatal and reported before any item is
//! generated. Per-item errors are handled by the generation failure policy.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Layermint operations
pub type Result<T> = std::result::Result<T, LayermintError>;

/// Main error type for Layermint operations
#[derive(Error, Debug)]
pub enum LayermintError {
    // Catalog Errors
    #[error("Cannot read layer directory {path}: {source}")]
    CatalogError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Layer '{layer}' has no eligible elements")]
    EmptyPool { layer: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Rendering Errors
    #[error("Render failed: {reason}")]
    RenderError {
        reason: String,
        #[source]
        source: Option<image::ImageError>,
    },

    // Upload Errors
    #[error("Upload failed: {reason}")]
    UploadError { reason: String },

    #[error("Upload timed out after {timeout_ms}ms")]
    UploadTimeout { timeout_ms: u64 },

    #[error("Uploader unavailable: {reason}")]
    UploadUnavailable { reason: String },

    // File Errors
    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory creation failed: {path}: {source}")]
    DirectoryCreateError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LayermintError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            LayermintError::CatalogError { .. } => "CATALOG_ERROR",
            LayermintError::EmptyPool { .. } => "EMPTY_POOL",
            LayermintError::InvalidConfig { .. } => "INVALID_CONFIG",
            LayermintError::RenderError { .. } => "RENDER_ERROR",
            LayermintError::UploadError { .. } => "UPLOAD_ERROR",
            LayermintError::UploadTimeout { .. } => "UPLOAD_TIMEOUT",
            LayermintError::UploadUnavailable { .. } => "UPLOAD_UNAVAILABLE",
            LayermintError::FileReadError { .. } => "FILE_READ_ERROR",
            LayermintError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            LayermintError::DirectoryCreateError { .. } => "DIRECTORY_CREATE_ERROR",
            LayermintError::Io(_) => "IO_ERROR",
            LayermintError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Configuration-level errors abort the run before any item is generated.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LayermintError::CatalogError { .. }
                | LayermintError::EmptyPool { .. }
                | LayermintError::InvalidConfig { .. }
                | LayermintError::UploadUnavailable { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            LayermintError::CatalogError { .. } => vec![
                "Check that every configured layer directory exists",
                "Layer directories default to <layers_dir>/<layer name>",
            ],
            LayermintError::EmptyPool { .. } => vec![
                "Add at least one PNG to the layer directory",
                "Hidden files and names like '_r.png' are ignored",
            ],
            LayermintError::UploadError { .. } | LayermintError::UploadTimeout { .. } => vec![
                "Local images and metadata were kept on disk",
                "Run 'layermint publish' to retry the uploads",
            ],
            LayermintError::UploadUnavailable { .. } => vec![
                "Set LAYERMINT_PINATA_API_KEY and LAYERMINT_PINATA_API_SECRET",
                "Use --dry-run to derive local content references instead",
            ],
            _ => vec![],
        }
    }

    pub(crate) fn render(reason: impl Into<String>) -> Self {
        LayermintError::RenderError {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        LayermintError::InvalidConfig {
            reason: reason.into(),
        }
    }
}
