//! Pinata pinning service uploader
//!
//! Talks to `POST {api_url}/pinning/pinFileToIPFS` with multipart bodies.
//! Folder uploads send every file under a `<folder>/<file>` name so Pinata
//! pins them as one directory.

use std::path::Path;

use serde::Deserialize;
#[cfg(feature = "pinata")]
use tracing::info;

use super::{ContentRef, Uploader};
use crate::config::PinataCredentials;
use crate::error::{LayermintError, Result};

/// Response from Pinata
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
    #[serde(rename = "PinSize", default)]
    pin_size: u64,
}

#[cfg_attr(not(feature = "pinata"), allow(dead_code))]
pub struct PinataUploader {
    api_url: String,
    credentials: PinataCredentials,
    timeout_ms: u64,
    #[cfg(feature = "pinata")]
    client: reqwest::blocking::Client,
}

impl PinataUploader {
    #[cfg(feature = "pinata")]
    pub fn new(api_url: &str, credentials: PinataCredentials, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| LayermintError::UploadUnavailable {
                reason: e.to_string(),
            })?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            credentials,
            timeout_ms,
            client,
        })
    }

    #[cfg(not(feature = "pinata"))]
    pub fn new(_api_url: &str, _credentials: PinataCredentials, _timeout_ms: u64) -> Result<Self> {
        Err(LayermintError::UploadUnavailable {
            reason: "Pinata support not compiled. Build with --features pinata".to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/pinning/pinFileToIPFS", self.api_url)
    }

    /// Send a multipart form to Pinata
    #[cfg(feature = "pinata")]
    fn send(&self, form: reqwest::blocking::multipart::Form) -> Result<ContentRef> {
        let response = self
            .client
            .post(self.endpoint())
            .header("pinata_api_key", &self.credentials.api_key)
            .header("pinata_secret_api_key", &self.credentials.api_secret)
            .multipart(form)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    LayermintError::UploadTimeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    LayermintError::UploadError {
                        reason: format!("request to {} failed: {}", self.api_url, e),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LayermintError::UploadError {
                reason: format!("Pinata returned {}: {}", status, body),
            });
        }

        let pinned = response
            .json::<PinResponse>()
            .map_err(|e| LayermintError::UploadError {
                reason: format!("invalid response from Pinata: {}", e),
            })?;
        Ok(ContentRef::new(pinned.ipfs_hash))
    }

    #[cfg(feature = "pinata")]
    fn part(path: &Path, file_name: String) -> Result<reqwest::blocking::multipart::Part> {
        let bytes = std::fs::read(path).map_err(|e| LayermintError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(reqwest::blocking::multipart::Part::bytes(bytes).file_name(file_name))
    }
}

#[cfg(feature = "pinata")]
impl Uploader for PinataUploader {
    fn name(&self) -> &str {
        "pinata"
    }

    fn upload(&self, path: &Path) -> Result<ContentRef> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());
        let form = reqwest::blocking::multipart::Form::new().part("file", Self::part(path, file_name)?);

        let cid = self.send(form)?;
        info!("Pinned {} -> {}", path.display(), cid);
        Ok(cid)
    }

    fn upload_folder(&self, dir: &Path) -> Result<ContentRef> {
        let folder = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "folder".to_string());

        let files = super::folder_files(dir)?;
        if files.is_empty() {
            return Err(LayermintError::UploadError {
                reason: format!("folder {} is empty", dir.display()),
            });
        }

        let mut form = reqwest::blocking::multipart::Form::new();
        for file in &files {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            form = form.part("file", Self::part(file, format!("{}/{}", folder, name))?);
        }

        let cid = self.send(form)?;
        info!("Pinned folder {} ({} files) -> {}", dir.display(), files.len(), cid);
        Ok(cid)
    }
}

#[cfg(not(feature = "pinata"))]
impl Uploader for PinataUploader {
    fn name(&self) -> &str {
        "pinata"
    }

    fn upload(&self, _path: &Path) -> Result<ContentRef> {
        Err(LayermintError::UploadUnavailable {
            reason: format!("cannot reach {} without the pinata feature", self.endpoint()),
        })
    }

    fn upload_folder(&self, _dir: &Path) -> Result<ContentRef> {
        Err(LayermintError::UploadUnavailable {
            reason: format!("cannot reach {} without the pinata feature", self.endpoint()),
        })
    }
}

#[cfg(all(test, feature = "pinata"))]
mod tests {
    use super::*;

    fn credentials() -> PinataCredentials {
        PinataCredentials {
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        }
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let uploader = PinataUploader::new("https://api.pinata.cloud/", credentials(), 1_000).unwrap();
        assert_eq!(uploader.endpoint(), "https://api.pinata.cloud/pinning/pinFileToIPFS");
        assert_eq!(uploader.name(), "pinata");
    }

    #[test]
    fn test_parse_pin_response() {
        let json = r#"{"IpfsHash": "QmAbc", "PinSize": 123, "Timestamp": "2024-01-01T00:00:00Z"}"#;
        let parsed: PinResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.ipfs_hash, "QmAbc");
    }

    #[test]
    fn test_unreachable_host_is_upload_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("1.png");
        std::fs::write(&file, b"png").unwrap();

        // Port 9 (discard) on localhost is expected to refuse connections.
        let uploader = PinataUploader::new("http://127.0.0.1:9", credentials(), 2_000).unwrap();
        let err = uploader.upload(&file).unwrap_err();
        assert!(matches!(
            err,
            LayermintError::UploadError { .. } | LayermintError::UploadTimeout { .. }
        ));
    }
}
