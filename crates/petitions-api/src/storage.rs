use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use petitions_types::api::UploadResponse;

/// 50 MB upload limit for evidence files
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file is empty")]
    Empty,

    #[error("file is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("invalid content type '{0}'")]
    InvalidContentType(String),

    #[error("storage rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("storage request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Client for a bucket-style object store (`/storage/v1/object/{bucket}/{path}`).
#[derive(Clone)]
pub struct ObjectStorage {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ProviderError {
    message: Option<String>,
}

impl ObjectStorage {
    pub fn new(base_url: &str, bucket: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, path)
    }

    /// Uploads one file as multipart form data and returns where it can be read.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        prefix: Option<&str>,
    ) -> Result<UploadResponse, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(StorageError::TooLarge {
                size: bytes.len(),
                limit: MAX_UPLOAD_SIZE,
            });
        }

        let unique_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(file_name));
        let path = format!("{}{}", normalize_prefix(prefix), unique_name);
        let size = bytes.len() as u64;
        let sha256 = hex::encode(Sha256::digest(&bytes));

        let part = Part::bytes(bytes)
            .file_name(unique_name.clone())
            .mime_str(content_type)
            .map_err(|_| StorageError::InvalidContentType(content_type.to_string()))?;
        let form = Form::new().part("file", part);

        let upload_url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        let response = self
            .client
            .post(&upload_url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ProviderError>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("Upload failed with status: {}", status.as_u16()));
            warn!("Storage rejected {}: {}", path, message);
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        info!("Uploaded {} ({} bytes)", path, size);

        Ok(UploadResponse {
            url: self.public_url(&path),
            path,
            file_name: unique_name,
            size,
            sha256,
        })
    }
}

/// Anything outside `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    if cleaned.is_empty() { "file".to_string() } else { cleaned }
}

/// Each segment sanitized, no empty or dot-only segments, trailing slash.
fn normalize_prefix(prefix: Option<&str>) -> String {
    let mut out = String::new();
    for segment in prefix.unwrap_or_default().split('/') {
        if segment.is_empty() || segment.chars().all(|c| c == '.') {
            continue;
        }
        out.push_str(&sanitize_file_name(segment));
        out.push('/');
    }
    out
}
