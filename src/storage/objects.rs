//! Binary object storage for uploaded images.

use async_trait::async_trait;
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const MAX_FILENAME_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectCategory {
    Avatars,
    Projects,
}

impl ObjectCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectCategory::Avatars => "avatars",
            ObjectCategory::Projects => "projects",
        }
    }
}

impl fmt::Display for ObjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ObjectStoreError {
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Unsupported content type '{0}', only images are accepted")]
    UnsupportedType(String),

    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A decoded `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn parse(raw: &str) -> Result<Self, ObjectStoreError> {
        let rest = raw
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| ObjectStoreError::InvalidDataUrl("missing 'data:' prefix".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ObjectStoreError::InvalidDataUrl("missing ',' separator".into()))?;

        let mut params = header.split(';');
        let content_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(ObjectStoreError::InvalidDataUrl(
                "only base64-encoded data URLs are supported".into(),
            ));
        }
        if !content_type.starts_with("image/") {
            return Err(ObjectStoreError::UnsupportedType(content_type));
        }

        let bytes = BASE64_STANDARD
            .decode(payload.trim())
            .map_err(|e| ObjectStoreError::InvalidDataUrl(e.to_string()))?;

        Ok(Self {
            content_type,
            bytes,
        })
    }
}

/// Where an uploaded object ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub path: String,
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores a data-URL encoded image under `{category}/{timestamp}_{filename}`.
    async fn put_data_url(
        &self,
        category: ObjectCategory,
        filename: &str,
        data_url: &str,
    ) -> Result<StoredObject, ObjectStoreError>;
}

/// Keeps only characters that are safe in a single path segment.
pub fn sanitize_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        return "upload".to_string();
    }
    cleaned.chars().take(MAX_FILENAME_LEN).collect()
}

/// Filesystem-backed object store; objects are served from `public_base_url`.
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put_data_url(
        &self,
        category: ObjectCategory,
        filename: &str,
        data_url: &str,
    ) -> Result<StoredObject, ObjectStoreError> {
        let decoded = DataUrl::parse(data_url)?;
        if decoded.bytes.len() > self.max_bytes {
            return Err(ObjectStoreError::TooLarge {
                size: decoded.bytes.len(),
                limit: self.max_bytes,
            });
        }

        let object_name = format!(
            "{}_{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize_filename(filename)
        );
        let dir = self.root.join(category.as_str());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&object_name), &decoded.bytes).await?;

        let path = format!("{}/{}", category, object_name);
        let url = format!("{}/{}", self.public_base_url, path);
        info!(%path, size = decoded.bytes.len(), "object stored");

        Ok(StoredObject {
            path,
            url,
            content_type: decoded.content_type,
            size: decoded.bytes.len(),
        })
    }
}
