//! Team logo storage
//!
//! The image store is an opaque blob store: upload, delete and metadata
//! lookup. Upload constraints (single image, MIME type, size) are enforced
//! before anything reaches the store.

mod local;
mod sniff;

pub use local::LocalImageStore;

use crate::error::{validation_error, AppError};
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Folder all team logos are stored under
pub const LOGO_FOLDER: &str = "hackathon-logos";

/// Formats advertised to clients
pub const ALLOWED_FORMATS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static UNSAFE_ID_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("valid regex"));

/// Metadata of a stored image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub url: String,
    /// Public id, `<folder>/<name>`
    pub id: String,
    pub format: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Size in bytes
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub folder: String,
    pub public_id: String,
    /// Declared MIME type, used when the header is not recognized
    pub content_type: String,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, options: UploadOptions) -> Result<StoredImage, AppError>;

    /// Returns false when nothing was stored under `id`
    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    async fn metadata(&self, id: &str) -> Result<Option<StoredImage>, AppError>;
}

/// Constraints a logo upload must satisfy
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_bytes: usize,
}

impl UploadPolicy {
    pub fn check(&self, content_type: Option<&str>, size: usize) -> Result<(), AppError> {
        let is_image = content_type
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            return Err(validation_error("Invalid file type. Only images are allowed."));
        }
        if size == 0 {
            return Err(validation_error("No image file provided"));
        }
        if size > self.max_bytes {
            return Err(validation_error(format!(
                "File size too large. Maximum size is {}.",
                human_size(self.max_bytes)
            )));
        }
        Ok(())
    }

    pub fn info(&self) -> UploadInfo {
        UploadInfo {
            max_file_size: human_size(self.max_bytes),
            allowed_formats: ALLOWED_FORMATS.to_vec(),
            folder: LOGO_FOLDER,
        }
    }
}

/// Upload limits reported to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInfo {
    pub max_file_size: String,
    pub allowed_formats: Vec<&'static str>,
    pub folder: &'static str,
}

/// Public id for a team logo: sanitized team name plus a millisecond stamp
pub fn logo_public_id(team_name: &str) -> String {
    let underscored = WHITESPACE.replace_all(team_name.trim(), "_");
    let safe = UNSAFE_ID_CHARS.replace_all(&underscored, "");
    let base = if safe.is_empty() { "team" } else { safe.as_ref() };
    format!("{}_{}", base, Utc::now().timestamp_millis())
}

fn human_size(bytes: usize) -> String {
    const MB: usize = 1024 * 1024;
    if bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else {
        format!("{} bytes", bytes)
    }
}
