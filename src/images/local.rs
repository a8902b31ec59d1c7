//! Filesystem-backed image store
//!
//! Files live at `<root>/<folder>/<name>.<ext>` and are served from
//! `<public_base_url>/<folder>/<name>.<ext>`.

use super::sniff::{extension, sniff};
use super::{ImageStore, StoredImage, UploadOptions};
use crate::error::{validation_error, AppError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

static PUBLIC_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9_-]+/)?[A-Za-z0-9_-]+$").expect("valid regex")
});

pub struct LocalImageStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Locate the stored file for a public id, whatever its extension
    async fn locate(&self, id: &str) -> Result<Option<PathBuf>, AppError> {
        if !PUBLIC_ID.is_match(id) {
            return Err(validation_error(format!("Invalid image id '{}'", id)));
        }

        let (folder, name) = match id.rsplit_once('/') {
            Some((folder, name)) => (self.root.join(folder), name),
            None => (self.root.clone(), id),
        };

        let mut entries = match tokio::fs::read_dir(&folder).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(&folder, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| storage_error(&folder, e))?
        {
            let path = entry.path();
            if path.file_stem().and_then(|s| s.to_str()) == Some(name) {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    fn describe(&self, id: &str, path: &Path, bytes: &[u8], fallback_format: Option<&str>) -> StoredImage {
        let header = sniff(bytes);
        let format = header
            .map(|h| h.format.to_string())
            .or_else(|| fallback_format.map(str::to_string))
            .unwrap_or_else(|| "bin".to_string());

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let url = match id.rsplit_once('/') {
            Some((folder, _)) => format!("{}/{}/{}", self.public_base_url, folder, file_name),
            None => format!("{}/{}", self.public_base_url, file_name),
        };

        StoredImage {
            url,
            id: id.to_string(),
            format,
            width: header.and_then(|h| h.width),
            height: header.and_then(|h| h.height),
            size: bytes.len() as u64,
        }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn upload(&self, bytes: Vec<u8>, options: UploadOptions) -> Result<StoredImage, AppError> {
        let id = format!("{}/{}", options.folder, options.public_id);
        if !PUBLIC_ID.is_match(&id) {
            return Err(validation_error(format!("Invalid image id '{}'", id)));
        }

        let mime_format = options
            .content_type
            .split('/')
            .nth(1)
            .map(|sub| sub.split(';').next().unwrap_or(sub).trim().to_ascii_lowercase());
        let format = sniff(&bytes)
            .map(|h| h.format.to_string())
            .or(mime_format)
            .unwrap_or_else(|| "bin".to_string());

        let folder = self.root.join(&options.folder);
        tokio::fs::create_dir_all(&folder)
            .await
            .map_err(|e| storage_error(&folder, e))?;

        let path = folder.join(format!("{}.{}", options.public_id, extension(&format)));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| storage_error(&path, e))?;

        let stored = self.describe(&id, &path, &bytes, Some(format.as_str()));
        info!(id = %stored.id, format = %stored.format, size = stored.size, "image stored");
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let Some(path) = self.locate(id).await? else {
            debug!(%id, "image not found for deletion");
            return Ok(false);
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(%id, "image deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage_error(&path, e)),
        }
    }

    async fn metadata(&self, id: &str) -> Result<Option<StoredImage>, AppError> {
        let Some(path) = self.locate(id).await? else {
            return Ok(None);
        };
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| storage_error(&path, e))?;
        let fallback = path.extension().and_then(|e| e.to_str());
        Ok(Some(self.describe(id, &path, &bytes, fallback)))
    }
}

fn storage_error(path: &Path, e: std::io::Error) -> AppError {
    AppError::Storage(format!("{}: {}", path.display(), e))
}
