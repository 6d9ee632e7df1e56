// src/services/images.rs
// DOCUMENTATION: On-disk storage for uploaded place images
// PURPOSE: Accept png/jpeg uploads, hand out their paths, remove them on delete

use crate::errors::PlacesError;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Raw upload as received from the multipart body
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Image directory plus upload limits
#[derive(Debug, Clone)]
pub struct ImageStorage {
    dir: PathBuf,
    max_bytes: usize,
}

/// File extension for an accepted image content type
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpeg"),
        "image/jpg" => Some("jpg"),
        _ => None,
    }
}

/// A freshly written image that is deleted again when dropped, unless kept.
///
/// Covers both a failed create transaction and a request future dropped
/// before the transaction finished.
#[derive(Debug)]
#[must_use = "the file is removed when this guard is dropped"]
pub struct PendingImage {
    path: PathBuf,
    armed: bool,
}

impl PendingImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored path as recorded on a place
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Disarm the guard once the place referencing the file is committed
    pub fn keep(mut self) -> String {
        self.armed = false;
        self.path_string()
    }
}

impl Drop for PendingImage {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Drop cannot await
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::info!("Discarded uncommitted image {}", self.path.display()),
            Err(e) => log::warn!("Could not discard image {}: {}", self.path.display(), e),
        }
    }
}

impl ImageStorage {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Write `image` under a fresh name; the file lives only as long as the guard unless kept
    pub async fn store(&self, image: &UploadedImage) -> Result<PendingImage, PlacesError> {
        let ext = image
            .content_type
            .as_deref()
            .and_then(extension_for)
            .ok_or_else(|| PlacesError::ValidationError("Invalid mime type!".to_string()))?;

        if image.bytes.is_empty() {
            return Err(PlacesError::ValidationError(
                "Uploaded image is empty.".to_string(),
            ));
        }
        if image.bytes.len() > self.max_bytes {
            return Err(PlacesError::ValidationError(format!(
                "Image exceeds the {} byte limit.",
                self.max_bytes
            )));
        }

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            log::error!("Failed to create image dir {}: {}", self.dir.display(), e);
            PlacesError::Internal("Creating place failed, please try again.".to_string())
        })?;

        let path = self.dir.join(format!("{}.{}", Uuid::new_v4(), ext));
        tokio::fs::write(&path, &image.bytes).await.map_err(|e| {
            log::error!("Failed to write image {}: {}", path.display(), e);
            PlacesError::Internal("Creating place failed, please try again.".to_string())
        })?;

        log::debug!("Stored image {} ({} bytes)", path.display(), image.bytes.len());
        Ok(PendingImage { path, armed: true })
    }

    /// Best-effort delete; failures are logged and otherwise ignored
    pub async fn remove(&self, path: &str) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            log::warn!("Could not remove image {}: {}", path, e);
        }
    }

    /// Path of a stored file by bare name, None for anything that is not a plain file name
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        let is_plain = !file_name.is_empty()
            && !file_name.starts_with('.')
            && !file_name.contains(['/', '\\'])
            && !file_name.contains("..");

        is_plain.then(|| self.dir.join(file_name))
    }
}
