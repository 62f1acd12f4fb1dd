//! Photo storage backends.
//!
//! Exactly one [`PhotoStorage`] implementation is selected at startup from
//! [`StorageConfig::enable_cloudinary`]. Callers resolve an optional upload
//! into a URL with [`resolve_photo`] before touching the store, so a failed
//! upload never leaves a record pointing at a missing photo.

pub mod cloudinary;
pub mod local;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ServerConfig, StorageConfig};

pub use cloudinary::CloudinaryPhotoStorage;
pub use local::LocalPhotoStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote storage rejected upload ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Invalid remote storage response: {0}")]
    InvalidResponse(String),

    #[error("Missing storage configuration: {0}")]
    NotConfigured(&'static str),
}

/// An uploaded file as received by the transport
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Persist the photo and return its permanent retrieval URL
    async fn save(&self, photo: UploadedPhoto) -> Result<String, StorageError>;
}

/// Turn an optional upload into an optional URL. `None` in, `None` out.
pub async fn resolve_photo(
    storage: &dyn PhotoStorage,
    photo: Option<UploadedPhoto>,
) -> Result<Option<String>, StorageError> {
    let Some(photo) = photo else {
        return Ok(None);
    };

    let size = photo.bytes.len();
    match storage.save(photo).await {
        Ok(url) => {
            tracing::info!(backend = storage.name(), size, "Stored photo at {}", url);
            Ok(Some(url))
        }
        Err(e) => {
            tracing::error!(backend = storage.name(), "Photo upload failed: {}", e);
            Err(e)
        }
    }
}

pub fn build_photo_storage(
    storage: &StorageConfig,
    server: &ServerConfig,
) -> Result<Arc<dyn PhotoStorage>, StorageError> {
    if storage.enable_cloudinary {
        Ok(Arc::new(CloudinaryPhotoStorage::from_config(storage)?))
    } else {
        Ok(Arc::new(LocalPhotoStorage::new(&storage.upload_dir, &server.public_url)))
    }
}
