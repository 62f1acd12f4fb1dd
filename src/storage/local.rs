use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::{PhotoStorage, StorageError, UploadedPhoto};

/// Public route the upload directory is served under
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Writes photos under a publicly served directory
pub struct LocalPhotoStorage {
    upload_dir: PathBuf,
    public_url: String,
}

impl LocalPhotoStorage {
    pub fn new(upload_dir: impl AsRef<Path>, public_url: &str) -> Self {
        Self {
            upload_dir: upload_dir.as_ref().to_path_buf(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// `<uuid>_<original>` with anything outside `[A-Za-z0-9._-]` replaced
    fn stored_name(original: &str) -> String {
        let base = Path::new(original)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("photo");
        let cleaned: String = base
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
            .collect();
        let cleaned = cleaned.trim_start_matches('.');
        let cleaned = if cleaned.is_empty() { "photo" } else { cleaned };
        format!("{}_{}", Uuid::new_v4().simple(), cleaned)
    }
}

#[async_trait]
impl PhotoStorage for LocalPhotoStorage {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn save(&self, photo: UploadedPhoto) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;

        let file_name = Self::stored_name(&photo.file_name);
        let path = self.upload_dir.join(&file_name);
        tokio::fs::write(&path, &photo.bytes).await?;

        Ok(format!("{}{}/{}", self.public_url, UPLOADS_ROUTE, file_name))
    }
}
