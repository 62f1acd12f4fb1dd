use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::warn;
use url::Url;

use super::{PhotoStorage, StorageError, UploadedPhoto};
use crate::config::StorageConfig;

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1/";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Signed image uploads to Cloudinary
pub struct CloudinaryPhotoStorage {
    client: reqwest::Client,
    upload_url: Url,
    api_key: String,
    api_secret: String,
    folder: Option<String>,
}

impl CloudinaryPhotoStorage {
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::with_api_base(config, DEFAULT_API_BASE)
    }

    pub fn with_api_base(config: &StorageConfig, api_base: &str) -> Result<Self, StorageError> {
        let c = &config.cloudinary;
        if c.cloud_name.is_empty() {
            return Err(StorageError::NotConfigured("CLOUDINARY_CLOUD_NAME"));
        }
        if c.api_key.is_empty() {
            return Err(StorageError::NotConfigured("CLOUDINARY_API_KEY"));
        }
        if c.api_secret.is_empty() {
            return Err(StorageError::NotConfigured("CLOUDINARY_API_SECRET"));
        }

        let base = if api_base.ends_with('/') { api_base.to_string() } else { format!("{api_base}/") };
        let upload_url = Url::parse(&base)
            .and_then(|u| u.join(&format!("{}/image/upload", c.cloud_name)))
            .map_err(|_| StorageError::NotConfigured("CLOUDINARY_CLOUD_NAME"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            upload_url,
            api_key: c.api_key.clone(),
            api_secret: c.api_secret.clone(),
            folder: c.folder.clone().filter(|f| !f.is_empty()),
        })
    }

    /// Signed parameters, sorted by key, joined as `k=v&k=v` with the secret
    /// appended, then sha256 hex.
    /// The client-supplied content type is advisory; one that does not parse is dropped
    fn file_part(photo: UploadedPhoto) -> Part {
        let UploadedPhoto { file_name, content_type, bytes } = photo;
        if let Some(content_type) = content_type {
            match Part::bytes(bytes.clone()).file_name(file_name.clone()).mime_str(&content_type) {
                Ok(part) => return part,
                Err(_) => warn!(%content_type, "Ignoring unparseable photo content type"),
            }
        }
        Part::bytes(bytes).file_name(file_name)
    }

    fn sign(params: &[(&str, String)], secret: &str) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let payload = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        hasher.update(secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl PhotoStorage for CloudinaryPhotoStorage {
    fn name(&self) -> &'static str {
        "cloudinary"
    }

    async fn save(&self, photo: UploadedPhoto) -> Result<String, StorageError> {
        let mut params = vec![("timestamp", chrono::Utc::now().timestamp().to_string())];
        if let Some(folder) = &self.folder {
            params.push(("folder", folder.clone()));
        }
        let signature = Self::sign(&params, &self.api_secret);

        let mut form = Form::new()
            .part("file", Self::file_part(photo))
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (k, v) in params {
            form = form.text(k, v);
        }

        let response = self.client.post(self.upload_url.clone()).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(StorageError::Remote { status: status.as_u16(), message });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;
        body.secure_url
            .ok_or_else(|| StorageError::InvalidResponse("missing secure_url".into()))
    }
}
