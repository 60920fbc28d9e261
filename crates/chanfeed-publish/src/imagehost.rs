//! imgbb-shaped image host client.
//!
//! One multipart POST per image. Every failure path returns `None` — a post
//! without an image is still worth persisting, and the next run re-flags it
//! for another attempt.

use async_trait::async_trait;
use chanfeed_core::{config::ImageHostConfig, traits::ImageHost};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Client for the image host upload endpoint.
pub struct ImgbbClient {
    config: ImageHostConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    data: Option<UploadData>,
    error: Option<UploadError>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
}

#[derive(Debug, Deserialize)]
struct UploadError {
    message: Option<String>,
}

impl ImgbbClient {
    pub fn new(config: ImageHostConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ImageHost for ImgbbClient {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Option<String> {
        let part = match reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("image/jpeg")
        {
            Ok(part) => part,
            Err(e) => {
                warn!("image upload mime error ({filename}): {e}");
                return None;
            }
        };
        let form = reqwest::multipart::Form::new().part("image", part);

        let resp = match self
            .client
            .post(&self.config.endpoint)
            .query(&[("key", self.config.api_key.as_str())])
            .multipart(form)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("image upload request failed ({filename}): {e}");
                return None;
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!("image host returned {status} for {filename}: {body}");
            return None;
        }

        let body: UploadResponse = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("image host response parse failed ({filename}): {e}");
                return None;
            }
        };

        match body {
            UploadResponse {
                success: true,
                data: Some(data),
                ..
            } => Some(data.url),
            UploadResponse { error, .. } => {
                let message = error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "unknown error".into());
                warn!("image host rejected {filename}: {message}");
                None
            }
        }
    }
}
