//! Snapshot publication to object storage (GCS-shaped JSON API).
//!
//! The full post list is serialized to a temp file, uploaded as one blob,
//! and marked publicly readable. The temp file is removed whether or not the
//! upload succeeds.

use async_trait::async_trait;
use chanfeed_core::{config::SnapshotConfig, error::FeedError, post::Post, traits::SnapshotSink};
use std::path::Path;
use tracing::{info, warn};

/// Serialize the ordered post list exactly as the published snapshot.
pub fn render(posts: &[Post]) -> Result<Vec<u8>, FeedError> {
    Ok(serde_json::to_vec_pretty(posts)?)
}

/// Publishes `posts.json` to an object storage bucket.
pub struct SnapshotPublisher {
    config: SnapshotConfig,
    client: reqwest::Client,
}

impl SnapshotPublisher {
    pub fn new(config: SnapshotConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Public URL of the published object.
    pub fn public_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_base, self.config.bucket, self.config.object_name
        )
    }

    async fn write_and_upload(&self, tmp: &Path, posts: &[Post]) -> Result<String, FeedError> {
        std::fs::write(tmp, render(posts)?)?;
        let bytes = std::fs::read(tmp)?;

        let upload_url = format!(
            "{}/upload/storage/v1/b/{}/o",
            self.config.api_base, self.config.bucket
        );
        let resp = self
            .client
            .post(&upload_url)
            .query(&[
                ("uploadType", "media"),
                ("name", self.config.object_name.as_str()),
            ])
            .bearer_auth(&self.config.access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(bytes)
            .send()
            .await
            .map_err(|e| FeedError::Publish(format!("snapshot upload failed: {e}")))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(FeedError::Publish(format!(
                "snapshot upload returned {status}: {body}"
            )));
        }

        // Mark the object publicly readable.
        let acl_url = format!(
            "{}/storage/v1/b/{}/o/{}/acl",
            self.config.api_base,
            self.config.bucket,
            urlencoding::encode(&self.config.object_name)
        );
        let resp = self
            .client
            .post(&acl_url)
            .bearer_auth(&self.config.access_token)
            .json(&serde_json::json!({"entity": "allUsers", "role": "READER"}))
            .send()
            .await
            .map_err(|e| FeedError::Publish(format!("make-public failed: {e}")))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(FeedError::Publish(format!(
                "make-public returned {status}: {body}"
            )));
        }

        Ok(self.public_url())
    }
}

#[async_trait]
impl SnapshotSink for SnapshotPublisher {
    async fn publish(&self, posts: &[Post]) -> Result<String, FeedError> {
        let tmp = std::env::temp_dir().join(format!(
            "chanfeed-snapshot-{}.json",
            std::process::id()
        ));
        let result = self.write_and_upload(&tmp, posts).await;
        if tmp.exists() {
            if let Err(e) = std::fs::remove_file(&tmp) {
                warn!("failed to remove temp snapshot {}: {e}", tmp.display());
            }
        }
        if let Ok(url) = &result {
            info!("published snapshot of {} posts at {url}", posts.len());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posts() -> Vec<Post> {
        vec![
            Post {
                id: "2024-03-05_00042".into(),
                date: "2024-03-05".into(),
                text: "new".into(),
                image: Some("https://img/42.jpg".into()),
            },
            Post {
                id: "2024-01-01_00010".into(),
                date: "2024-01-01".into(),
                text: "old".into(),
                image: None,
            },
        ]
    }

    #[test]
    fn test_render_preserves_order_and_shape() {
        let bytes = render(&posts()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr[0]["id"], "2024-03-05_00042");
        assert_eq!(arr[1]["id"], "2024-01-01_00010");
        assert!(arr[1]["image"].is_null());
    }

    #[test]
    fn test_public_url() {
        let publisher = SnapshotPublisher::new(SnapshotConfig {
            bucket: "my-bucket".into(),
            ..SnapshotConfig::default()
        });
        assert_eq!(
            publisher.public_url(),
            "https://storage.googleapis.com/my-bucket/posts.json"
        );
    }
}
