//! Push-notification trigger.
//!
//! One POST to `{base_url}/send-daily-notification` describing the newest
//! post a run touched. Best-effort only: the caller logs failures and moves
//! on, since the posts themselves are already durably persisted.

use async_trait::async_trait;
use chanfeed_core::{config::NotifyConfig, error::FeedError, post::Post, traits::Notifier};
use serde_json::json;
use std::time::Duration;
use tracing::info;

/// Body shown when the post has no text.
const FALLBACK_BODY: &str = "Tap to see the latest post.";

/// Client for the notification trigger endpoint.
pub struct NotifyClient {
    config: NotifyConfig,
    client: reqwest::Client,
}

impl NotifyClient {
    pub fn new(config: NotifyConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Build the fixed-shape notification payload for a post.
    ///
    /// The deep link pins the front end to this exact post; `image` is null
    /// when the post has none.
    pub fn payload_for(&self, post: &Post) -> serde_json::Value {
        let body = if post.text.is_empty() {
            FALLBACK_BODY.to_string()
        } else {
            post.text.clone()
        };
        let url = format!(
            "{}/?post_id={}",
            self.config.front_base_url.trim_end_matches('/'),
            post.id
        );
        json!({
            "title": self.config.title,
            "body": body,
            "image": post.image,
            "url": url,
        })
    }
}

#[async_trait]
impl Notifier for NotifyClient {
    async fn notify_latest(&self, post: &Post) -> Result<(), FeedError> {
        let endpoint = format!(
            "{}/send-daily-notification",
            self.config.base_url.trim_end_matches('/')
        );
        let payload = self.payload_for(post);

        let resp = self
            .client
            .post(&endpoint)
            .json(&payload)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(|e| FeedError::Notify(format!("trigger request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(FeedError::Notify(format!(
                "trigger returned {status}: {body}"
            )));
        }

        info!("notification sent for {}", post.id);
        Ok(())
    }
}
