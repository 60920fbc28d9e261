//! Manual operator utilities: re-push the newest published post, and re-sort
//! a local snapshot file in place.

use chanfeed_core::{config::Config, error::FeedError, post::Post, traits::Notifier};
use chanfeed_publish::{NotifyClient, SnapshotPublisher};
use std::time::Duration;
use tracing::info;

/// Fetch the published snapshot and fire a notification for its newest post.
///
/// Useful when a run persisted fine but the trigger call was missed.
pub async fn push_latest(config: &Config) -> Result<(), FeedError> {
    if config.snapshot.bucket.is_empty() {
        return Err(FeedError::Config(
            "snapshot.bucket is required to locate the published posts.json".into(),
        ));
    }
    if config.notify.base_url.is_empty() || config.notify.front_base_url.is_empty() {
        return Err(FeedError::Config(
            "notify.base_url and notify.front_base_url are required for push".into(),
        ));
    }

    let url = SnapshotPublisher::new(config.snapshot.clone()).public_url();
    info!("fetching published snapshot from {url}");
    let posts: Vec<Post> = reqwest::Client::new()
        .get(&url)
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(|e| FeedError::Publish(format!("snapshot fetch failed: {e}")))?
        .error_for_status()
        .map_err(|e| FeedError::Publish(format!("snapshot fetch rejected: {e}")))?
        .json()
        .await
        .map_err(|e| FeedError::Publish(format!("snapshot parse failed: {e}")))?;

    // The snapshot is ordered by descending id; the first element is newest.
    let latest = posts
        .first()
        .ok_or_else(|| FeedError::Publish("published snapshot is empty".into()))?;
    info!("pushing latest post {}", latest.id);

    NotifyClient::new(config.notify.clone())
        .notify_latest(latest)
        .await
}

/// Re-sort a local snapshot file by descending composite id, in place.
///
/// Returns the number of posts in the file.
pub fn sort_file(path: &str) -> Result<usize, FeedError> {
    let content = std::fs::read_to_string(path)?;
    let mut posts: Vec<Post> = serde_json::from_str(&content)?;
    posts.sort_by(|a, b| b.id.cmp(&a.id));
    std::fs::write(path, serde_json::to_vec_pretty(&posts)?)?;
    Ok(posts.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_file_orders_descending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "2024-01-01_00009", "date": "2024-01-01", "text": "a", "image": null},
                {"id": "2024-01-02_00003", "date": "2024-01-02", "text": "b", "image": null},
                {"id": "2024-01-01_00010", "date": "2024-01-01", "text": "c", "image": null}
            ]"#,
        )
        .unwrap();

        let count = sort_file(path.to_str().unwrap()).unwrap();
        assert_eq!(count, 3);

        let sorted: Vec<Post> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let ids: Vec<&str> = sorted.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["2024-01-02_00003", "2024-01-01_00010", "2024-01-01_00009"]
        );
    }

    #[test]
    fn test_sort_file_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(sort_file(path.to_str().unwrap()).is_err());
    }

    #[tokio::test]
    async fn test_push_requires_notify_config() {
        let mut config = Config::default();
        config.snapshot.bucket = "bucket".into();
        let err = push_latest(&config).await.unwrap_err();
        assert!(err.to_string().contains("notify.base_url"));
    }
}
