//! Flat-file post store.
//!
//! The published artifact and the authoritative collection are the same
//! `posts.json`. A batch upsert merges in memory, re-sorts descending, and
//! rewrites the file through a rename so readers never observe a torn write.
//!
//! Records written before composite ids existed carry no `id`; those are
//! indexed under the legacy `(date, text-prefix)` key so their image URLs
//! still survive a re-scrape.

use async_trait::async_trait;
use chanfeed_core::{
    error::FeedError,
    post::{legacy_key, Post},
    traits::PostStore,
};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Post store backed by a single JSON file.
pub struct FlatFileStore {
    path: PathBuf,
}

impl FlatFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the file into a list, tolerating absence and malformed content.
    fn read_posts(&self) -> Result<Vec<Post>, FeedError> {
        if !self.path.exists() {
            info!("no existing file at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| FeedError::Store(format!("failed to read {}: {e}", self.path.display())))?;
        match serde_json::from_str::<Vec<Post>>(&content) {
            Ok(posts) => Ok(posts),
            Err(e) => {
                warn!(
                    "{} is not valid JSON ({e}); ignoring its contents",
                    self.path.display()
                );
                Ok(Vec::new())
            }
        }
    }

    /// Rewrite the whole file atomically (temp file + rename).
    fn write_posts(&self, posts: &[Post]) -> Result<(), FeedError> {
        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(posts)?;
        std::fs::write(&tmp, bytes)
            .map_err(|e| FeedError::Store(format!("failed to write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| FeedError::Store(format!("failed to replace {}: {e}", self.path.display())))?;
        Ok(())
    }

    fn index_key(post: &Post) -> String {
        if post.id.is_empty() {
            legacy_key(&post.date, &post.text)
        } else {
            post.id.clone()
        }
    }
}

#[async_trait]
impl PostStore for FlatFileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load_existing(&self) -> Result<HashMap<String, Post>, FeedError> {
        let posts = self.read_posts()?;
        let mut index = HashMap::with_capacity(posts.len());
        for post in posts {
            if post.id.is_empty() && post.date.is_empty() {
                warn!("skipping record with neither id nor date");
                continue;
            }
            index.insert(Self::index_key(&post), post);
        }
        Ok(index)
    }

    async fn upsert_batch(&self, posts: &[Post]) -> Result<(), FeedError> {
        if posts.is_empty() {
            return Ok(());
        }
        let mut merged: HashMap<String, Post> = self
            .read_posts()?
            .into_iter()
            .map(|p| (Self::index_key(&p), p))
            .collect();
        for post in posts {
            merged.insert(Self::index_key(post), post.clone());
        }
        let mut all: Vec<Post> = merged.into_values().collect();
        all.sort_by(|a, b| b.id.cmp(&a.id));
        self.write_posts(&all)
    }

    async fn load_all_sorted(&self) -> Result<Vec<Post>, FeedError> {
        let mut posts = self.read_posts()?;
        posts.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(posts)
    }
}
