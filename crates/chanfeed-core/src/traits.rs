use crate::{
    error::FeedError,
    message::{ChannelMessage, PhotoRef},
    post::Post,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Channel message source — where posts come from.
///
/// The only implementation talks to a Telegram Bot API gateway, but the sync
/// engine never sees past this trait, so tests run against an in-memory fake.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Human-readable source name.
    fn name(&self) -> &str;

    /// Fetch the most recent `limit` messages, newest first.
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<ChannelMessage>, FeedError>;

    /// Fetch every message whose timestamp falls on `day` in the configured
    /// timezone, newest first.
    async fn fetch_on(&self, day: NaiveDate) -> Result<Vec<ChannelMessage>, FeedError>;

    /// Download a photo's bytes into memory.
    async fn download_photo(&self, photo: &PhotoRef) -> Result<Vec<u8>, FeedError>;
}

/// Post store — the authoritative collection of persisted posts.
///
/// Two interchangeable backends implement this: the SQLite document store and
/// the flat `posts.json` file. The reconciliation algorithm is written once
/// against this seam and never duplicated per backend.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Read all persisted posts into an index keyed by composite id.
    /// Malformed records are logged and skipped; a failed read is fatal to
    /// the run so reconciliation never happens against a partial view.
    async fn load_existing(&self) -> Result<HashMap<String, Post>, FeedError>;

    /// Upsert all candidate posts in a single atomic batch keyed by id.
    async fn upsert_batch(&self, posts: &[Post]) -> Result<(), FeedError>;

    /// Read the entire collection ordered by descending composite id.
    async fn load_all_sorted(&self) -> Result<Vec<Post>, FeedError>;
}

/// External image host — turns photo bytes into a durable public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload image bytes under the given filename.
    ///
    /// Returns `None` on any failure; the caller persists the post without an
    /// image and a later run retries.
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Option<String>;
}

/// Published-snapshot sink — where the flattened post list goes.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Publish the full ordered post list, returning its public URL.
    async fn publish(&self, posts: &[Post]) -> Result<String, FeedError>;
}

/// Push-notification trigger for the newest post of a run.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Fire one notification describing `post`. Failures are the caller's to
    /// swallow; a missed notification never fails a run.
    async fn notify_latest(&self, post: &Post) -> Result<(), FeedError>;
}
