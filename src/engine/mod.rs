//! The sync engine — one reconciliation run from fetch to notification.
//!
//! Load existing → fetch & diff → resolve images → batch upsert → republish
//! snapshot → trigger notification. Steps run strictly in order; a fatal
//! error in the load or upsert steps aborts before anything downstream is
//! touched, while per-image failures only cost that image.

pub mod diff;

#[cfg(test)]
pub mod testutil;


use chanfeed_core::{
    config::{FetchMode, SyncConfig},
    error::FeedError,
    post::Post,
    sanitize::upload_filename,
    traits::{ImageHost, MessageSource, Notifier, PostStore, SnapshotSink},
};
use chrono::{FixedOffset, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// What a run did, for logs and the CLI summary.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    /// Messages classified as needing creation or update.
    pub candidates: usize,
    /// Image URLs newly resolved this run.
    pub images_resolved: usize,
    /// Size of the full collection after the run.
    pub total_posts: usize,
    /// Whether a notification was delivered.
    pub notified: bool,
}

/// Orchestrates one reconciliation run against pluggable backends.
pub struct SyncEngine {
    mode: FetchMode,
    fetch_limit: usize,
    tz: FixedOffset,
    width: usize,
    source: Arc<dyn MessageSource>,
    store: Arc<dyn PostStore>,
    images: Arc<dyn ImageHost>,
    snapshot: Option<Arc<dyn SnapshotSink>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl SyncEngine {
    pub fn new(
        sync: &SyncConfig,
        source: Arc<dyn MessageSource>,
        store: Arc<dyn PostStore>,
        images: Arc<dyn ImageHost>,
        snapshot: Option<Arc<dyn SnapshotSink>>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            mode: sync.mode,
            fetch_limit: sync.fetch_limit,
            tz: sync.tz(),
            width: sync.id_pad_width,
            source,
            store,
            images,
            snapshot,
            notifier,
        }
    }

    /// Run one full reconciliation pass.
    pub async fn run(&self) -> Result<SyncOutcome, FeedError> {
        // Step 1: load the existing set. A failed read aborts the run so we
        // never reconcile against a partial view.
        let existing = self.store.load_existing().await?;
        info!(
            "loaded {} existing posts from {}",
            existing.len(),
            self.store.name()
        );

        // Step 2: fetch a bounded window and diff it against the index.
        let messages = match self.mode {
            FetchMode::Recent => self.source.fetch_recent(self.fetch_limit).await?,
            FetchMode::Today => {
                let today = Utc::now().with_timezone(&self.tz).date_naive();
                self.source.fetch_on(today).await?
            }
        };
        let candidates = diff::select_candidates(&messages, &existing, self.tz, self.width);

        // Steps 3–4: resolve images and build the posts to persist.
        let mut posts = Vec::with_capacity(candidates.len());
        let mut images_resolved = 0;
        for msg in &candidates {
            let id = diff::message_id(msg, self.tz, self.width);
            // Keep an already-resolved URL; only unresolved photos hit the host.
            let mut image = existing.get(&id).and_then(|prev| prev.image.clone());
            if image.is_none() {
                if let Some(photo) = &msg.photo {
                    match self.source.download_photo(photo).await {
                        Ok(bytes) => {
                            let date = msg.date.with_timezone(&self.tz).date_naive();
                            let filename = upload_filename(
                                &date.format("%Y-%m-%d").to_string(),
                                msg.id,
                                &msg.text,
                            );
                            match self.images.upload(bytes, &filename).await {
                                Some(url) => {
                                    info!("image resolved for {id}");
                                    images_resolved += 1;
                                    image = Some(url);
                                }
                                None => {
                                    warn!("image upload failed for {id}, persisting without image");
                                }
                            }
                        }
                        Err(e) => {
                            warn!("photo download failed for {id}, persisting without image: {e}");
                        }
                    }
                }
            }
            posts.push(Post::from_message(msg, self.tz, self.width, image));
        }

        // Candidates are ordered descending, so the first post is the newest
        // thing this run touched.
        let newest = posts.first().cloned();

        // Step 5: single atomic batch upsert. A failure here aborts before
        // the snapshot so we never publish state that is not durably stored.
        if posts.is_empty() {
            info!("nothing new to persist");
        } else {
            info!("upserting {} posts", posts.len());
            self.store.upsert_batch(&posts).await?;
        }

        // Step 6: regenerate the snapshot from the authoritative store, not
        // from this run's candidates.
        let all = self.store.load_all_sorted().await?;
        if let Some(sink) = &self.snapshot {
            sink.publish(&all).await?;
        }

        // Step 7: best-effort notification for the newest touched post.
        let mut notified = false;
        if let (Some(notifier), Some(post)) = (&self.notifier, &newest) {
            match notifier.notify_latest(post).await {
                Ok(()) => notified = true,
                Err(e) => warn!("notification failed (best-effort, run still succeeds): {e}"),
            }
        }

        Ok(SyncOutcome {
            candidates: candidates.len(),
            images_resolved,
            total_posts: all.len(),
            notified,
        })
    }
}
