//! In-memory fakes for engine and server tests.

use async_trait::async_trait;
use chanfeed_core::{
    error::FeedError,
    message::{ChannelMessage, PhotoRef},
    post::{local_date, Post},
    traits::{ImageHost, MessageSource, Notifier, PostStore, SnapshotSink},
};
use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn tz8() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).unwrap()
}

/// Build a message dated midday (UTC+8) on `date`.
pub fn msg(id: i64, date: &str, text: &str, photo: bool) -> ChannelMessage {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    ChannelMessage {
        id,
        date: Utc.from_utc_datetime(&d.and_hms_opt(4, 0, 0).unwrap()),
        text: text.to_string(),
        photo: photo.then(|| PhotoRef {
            file_id: format!("file-{id}"),
        }),
    }
}

/// Message source serving a fixed, newest-first message list.
#[derive(Default)]
pub struct FakeSource {
    pub messages: Vec<ChannelMessage>,
    pub download_calls: AtomicUsize,
    pub fail_downloads: bool,
}

impl FakeSource {
    pub fn with_messages(mut messages: Vec<ChannelMessage>) -> Self {
        messages.sort_by_key(|m| std::cmp::Reverse(m.id));
        Self {
            messages,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MessageSource for FakeSource {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<ChannelMessage>, FeedError> {
        Ok(self.messages.iter().take(limit).cloned().collect())
    }

    async fn fetch_on(&self, day: NaiveDate) -> Result<Vec<ChannelMessage>, FeedError> {
        Ok(self
            .messages
            .iter()
            .filter(|m| local_date(m.date, tz8()) == day)
            .cloned()
            .collect())
    }

    async fn download_photo(&self, photo: &PhotoRef) -> Result<Vec<u8>, FeedError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_downloads {
            return Err(FeedError::Channel("download refused".into()));
        }
        Ok(photo.file_id.as_bytes().to_vec())
    }
}

/// In-memory post store with failure switches and a write counter.
#[derive(Default)]
pub struct FakeStore {
    pub posts: Mutex<HashMap<String, Post>>,
    pub upsert_calls: AtomicUsize,
    pub fail_load: bool,
    pub fail_upsert: bool,
}

impl FakeStore {
    pub fn with_posts(posts: Vec<Post>) -> Self {
        let map = posts.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            posts: Mutex::new(map),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PostStore for FakeStore {
    fn name(&self) -> &str {
        "fake"
    }

    async fn load_existing(&self) -> Result<HashMap<String, Post>, FeedError> {
        if self.fail_load {
            return Err(FeedError::Store("load refused".into()));
        }
        Ok(self.posts.lock().unwrap().clone())
    }

    async fn upsert_batch(&self, posts: &[Post]) -> Result<(), FeedError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_upsert {
            return Err(FeedError::Store("upsert refused".into()));
        }
        let mut map = self.posts.lock().unwrap();
        for post in posts {
            map.insert(post.id.clone(), post.clone());
        }
        Ok(())
    }

    async fn load_all_sorted(&self) -> Result<Vec<Post>, FeedError> {
        let mut all: Vec<Post> = self.posts.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(all)
    }
}

/// Image host that records upload filenames.
#[derive(Default)]
pub struct FakeHost {
    pub uploads: Mutex<Vec<String>>,
    pub fail_uploads: bool,
}

#[async_trait]
impl ImageHost for FakeHost {
    async fn upload(&self, _bytes: Vec<u8>, filename: &str) -> Option<String> {
        self.uploads.lock().unwrap().push(filename.to_string());
        if self.fail_uploads {
            return None;
        }
        Some(format!("https://img.example/{filename}"))
    }
}

/// Snapshot sink that records each published list.
#[derive(Default)]
pub struct FakeSink {
    pub published: Mutex<Vec<Vec<Post>>>,
    pub fail_publish: bool,
}

#[async_trait]
impl SnapshotSink for FakeSink {
    async fn publish(&self, posts: &[Post]) -> Result<String, FeedError> {
        if self.fail_publish {
            return Err(FeedError::Publish("publish refused".into()));
        }
        self.published.lock().unwrap().push(posts.to_vec());
        Ok("https://storage.example/posts.json".into())
    }
}

/// Notifier that records notified post ids.
#[derive(Default)]
pub struct FakeNotifier {
    pub notified: Mutex<Vec<String>>,
    pub fail_notify: bool,
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify_latest(&self, post: &Post) -> Result<(), FeedError> {
        if self.fail_notify {
            return Err(FeedError::Notify("trigger refused".into()));
        }
        self.notified.lock().unwrap().push(post.id.clone());
        Ok(())
    }
}
