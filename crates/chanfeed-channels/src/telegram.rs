//! Telegram channel source over a Bot API gateway.
//!
//! Reads channel history via `getChatHistory` and resolves photos via
//! `getFile` + file download. History access needs a self-hosted gateway
//! (the public Bot API only exposes it to admins of the chat); the wire
//! shapes are the standard Bot API ones.
//! Docs: <https://core.telegram.org/bots/api>

use async_trait::async_trait;
use chanfeed_core::{
    config::ChannelConfig,
    error::FeedError,
    message::{ChannelMessage, PhotoRef},
    post::local_date,
    traits::MessageSource,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::pacer::Pacer;

/// Messages requested per history page.
const PAGE_SIZE: usize = 100;

/// Telegram channel reader.
pub struct TelegramChannel {
    config: ChannelConfig,
    tz: FixedOffset,
    client: reqwest::Client,
    base_url: String,
    pacer: Pacer,
}

// --- Telegram API types ---

#[derive(Debug, Deserialize)]
struct TgResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    message_id: i64,
    /// Unix timestamp in seconds.
    date: i64,
    text: Option<String>,
    caption: Option<String>,
    photo: Option<Vec<TgPhotoSize>>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct TgPhotoSize {
    file_id: String,
    width: i64,
    height: i64,
    file_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TgFile {
    file_path: Option<String>,
}

impl TelegramChannel {
    /// Create a new channel reader from config.
    pub fn new(config: ChannelConfig, tz: FixedOffset) -> Self {
        let base_url = format!("{}/bot{}", config.gateway_url, config.bot_token);
        let pacer = Pacer::new(config.rate_limit_rps);
        Self {
            config,
            tz,
            client: reqwest::Client::new(),
            base_url,
            pacer,
        }
    }

    /// Fetch one page of channel history, newest first.
    ///
    /// `from_message_id = 0` starts at the most recent message; otherwise the
    /// page starts strictly below the given id.
    async fn history_page(
        &self,
        from_message_id: i64,
        limit: usize,
    ) -> Result<Vec<TgMessage>, FeedError> {
        self.pacer.pace().await;

        let url = format!("{}/getChatHistory", self.base_url);
        let body = serde_json::json!({
            "chat_id": self.config.channel,
            "from_message_id": from_message_id,
            "limit": limit,
        });

        let resp: TgResponse<Vec<TgMessage>> = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FeedError::Channel(format!("getChatHistory failed: {e}")))?
            .json()
            .await
            .map_err(|e| FeedError::Channel(format!("getChatHistory parse failed: {e}")))?;

        if !resp.ok {
            return Err(FeedError::Channel(format!(
                "getChatHistory rejected: {}",
                resp.description.unwrap_or_default()
            )));
        }
        Ok(resp.result.unwrap_or_default())
    }

    /// Walk history newest-first, feeding each raw message to `visit` until it
    /// returns `false` or history runs out.
    async fn walk_history<F>(&self, mut visit: F) -> Result<(), FeedError>
    where
        F: FnMut(&TgMessage) -> bool,
    {
        let mut from_message_id = 0;
        loop {
            let page = self.history_page(from_message_id, PAGE_SIZE).await?;
            if page.is_empty() {
                return Ok(());
            }
            for msg in &page {
                if !visit(msg) {
                    return Ok(());
                }
                from_message_id = msg.message_id;
            }
        }
    }
}

#[async_trait]
impl MessageSource for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<ChannelMessage>, FeedError> {
        let mut messages = Vec::new();
        self.walk_history(|raw| {
            if let Some(msg) = to_channel_message(raw) {
                messages.push(msg);
            }
            messages.len() < limit
        })
        .await?;
        info!(
            "fetched {} messages from {} (window {limit})",
            messages.len(),
            self.config.channel
        );
        Ok(messages)
    }

    async fn fetch_on(&self, day: NaiveDate) -> Result<Vec<ChannelMessage>, FeedError> {
        // Pass 1: count the day's messages so the second pass can report
        // progress against a known total.
        let tz = self.tz;
        let mut total = 0usize;
        self.walk_history(|raw| match message_day(raw, tz) {
            Some(d) if d > day => true,
            Some(d) if d == day => {
                total += 1;
                true
            }
            // Older than the window (or unparsable): stop.
            _ => false,
        })
        .await?;
        info!("channel {} has {total} messages on {day}", self.config.channel);

        // Pass 2: collect the window.
        let mut messages = Vec::new();
        self.walk_history(|raw| match message_day(raw, tz) {
            Some(d) if d > day => true,
            Some(d) if d == day => {
                if let Some(msg) = to_channel_message(raw) {
                    messages.push(msg);
                    if total > 0 {
                        debug!("day fetch progress: {}/{total}", messages.len());
                    }
                }
                true
            }
            _ => false,
        })
        .await?;
        Ok(messages)
    }

    async fn download_photo(&self, photo: &PhotoRef) -> Result<Vec<u8>, FeedError> {
        self.pacer.pace().await;

        // Step 1: getFile to obtain file_path.
        let url = format!("{}/getFile?file_id={}", self.base_url, photo.file_id);
        let resp: TgResponse<TgFile> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::Channel(format!("getFile failed: {e}")))?
            .json()
            .await
            .map_err(|e| FeedError::Channel(format!("getFile parse failed: {e}")))?;

        let file_path = resp
            .result
            .and_then(|f| f.file_path)
            .ok_or_else(|| FeedError::Channel("getFile returned no file_path".into()))?;

        // Step 2: download the actual file bytes.
        let download_url = format!(
            "{}/file/bot{}/{file_path}",
            self.config.gateway_url, self.config.bot_token
        );
        let bytes = self
            .client
            .get(&download_url)
            .send()
            .await
            .map_err(|e| FeedError::Channel(format!("file download failed: {e}")))?
            .bytes()
            .await
            .map_err(|e| FeedError::Channel(format!("file read failed: {e}")))?;

        Ok(bytes.to_vec())
    }
}

/// Map a raw gateway message to the engine's shape.
///
/// Returns `None` when the timestamp is unusable. Captions count as text;
/// Telegram sends multiple photo sizes and the last is the largest.
fn to_channel_message(raw: &TgMessage) -> Option<ChannelMessage> {
    let date = match DateTime::<Utc>::from_timestamp(raw.date, 0) {
        Some(ts) => ts,
        None => {
            warn!("message {} has invalid timestamp {}", raw.message_id, raw.date);
            return None;
        }
    };
    let text = raw
        .text
        .clone()
        .or_else(|| raw.caption.clone())
        .unwrap_or_default();
    let photo = raw
        .photo
        .as_ref()
        .and_then(|sizes| sizes.last())
        .map(|largest| PhotoRef {
            file_id: largest.file_id.clone(),
        });
    Some(ChannelMessage {
        id: raw.message_id,
        date,
        text,
        photo,
    })
}

/// Calendar day of a raw message in the configured offset.
fn message_day(raw: &TgMessage, tz: FixedOffset) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(raw.date, 0).map(|ts| local_date(ts, tz))
}
