use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::FeedError;

/// Top-level chanfeed configuration.
///
/// Loaded once at startup from a TOML file plus environment overrides for
/// secrets, then passed by value into every component. Nothing reads
/// configuration globals past this point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub imagehost: ImageHostConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Channel source config — the Telegram Bot API gateway to read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Base URL of the Bot API gateway. The default public endpoint works for
    /// bot-visible chats; a self-hosted gateway is needed for history access.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    #[serde(default)]
    pub bot_token: String,
    /// Channel identifier (`@username` or numeric chat id).
    #[serde(default)]
    pub channel: String,
    /// Outbound request budget against the gateway, in requests per second.
    /// `0` disables pacing (tests).
    #[serde(default = "default_rate_limit_rps")]
    pub rate_limit_rps: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            bot_token: String::new(),
            channel: String::new(),
            rate_limit_rps: default_rate_limit_rps(),
        }
    }
}

/// Image host config (imgbb-shaped upload API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageHostConfig {
    #[serde(default = "default_imagehost_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    /// Per-upload timeout in seconds.
    #[serde(default = "default_upload_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            endpoint: default_imagehost_endpoint(),
            api_key: String::new(),
            timeout_secs: default_upload_timeout_secs(),
        }
    }
}

/// Which post-store backend holds the authoritative collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite document store (default).
    #[default]
    Sqlite,
    /// Flat `posts.json` file, merged in memory and rewritten atomically.
    File,
}

/// Post store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_file_path")]
    pub file_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            db_path: default_db_path(),
            file_path: default_file_path(),
        }
    }
}

/// Published-snapshot config (object storage, GCS-shaped JSON API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_storage_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "default_object_name")]
    pub object_name: String,
    #[serde(default)]
    pub access_token: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: default_storage_api_base(),
            bucket: String::new(),
            object_name: default_object_name(),
            access_token: String::new(),
        }
    }
}

/// Push-notification trigger config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Base URL of the notification service; the trigger endpoint is
    /// `{base_url}/send-daily-notification`.
    #[serde(default)]
    pub base_url: String,
    /// Base URL of the front end; deep links are `{front_base_url}/?post_id=…`.
    #[serde(default)]
    pub front_base_url: String,
    #[serde(default = "default_notify_title")]
    pub title: String,
    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: String::new(),
            front_base_url: String::new(),
            title: default_notify_title(),
            timeout_secs: default_notify_timeout_secs(),
        }
    }
}

/// Which fetch window a sync run covers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// The most recent `fetch_limit` messages regardless of date (default).
    #[default]
    Recent,
    /// Only messages dated today in the configured timezone.
    Today,
}

/// Reconciliation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub mode: FetchMode,
    /// Message window for [`FetchMode::Recent`]; generous so a backlog of
    /// several days still fits.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    /// Zero-pad width for native ids inside composite ids.
    #[serde(default = "default_id_pad_width")]
    pub id_pad_width: usize,
    /// Fixed offset, in hours, that post dates are keyed in.
    #[serde(default = "default_tz_offset_hours")]
    pub tz_offset_hours: i32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::default(),
            fetch_limit: default_fetch_limit(),
            id_pad_width: default_id_pad_width(),
            tz_offset_hours: default_tz_offset_hours(),
        }
    }
}

impl SyncConfig {
    /// The configured offset as a chrono [`FixedOffset`].
    ///
    /// Falls back to UTC for out-of-range values; [`Config::validate`]
    /// rejects those before any component gets here.
    pub fn tz(&self) -> FixedOffset {
        FixedOffset::east_opt(self.tz_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }
}

// --- Default value functions ---

fn default_gateway_url() -> String {
    "https://api.telegram.org".to_string()
}
fn default_rate_limit_rps() -> f64 {
    10.0
}
fn default_imagehost_endpoint() -> String {
    "https://api.imgbb.com/1/upload".to_string()
}
fn default_upload_timeout_secs() -> u64 {
    60
}
fn default_db_path() -> String {
    "chanfeed.db".to_string()
}
fn default_file_path() -> String {
    "posts.json".to_string()
}
fn default_storage_api_base() -> String {
    "https://storage.googleapis.com".to_string()
}
fn default_object_name() -> String {
    "posts.json".to_string()
}
fn default_notify_title() -> String {
    "Today's post is out".to_string()
}
fn default_notify_timeout_secs() -> u64 {
    30
}
fn default_fetch_limit() -> usize {
    500
}
fn default_id_pad_width() -> usize {
    crate::post::DEFAULT_ID_PAD_WIDTH
}
fn default_tz_offset_hours() -> i32 {
    8
}
fn default_true() -> bool {
    true
}

/// Load configuration from a TOML file, then overlay secret env vars.
///
/// A missing file falls back to defaults; [`Config::validate`] decides later
/// whether the result is actually runnable.
pub fn load(path: &str) -> Result<Config, FeedError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FeedError::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| FeedError::Config(format!("failed to parse config: {e}")))?
    } else {
        tracing::info!("config file not found at {}, using defaults", path.display());
        Config::default()
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Overlay secrets and deployment-specific values from the environment.
fn apply_env_overrides(config: &mut Config) {
    env_override(&mut config.channel.bot_token, "TELEGRAM_BOT_TOKEN");
    env_override(&mut config.channel.channel, "CHANNEL_USERNAME");
    env_override(&mut config.imagehost.api_key, "IMGBB_API_KEY");
    env_override(&mut config.snapshot.bucket, "STORAGE_BUCKET_NAME");
    env_override(&mut config.snapshot.access_token, "STORAGE_ACCESS_TOKEN");
    env_override(&mut config.notify.base_url, "CLOUD_FUNCTION_BASE_URL");
    env_override(&mut config.notify.front_base_url, "PWA_BASE_URL");
}

fn env_override(target: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var) {
        if !value.is_empty() {
            *target = value;
        }
    }
}

impl Config {
    /// Check that everything a sync run needs is present.
    ///
    /// Missing required configuration aborts before any state is touched.
    pub fn validate(&self) -> Result<(), FeedError> {
        let mut missing = Vec::new();
        if self.channel.bot_token.is_empty() {
            missing.push("channel.bot_token (or TELEGRAM_BOT_TOKEN)");
        }
        if self.channel.channel.is_empty() {
            missing.push("channel.channel (or CHANNEL_USERNAME)");
        }
        if self.imagehost.api_key.is_empty() {
            missing.push("imagehost.api_key (or IMGBB_API_KEY)");
        }
        if self.snapshot.enabled {
            if self.snapshot.bucket.is_empty() {
                missing.push("snapshot.bucket (or STORAGE_BUCKET_NAME)");
            }
            if self.snapshot.access_token.is_empty() {
                missing.push("snapshot.access_token (or STORAGE_ACCESS_TOKEN)");
            }
        }
        if self.notify.enabled {
            if self.notify.base_url.is_empty() {
                missing.push("notify.base_url (or CLOUD_FUNCTION_BASE_URL)");
            }
            if self.notify.front_base_url.is_empty() {
                missing.push("notify.front_base_url (or PWA_BASE_URL)");
            }
        }
        if !missing.is_empty() {
            return Err(FeedError::Config(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )));
        }

        if self.sync.id_pad_width == 0 || self.sync.id_pad_width > 18 {
            return Err(FeedError::Config(format!(
                "sync.id_pad_width must be between 1 and 18, got {}",
                self.sync.id_pad_width
            )));
        }
        if self.sync.tz_offset_hours.abs() > 23 {
            return Err(FeedError::Config(format!(
                "sync.tz_offset_hours must be within ±23, got {}",
                self.sync.tz_offset_hours
            )));
        }
        if self.channel.rate_limit_rps < 0.0 {
            return Err(FeedError::Config(
                "channel.rate_limit_rps must not be negative".into(),
            ));
        }
        Ok(())
    }
}
