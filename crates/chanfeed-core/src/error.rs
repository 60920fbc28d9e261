use thiserror::Error;

/// Top-level error type for chanfeed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Error talking to the channel message source.
    #[error("channel error: {0}")]
    Channel(String),

    /// Post store read/write error.
    #[error("store error: {0}")]
    Store(String),

    /// Image download or upload error.
    #[error("image error: {0}")]
    Image(String),

    /// Snapshot publication error.
    #[error("publish error: {0}")]
    Publish(String),

    /// Notification endpoint error.
    #[error("notify error: {0}")]
    Notify(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
