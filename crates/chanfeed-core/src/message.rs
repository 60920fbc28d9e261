use chrono::{DateTime, Utc};

/// A message fetched from the channel source.
///
/// This is the narrow shape the sync engine works with; gateway-specific
/// fields are dropped at the channel boundary.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    /// Native numeric message id assigned by the source.
    pub id: i64,
    /// Message timestamp (UTC; converted to the configured offset for keying).
    pub date: DateTime<Utc>,
    /// Plain text content; empty if the message has none.
    pub text: String,
    /// Reference to an attached photo, if any.
    pub photo: Option<PhotoRef>,
}

/// Opaque handle to a photo on the source, resolvable to bytes via
/// [`crate::traits::MessageSource::download_photo`].
#[derive(Debug, Clone)]
pub struct PhotoRef {
    pub file_id: String,
}

impl ChannelMessage {
    /// Whether the message carries any content worth persisting.
    /// Service messages with neither text nor photo are skipped entirely.
    pub fn has_content(&self) -> bool {
        !self.text.is_empty() || self.photo.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str, photo: bool) -> ChannelMessage {
        ChannelMessage {
            id: 1,
            date: Utc::now(),
            text: text.to_string(),
            photo: photo.then(|| PhotoRef {
                file_id: "f".into(),
            }),
        }
    }

    #[test]
    fn test_has_content() {
        assert!(msg("hello", false).has_content());
        assert!(msg("", true).has_content());
        assert!(msg("hello", true).has_content());
        assert!(!msg("", false).has_content());
    }
}
