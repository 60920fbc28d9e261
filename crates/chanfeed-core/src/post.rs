//! The canonical post record and its composite identifier.
//!
//! A composite id is `YYYY-MM-DD_NNNNN`: the message's calendar date in the
//! configured timezone, an underscore, and the native message id left-padded
//! with zeros. Lexicographic order of composite ids matches (date, native id)
//! order as long as every native id fits the padded width.

use crate::message::ChannelMessage;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default zero-pad width for the native message id.
///
/// Native ids with more digits than this produce a longer id string and break
/// lexicographic ordering against narrower ids. The sync engine warns when it
/// sees one; widen `id_pad_width` in config before the channel gets there.
pub const DEFAULT_ID_PAD_WIDTH: usize = 5;

/// A persisted post. The document key in the store and the element shape of
/// the published snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Composite identifier, unique within the collection.
    #[serde(default)]
    pub id: String,
    /// Calendar date in the configured timezone, `YYYY-MM-DD`.
    pub date: String,
    /// Plain text content; empty string if none.
    #[serde(default)]
    pub text: String,
    /// Durable URL to the externally hosted image, or null.
    #[serde(default)]
    pub image: Option<String>,
}

impl Post {
    /// Build a post from a channel message, with the image URL already
    /// resolved (or not).
    pub fn from_message(
        msg: &ChannelMessage,
        tz: FixedOffset,
        width: usize,
        image: Option<String>,
    ) -> Self {
        let date = local_date(msg.date, tz);
        if !fits_width(msg.id, width) {
            warn!(
                "native id {} exceeds pad width {width}; snapshot ordering is no longer purely lexicographic",
                msg.id
            );
        }
        Self {
            id: composite_id(date, msg.id, width),
            date: date.format("%Y-%m-%d").to_string(),
            text: msg.text.clone(),
            image,
        }
    }
}

/// Left-pad a native message id with zeros to a fixed width.
pub fn normalize_native_id(native_id: i64, width: usize) -> String {
    format!("{native_id:0width$}")
}

/// Calendar date of a UTC timestamp in the configured fixed offset.
pub fn local_date(ts: DateTime<Utc>, tz: FixedOffset) -> NaiveDate {
    ts.with_timezone(&tz).date_naive()
}

/// Build the composite id for a (date, native id) pair.
pub fn composite_id(date: NaiveDate, native_id: i64, width: usize) -> String {
    format!(
        "{}_{}",
        date.format("%Y-%m-%d"),
        normalize_native_id(native_id, width)
    )
}

/// Recover the (date, native id) pair from a composite id.
///
/// Splits on the last underscore, so it stays correct even if the date format
/// ever grows one. Returns `None` for malformed ids (legacy records).
pub fn split_composite_id(id: &str) -> Option<(NaiveDate, i64)> {
    let (date_str, raw) = id.rsplit_once('_')?;
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
    let native_id = raw.parse::<i64>().ok()?;
    Some((date, native_id))
}

/// Whether a native id fits the padded width without overflowing it.
pub fn fits_width(native_id: i64, width: usize) -> bool {
    normalize_native_id(native_id, width).len() == width
}

/// Legacy deduplication key for stores that predate composite ids:
/// the calendar date plus the first 50 characters of the trimmed text.
///
/// Collision-prone (two same-day posts with identical openings merge), kept
/// only to recognize old flat-file records that carry no id.
pub fn legacy_key(date: &str, text: &str) -> String {
    let prefix: String = text.trim().chars().take(50).collect();
    format!("{date}|{prefix}")
}
