//! Candidate classification — the diff half of reconciliation.
//!
//! A fetched message becomes a candidate when it is content-bearing and
//! either unseen (new composite id) or stale (has a photo the persisted
//! record never got an image URL for). Everything else is left alone, which
//! is what makes repeated runs idempotent.

use chanfeed_core::{
    message::ChannelMessage,
    post::{composite_id, local_date, Post},
};
use chrono::FixedOffset;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Composite id of a message under the run's keying parameters.
pub fn message_id(msg: &ChannelMessage, tz: FixedOffset, width: usize) -> String {
    composite_id(local_date(msg.date, tz), msg.id, width)
}

/// Whether a message needs to be created or updated this run.
pub fn is_candidate(
    msg: &ChannelMessage,
    existing: &HashMap<String, Post>,
    tz: FixedOffset,
    width: usize,
) -> bool {
    if !msg.has_content() {
        return false;
    }
    match existing.get(&message_id(msg, tz, width)) {
        None => true,
        Some(prev) => msg.photo.is_some() && prev.image.is_none(),
    }
}

/// Filter fetched messages down to candidates, ordered by descending
/// composite id so the first element is the newest thing this run touches.
pub fn select_candidates(
    messages: &[ChannelMessage],
    existing: &HashMap<String, Post>,
    tz: FixedOffset,
    width: usize,
) -> Vec<ChannelMessage> {
    let mut candidates: Vec<ChannelMessage> = messages
        .iter()
        .filter(|msg| is_candidate(msg, existing, tz, width))
        .cloned()
        .collect();
    candidates.sort_by_key(|msg| Reverse(message_id(msg, tz, width)));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanfeed_core::message::PhotoRef;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn tz8() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn msg(id: i64, date: &str, text: &str, photo: bool) -> ChannelMessage {
        let d = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        ChannelMessage {
            id,
            // Midday in UTC+8, so the local date equals `date`.
            date: Utc.from_utc_datetime(&d.and_hms_opt(4, 0, 0).unwrap()),
            text: text.to_string(),
            photo: photo.then(|| PhotoRef {
                file_id: format!("file-{id}"),
            }),
        }
    }

    fn persisted(id: &str, image: Option<&str>) -> (String, Post) {
        (
            id.to_string(),
            Post {
                id: id.to_string(),
                date: id.split('_').next().unwrap_or_default().to_string(),
                text: "persisted".into(),
                image: image.map(String::from),
            },
        )
    }

    #[test]
    fn test_empty_messages_are_never_candidates() {
        let existing = HashMap::new();
        assert!(!is_candidate(
            &msg(1, "2024-01-01", "", false),
            &existing,
            tz8(),
            5
        ));
    }

    #[test]
    fn test_unseen_message_is_a_candidate() {
        let existing = HashMap::new();
        assert!(is_candidate(
            &msg(42, "2024-03-05", "hi", false),
            &existing,
            tz8(),
            5
        ));
    }

    #[test]
    fn test_seen_text_message_is_not_a_candidate() {
        // Existing store has the post; a text-only refetch must be a no-op.
        let existing: HashMap<_, _> = [persisted("2024-01-01_00010", None)].into();
        assert!(!is_candidate(
            &msg(10, "2024-01-01", "hello", false),
            &existing,
            tz8(),
            5
        ));
    }

    #[test]
    fn test_photo_without_stored_image_is_reflagged() {
        let existing: HashMap<_, _> = [persisted("2024-01-01_00010", None)].into();
        assert!(is_candidate(
            &msg(10, "2024-01-01", "hello", true),
            &existing,
            tz8(),
            5
        ));
    }

    #[test]
    fn test_photo_with_stored_image_is_left_alone() {
        let existing: HashMap<_, _> =
            [persisted("2024-01-01_00010", Some("https://img/10.jpg"))].into();
        assert!(!is_candidate(
            &msg(10, "2024-01-01", "hello", true),
            &existing,
            tz8(),
            5
        ));
    }

    #[test]
    fn test_candidates_are_ordered_newest_first() {
        let existing = HashMap::new();
        let messages = vec![
            msg(9, "2024-01-01", "a", false),
            msg(3, "2024-01-02", "b", false),
            msg(10, "2024-01-01", "c", false),
        ];
        let ids: Vec<String> = select_candidates(&messages, &existing, tz8(), 5)
            .iter()
            .map(|m| message_id(m, tz8(), 5))
            .collect();
        assert_eq!(
            ids,
            vec!["2024-01-02_00003", "2024-01-01_00010", "2024-01-01_00009"]
        );
    }
}
