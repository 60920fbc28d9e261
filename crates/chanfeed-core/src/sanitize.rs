//! Filename sanitization for image-host uploads.
//!
//! The remote host keeps whatever name we send, so uploads carry a
//! human-readable `date_id_snippet.jpg` name that makes the hosted library
//! debuggable. The snippet is the message text with every run of
//! non-alphanumeric characters collapsed to a single underscore.

/// Collapse a message text into a short filename-safe snippet.
///
/// Unicode letters and digits survive; everything else (whitespace,
/// punctuation, path separators) collapses into single underscores. The
/// result is trimmed of underscores and capped at `max_chars` characters.
pub fn filename_snippet(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    let mut last_was_sep = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    let trimmed = out.trim_matches('_');
    trimmed.chars().take(max_chars).collect()
}

/// Build the upload filename for a message's photo.
pub fn upload_filename(date: &str, native_id: i64, text: &str) -> String {
    let snippet = filename_snippet(text, 30);
    if snippet.is_empty() {
        format!("{date}_{native_id}.jpg")
    } else {
        format!("{date}_{native_id}_{snippet}.jpg")
    }
}
