/// Unicode-aware lower-casing shared by every case-insensitive transform.
#[must_use]
pub fn lower(text: &str) -> String {
    text.to_lowercase()
}

/// Reverse a string by scalar values, so suffix matches become prefix matches.
#[must_use]
pub fn reverse(text: &str) -> String {
    text.chars().rev().collect()
}

/// Expand a string into itself followed by every proper suffix.
///
/// "hello" → ["hello", "ello", "llo", "lo", "o"]; "" → [""].
#[must_use]
pub fn suffixes(text: &str) -> Vec<String> {
    let mut out = vec![text.to_string()];
    out.extend(
        text.char_indices()
            .skip(1)
            .map(|(offset, _)| text[offset..].to_string()),
    );

    out
}
