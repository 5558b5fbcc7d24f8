//! Highlighting of flagged words inside issue text.
//!
//! Words apply in the given order against the current, possibly
//! already-wrapped text, so overlapping words can nest or double-wrap.
//! That mirrors the service dashboards' long-standing display behavior
//! and is deliberately left as-is.

const MARK_OPEN: &str = "<mark>";
const MARK_CLOSE: &str = "</mark>";

/// Wrap every case-insensitive occurrence of each non-empty word in
/// highlight markers. Returns the text unchanged when `words` is empty.
///
/// Case folding is ASCII-only; non-ASCII characters match exactly.
pub fn wrap_matches(text: &str, words: &[String]) -> String {
    if words.is_empty() {
        return text.to_string();
    }

    let mut current = text.to_string();
    for word in words {
        if word.is_empty() {
            continue;
        }
        current = wrap_word(&current, word);
    }
    current
}

fn wrap_word(text: &str, word: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut from = 0;

    while let Some(start) = find_ci(text, from, word) {
        let end = start + word.len();
        out.push_str(&text[from..start]);
        out.push_str(MARK_OPEN);
        out.push_str(&text[start..end]);
        out.push_str(MARK_CLOSE);
        from = end;
    }
    out.push_str(&text[from..]);
    out
}

/// Byte-wise ASCII case-insensitive search starting at `from`.
fn find_ci(haystack: &str, from: usize, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let ned = needle.as_bytes();
    if ned.is_empty() || hay.len() < from + ned.len() {
        return None;
    }

    for i in from..=hay.len() - ned.len() {
        if !haystack.is_char_boundary(i) || !haystack.is_char_boundary(i + ned.len()) {
            continue;
        }
        if hay[i..i + ned.len()].eq_ignore_ascii_case(ned) {
            return Some(i);
        }
    }
    None
}
