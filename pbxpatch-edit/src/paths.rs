//! Path-literal search anchored on token boundaries.
//!
//! A path matches only as a complete value: `a/Info.plist` never matches inside
//! `legacy/a/Info.plist` or `a/Info.plist.bak`, because `/` and `.` are not boundaries.

use crate::format::{needs_quotes, quote};

fn boundary_before(b: Option<u8>) -> bool {
    match b {
        None => true,
        Some(b) => b.is_ascii_whitespace() || matches!(b, b'"' | b'=' | b'(' | b',' | b';' | b'{'),
    }
}

fn boundary_after(b: Option<u8>) -> bool {
    match b {
        None => true,
        Some(b) => b.is_ascii_whitespace() || matches!(b, b'"' | b';' | b',' | b')' | b'}'),
    }
}

/// Byte offsets where `path` occurs as a whole value.
pub fn path_occurrences(text: &str, path: &str) -> Vec<usize> {
    if path.is_empty() {
        return Vec::new();
    }
    let bytes = text.as_bytes();
    text.match_indices(path)
        .map(|(i, _)| i)
        .filter(|&i| {
            boundary_before(i.checked_sub(1).map(|j| bytes[j]))
                && boundary_after(bytes.get(i + path.len()).copied())
        })
        .collect()
}

/// Replace whole-value occurrences of `old` with `new`. Returns the text and the count.
///
/// A bare occurrence whose replacement needs quoting is written quoted.
pub fn replace_path(text: &str, old: &str, new: &str) -> (String, usize) {
    let hits = path_occurrences(text, old);
    if hits.is_empty() {
        return (text.to_string(), 0);
    }
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for &i in &hits {
        out.push_str(&text[last..i]);
        let quoted = i > 0 && bytes[i - 1] == b'"';
        if !quoted && needs_quotes(new) {
            out.push_str(&quote(new));
        } else {
            out.push_str(new);
        }
        last = i + old.len();
    }
    out.push_str(&text[last..]);
    (out, hits.len())
}
