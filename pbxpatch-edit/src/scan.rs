//! Lexical primitives over descriptor text.
//!
//! Every function works on byte offsets into UTF-8 text. Structural bytes (`{ } ( ) ; , = "`)
//! are ASCII, so byte offsets produced here always fall on char boundaries.

use crate::error::{MatchError, MatchResult};

/// Offset just past the string literal starting at `start` (which must be `"`).
pub fn skip_string(text: &str, start: usize) -> MatchResult<usize> {
    let bytes = text.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(MatchError::not_found_at("closing `\"` of string literal", start))
}

/// Offset just past the `/* ... */` comment starting at `start`.
pub fn skip_block_comment(text: &str, start: usize) -> MatchResult<usize> {
    match text[start + 2..].find("*/") {
        Some(rel) => Ok(start + 2 + rel + 2),
        None => Err(MatchError::not_found_at("closing `*/` of comment", start)),
    }
}

/// Skip whitespace and comments.
pub fn skip_trivia(text: &str, mut i: usize) -> MatchResult<usize> {
    let bytes = text.as_bytes();
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
        } else if text[i..].starts_with("/*") {
            i = skip_block_comment(text, i)?;
        } else if text[i..].starts_with("//") {
            i = text[i..].find('\n').map_or(bytes.len(), |n| i + n + 1);
        } else {
            break;
        }
    }
    Ok(i)
}

/// Skip horizontal whitespace only.
pub fn skip_blank(text: &str, mut i: usize) -> usize {
    let bytes = text.as_bytes();
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    i
}

fn is_bare_byte(b: u8) -> bool {
    !(b.is_ascii_whitespace()
        || matches!(b, b';' | b',' | b'=' | b'{' | b'}' | b'(' | b')' | b'"'))
}

/// End offset of the bare or quoted token starting at `start`.
pub fn token_end(text: &str, start: usize) -> MatchResult<usize> {
    let bytes = text.as_bytes();
    if start >= bytes.len() {
        return Err(MatchError::not_found_at("token", start));
    }
    if bytes[start] == b'"' {
        return skip_string(text, start);
    }
    let mut i = start;
    while i < bytes.len() && is_bare_byte(bytes[i]) {
        if text[i..].starts_with("/*") {
            break;
        }
        i += 1;
    }
    if i == start {
        return Err(MatchError::not_found_at("token", start));
    }
    Ok(i)
}

/// Offset just past the delimiter closing the `{` or `(` at `open`.
///
/// Nested delimiters must pair up; strings and comments are skipped.
pub fn matching_close(text: &str, open: usize) -> MatchResult<usize> {
    let bytes = text.as_bytes();
    let mut stack: Vec<u8> = Vec::new();
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i = skip_string(text, i)?;
                continue;
            }
            b'/' if text[i..].starts_with("/*") => {
                i = skip_block_comment(text, i)?;
                continue;
            }
            b'{' => stack.push(b'}'),
            b'(' => stack.push(b')'),
            c @ (b'}' | b')') => {
                if stack.pop() != Some(c) {
                    return Err(MatchError::not_found_at(
                        format!("balanced `{}`", c as char),
                        i,
                    ));
                }
                if stack.is_empty() {
                    return Ok(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(MatchError::not_found_at("closing delimiter", open))
}

/// Start of the line containing `i`.
pub fn line_start(text: &str, i: usize) -> usize {
    text[..i].rfind('\n').map_or(0, |n| n + 1)
}

/// Offset just past the newline ending the line containing `i` (or end of text).
pub fn line_end(text: &str, i: usize) -> usize {
    text[i..].find('\n').map_or(text.len(), |n| i + n + 1)
}

/// Leading whitespace of the line containing `i`.
pub fn indent_at(text: &str, i: usize) -> &str {
    let start = line_start(text, i);
    let end = skip_blank(text, start);
    &text[start..end]
}

/// True when only blanks precede `i` on its line.
pub fn starts_line(text: &str, i: usize) -> bool {
    text[line_start(text, i)..i]
        .bytes()
        .all(|b| b == b' ' || b == b'\t')
}

/// Text of a `/* ... */` comment at `i`, trimmed, or `None` when there is no comment.
pub fn comment_at(text: &str, i: usize) -> MatchResult<Option<(String, usize)>> {
    if !text[i..].starts_with("/*") {
        return Ok(None);
    }
    let end = skip_block_comment(text, i)?;
    let inner = text[i + 2..end - 2].trim().to_string();
    Ok(Some((inner, end)))
}

/// True when `id` occurs at `i` as a whole token, not as part of a longer word.
pub fn is_whole_token(text: &str, i: usize, len: usize) -> bool {
    let bytes = text.as_bytes();
    let before = i.checked_sub(1).map(|j| bytes[j]);
    let after = bytes.get(i + len).copied();
    let word = |b: Option<u8>| b.is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_');
    !word(before) && !word(after)
}

/// Offsets where `token` occurs as a whole word.
pub fn token_occurrences(text: &str, token: &str) -> Vec<usize> {
    text.match_indices(token)
        .map(|(i, _)| i)
        .filter(|&i| is_whole_token(text, i, token.len()))
        .collect()
}
