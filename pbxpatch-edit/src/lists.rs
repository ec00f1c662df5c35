//! Reference lists: `key = ( a /* c */, b, );`.
//!
//! Membership is a set in effect. Appends check for an existing entry first and removals take
//! the entry's whole line when it has one.

use crate::error::{MatchError, MatchResult};
use crate::format::unquote;
use crate::matchers::{PropertySpan, splice};
use crate::scan;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Unquoted value (an object ID or a literal).
    pub value: String,
    /// The raw token.
    pub token: Range<usize>,
    pub comment: Option<String>,
    /// From the token through the trailing comma, if any.
    pub span: Range<usize>,
}

impl ListEntry {
    pub fn is_quoted(&self, text: &str) -> bool {
        text[self.token.clone()].starts_with('"')
    }
}

fn require_list(text: &str, prop: &PropertySpan) -> MatchResult<()> {
    if prop.is_list(text) {
        Ok(())
    } else {
        Err(MatchError::not_found_at(
            format!("`(` opening {}", prop.key),
            prop.value.start,
        ))
    }
}

/// Entries of the list value of `prop`.
pub fn parse_list(text: &str, prop: &PropertySpan) -> MatchResult<Vec<ListEntry>> {
    require_list(text, prop)?;
    let bytes = text.as_bytes();
    let close = prop.value.end - 1;
    let mut out = Vec::new();
    let mut i = prop.value.start + 1;
    loop {
        i = scan::skip_trivia(text, i)?;
        if i >= close {
            break;
        }
        let start = i;
        let token_end = match bytes[i] {
            b'{' | b'(' => scan::matching_close(text, i)?,
            _ => scan::token_end(text, i)?,
        };
        let mut j = scan::skip_blank(text, token_end);
        let mut comment = None;
        if let Some((c, after)) = scan::comment_at(text, j)? {
            comment = Some(c);
            j = after;
        }
        let k = scan::skip_trivia(text, j)?;
        let span_end = match bytes.get(k) {
            Some(b',') => k + 1,
            Some(b')') if k == close => j,
            _ => {
                return Err(MatchError::not_found_at(
                    format!("`,` after entry of {}", prop.key),
                    k,
                ));
            }
        };
        out.push(ListEntry {
            value: unquote(&text[start..token_end]),
            token: start..token_end,
            comment,
            span: start..span_end,
        });
        i = span_end;
    }
    Ok(out)
}

pub fn contains(entries: &[ListEntry], value: &str) -> bool {
    entries.iter().any(|e| e.value == value)
}

/// Append a rendered entry to the list of `prop`.
pub fn append_entry(text: &str, prop: &PropertySpan, rendered: &str) -> MatchResult<String> {
    let entries = parse_list(text, prop)?;
    let close = prop.value.end - 1;

    if scan::starts_line(text, close) {
        let indent = scan::indent_at(text, close);
        let at = scan::line_start(text, close);
        return Ok(splice(text, at..at, &format!("{indent}\t{rendered},\n")));
    }

    if entries.is_empty() {
        let indent = scan::indent_at(text, prop.key_start);
        let value = format!("(\n{indent}\t{rendered},\n{indent})");
        return Ok(splice(text, prop.value.clone(), &value));
    }

    let before = text[..close].trim_end_matches([' ', '\t']);
    if before.ends_with(',') {
        Ok(splice(text, close..close, &format!("{rendered}, ")))
    } else {
        let at = before.len();
        Ok(splice(text, at..at, &format!(", {rendered}")))
    }
}

/// Append `rendered` unless an entry with `value` is already present.
///
/// Returns the new text and whether anything changed.
pub fn ensure_entry(
    text: &str,
    prop: &PropertySpan,
    value: &str,
    rendered: &str,
) -> MatchResult<(String, bool)> {
    let entries = parse_list(text, prop)?;
    if contains(&entries, value) {
        return Ok((text.to_string(), false));
    }
    Ok((append_entry(text, prop, rendered)?, true))
}

/// Remove every entry matching `pred`. Returns the new text and the removed entries.
pub fn remove_entries(
    text: &str,
    prop: &PropertySpan,
    pred: impl Fn(&ListEntry) -> bool,
) -> MatchResult<(String, Vec<ListEntry>)> {
    let removed: Vec<ListEntry> = parse_list(text, prop)?
        .into_iter()
        .filter(|e| pred(e))
        .collect();
    let mut out = text.to_string();
    for entry in removed.iter().rev() {
        let rest_of_line = scan::line_end(&out, entry.span.end);
        let own_line = scan::starts_line(&out, entry.span.start)
            && out[entry.span.end..rest_of_line].trim().is_empty();
        let range = if own_line {
            scan::line_start(&out, entry.span.start)..rest_of_line
        } else {
            entry.span.start..scan::skip_blank(&out, entry.span.end)
        };
        out = splice(&out, range, "");
    }
    Ok((out, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::{require_object, require_property};
    use pretty_assertions::assert_eq;

    const OBJ: &str = "\t\tPH01 /* Resources */ = {
\t\t\tisa = PBXResourcesBuildPhase;
\t\t\tfiles = (
\t\t\t\tBF01 /* Assets.xcassets in Resources */,
\t\t\t\tBF02 /* Info.plist in Resources */,
\t\t\t);
\t\t\tinline = (a, \"b c\", );
\t\t\tempty = ();
\t\t};
";

    fn prop(text: &str, key: &str) -> PropertySpan {
        let obj = require_object(text, "PH01").unwrap();
        require_property(text, &obj, key).unwrap()
    }

    #[test]
    fn parses_entries_with_comments() {
        let entries = parse_list(OBJ, &prop(OBJ, "files")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].value, "BF01");
        assert_eq!(entries[0].comment.as_deref(), Some("Assets.xcassets in Resources"));
        assert_eq!(entries[1].comment.as_deref(), Some("Info.plist in Resources"));

        let inline = parse_list(OBJ, &prop(OBJ, "inline")).unwrap();
        assert_eq!(
            inline.iter().map(|e| e.value.as_str()).collect::<Vec<_>>(),
            vec!["a", "b c"]
        );
        assert!(inline[1].is_quoted(OBJ));
        assert!(parse_list(OBJ, &prop(OBJ, "empty")).unwrap().is_empty());
    }

    #[test]
    fn rejects_non_list_values() {
        let isa = prop(OBJ, "isa");
        assert!(parse_list(OBJ, &isa).is_err());
    }

    #[test]
    fn append_to_multiline_list() {
        let out = append_entry(OBJ, &prop(OBJ, "files"), "BF03 /* x */").unwrap();
        assert!(out.contains(
            "\t\t\t\tBF02 /* Info.plist in Resources */,\n\t\t\t\tBF03 /* x */,\n\t\t\t);"
        ));
    }

    #[test]
    fn append_to_empty_inline_list_goes_multiline() {
        let out = append_entry(OBJ, &prop(OBJ, "empty"), "X1").unwrap();
        assert!(out.contains("\t\t\tempty = (\n\t\t\t\tX1,\n\t\t\t);"));
    }

    #[test]
    fn append_to_inline_list() {
        let out = append_entry(OBJ, &prop(OBJ, "inline"), "d").unwrap();
        assert!(out.contains("inline = (a, \"b c\", d, );"));

        let text = OBJ.replace("(a, \"b c\", )", "(a, b)");
        let out = append_entry(&text, &prop(&text, "inline"), "d").unwrap();
        assert!(out.contains("inline = (a, b, d);"));
    }

    #[test]
    fn ensure_entry_is_idempotent() {
        let (once, changed) = ensure_entry(OBJ, &prop(OBJ, "files"), "BF03", "BF03").unwrap();
        assert!(changed);
        let (twice, changed) = ensure_entry(&once, &prop(&once, "files"), "BF03", "BF03").unwrap();
        assert!(!changed);
        assert_eq!(once, twice);
    }

    #[test]
    fn remove_entries_takes_whole_lines() {
        let (out, removed) =
            remove_entries(OBJ, &prop(OBJ, "files"), |e| e.value == "BF02").unwrap();
        assert_eq!(removed.len(), 1);
        assert!(out.contains(
            "\t\t\t\tBF01 /* Assets.xcassets in Resources */,\n\t\t\t);"
        ));
        assert!(!out.contains("BF02"));
    }

    #[test]
    fn remove_inline_entry() {
        let (out, _) = remove_entries(OBJ, &prop(OBJ, "inline"), |e| e.value == "a").unwrap();
        assert!(out.contains("inline = (\"b c\", );"));
    }
}
