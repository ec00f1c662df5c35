//! Anchored matchers over descriptor text.
//!
//! Matchers never parse the whole grammar. They locate one structure by a literal anchor
//! (section marker or object ID) and then walk balanced delimiters from there. Every property
//! lookup is scoped to the top level of one object block.

use crate::error::{MatchError, MatchResult, at_most_one};
use crate::format::{NewValue, quote, unquote};
use crate::scan;
use pbxpatch_types::ObjectId;
use regex::Regex;
use std::ops::Range;

/// One `/* Begin <Kind> section */ ... /* End <Kind> section */` region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpan {
    pub kind: String,
    /// Start of the `Begin` marker line.
    pub begin: usize,
    /// Text between the marker lines.
    pub body: Range<usize>,
    /// Start of the `End` marker line. New objects are inserted here.
    pub end_marker: usize,
    /// Just past the `End` marker line.
    pub end: usize,
}

pub fn begin_marker(kind: &str) -> String {
    format!("/* Begin {kind} section */")
}

pub fn end_marker(kind: &str) -> String {
    format!("/* End {kind} section */")
}

fn single_occurrence(text: &str, needle: &str) -> MatchResult<Option<usize>> {
    let found: Vec<usize> = text.match_indices(needle).map(|(i, _)| i).collect();
    at_most_one(needle, found, |i| *i)
}

/// Locate a section by its markers. `None` when neither marker is present.
pub fn find_section(text: &str, kind: &str) -> MatchResult<Option<SectionSpan>> {
    let begin = begin_marker(kind);
    let end = end_marker(kind);
    let b = single_occurrence(text, &begin)?;
    let e = single_occurrence(text, &end)?;
    match (b, e) {
        (None, None) => Ok(None),
        (Some(b), Some(e)) if e > b => {
            let body_start = scan::line_end(text, b);
            let end_marker = scan::line_start(text, e);
            Ok(Some(SectionSpan {
                kind: kind.to_string(),
                begin: scan::line_start(text, b),
                body: body_start..end_marker,
                end_marker,
                end: scan::line_end(text, e),
            }))
        }
        (Some(b), Some(_)) => Err(MatchError::not_found_at(end, b)),
        (Some(b), None) => Err(MatchError::not_found_at(end, b)),
        (None, Some(e)) => Err(MatchError::not_found_at(begin, e)),
    }
}

pub fn require_section(text: &str, kind: &str) -> MatchResult<SectionSpan> {
    find_section(text, kind)?.ok_or_else(|| MatchError::not_found(begin_marker(kind)))
}

fn section_kinds(text: &str) -> MatchResult<Vec<(String, usize, usize)>> {
    let re = Regex::new(r"(?m)^/\* Begin (\S+) section \*/[ \t]*$")
        .map_err(|e| MatchError::not_found(format!("section marker pattern: {e}")))?;
    let mut out = Vec::new();
    for caps in re.captures_iter(text) {
        if let (Some(whole), Some(kind)) = (caps.get(0), caps.get(1)) {
            out.push((kind.as_str().to_string(), whole.start(), whole.end()));
        }
    }
    Ok(out)
}

/// Every section present, in file order.
pub fn sections(text: &str) -> MatchResult<Vec<SectionSpan>> {
    let mut out = Vec::new();
    for (kind, _, _) in section_kinds(text)? {
        out.push(require_section(text, &kind)?);
    }
    Ok(out)
}

/// Ensure a section of `kind` exists, inserting an empty one in sorted position.
pub fn ensure_section(text: &str, kind: &str) -> MatchResult<String> {
    if find_section(text, kind)?.is_some() {
        return Ok(text.to_string());
    }
    let kinds = section_kinds(text)?;
    let block = format!("{}\n{}\n", begin_marker(kind), end_marker(kind));

    if let Some((_, start, _)) = kinds.iter().find(|(k, _, _)| k.as_str() > kind) {
        let mut out = text.to_string();
        out.insert_str(*start, &format!("{block}\n"));
        return Ok(out);
    }

    let Some((last, _, _)) = kinds.last() else {
        return Err(MatchError::not_found("/* Begin <Kind> section */"));
    };
    let last = require_section(text, last)?;
    let mut out = text.to_string();
    out.insert_str(last.end, &format!("\n{block}"));
    Ok(out)
}

/// One object definition: `ID [/* comment */] = { ... };`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSpan {
    pub id: String,
    pub comment: Option<String>,
    /// Start of the definition line (or of the ID, when it does not start a line).
    pub line_start: usize,
    /// Offset of the opening `{`.
    pub open: usize,
    /// Just past the closing `}`.
    pub close: usize,
    /// Just past the terminating `;` and its line break.
    pub end: usize,
}

impl ObjectSpan {
    pub fn object_id(&self) -> MatchResult<ObjectId> {
        ObjectId::parse(&self.id).map_err(|e| MatchError::not_found_at(e.to_string(), self.open))
    }

    /// Whether the body spans more than one line.
    pub fn is_multiline(&self, text: &str) -> bool {
        text[self.open..self.close].contains('\n')
    }

    pub fn text<'a>(&self, text: &'a str) -> &'a str {
        &text[self.line_start..self.end]
    }
}

/// Parse `ID [/* c */] = { ... };` starting at `id_start`.
fn object_at(text: &str, id_start: usize) -> MatchResult<ObjectSpan> {
    let id_end = scan::token_end(text, id_start)?;
    let id = text[id_start..id_end].to_string();
    let mut i = scan::skip_blank(text, id_end);
    let mut comment = None;
    if let Some((c, after)) = scan::comment_at(text, i)? {
        comment = Some(c);
        i = scan::skip_blank(text, after);
    }
    if text.as_bytes().get(i) != Some(&b'=') {
        return Err(MatchError::not_found_at(format!("`=` after {id}"), i));
    }
    let open = scan::skip_trivia(text, i + 1)?;
    if text.as_bytes().get(open) != Some(&b'{') {
        return Err(MatchError::not_found_at(format!("`{{` opening {id}"), open));
    }
    let close = scan::matching_close(text, open)?;
    let semi = scan::skip_blank(text, close);
    if text.as_bytes().get(semi) != Some(&b';') {
        return Err(MatchError::not_found_at(format!("`;` closing {id}"), close));
    }
    let starts_line = scan::starts_line(text, id_start);
    Ok(ObjectSpan {
        id,
        comment,
        line_start: if starts_line {
            scan::line_start(text, id_start)
        } else {
            id_start
        },
        open,
        close,
        end: if starts_line {
            scan::line_end(text, semi)
        } else {
            semi + 1
        },
    })
}

/// Locate the definition of `id`. `None` when the ID is never defined.
pub fn find_object(text: &str, id: &str) -> MatchResult<Option<ObjectSpan>> {
    let pattern = format!(
        r"(?m)^[ \t]*({})(?:[ \t]+/\*.*?\*/)?[ \t]*=[ \t]*\{{",
        regex::escape(id)
    );
    let re = Regex::new(&pattern)
        .map_err(|e| MatchError::not_found(format!("object pattern for {id}: {e}")))?;
    let starts: Vec<usize> = re
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.start()))
        .collect();
    match at_most_one(format!("{id} = {{"), starts, |i| *i)? {
        Some(start) => object_at(text, start).map(Some),
        None => Ok(None),
    }
}

pub fn require_object(text: &str, id: &str) -> MatchResult<ObjectSpan> {
    find_object(text, id)?.ok_or_else(|| MatchError::not_found(format!("{id} = {{")))
}

/// Every object defined in `section`, in file order.
pub fn objects_in(text: &str, section: &SectionSpan) -> MatchResult<Vec<ObjectSpan>> {
    let mut out = Vec::new();
    let mut i = section.body.start;
    loop {
        i = scan::skip_trivia(text, i)?;
        if i >= section.end_marker {
            break;
        }
        let obj = object_at(text, i)?;
        i = obj.end;
        out.push(obj);
    }
    Ok(out)
}

/// Every object in the section of `kind`; empty when the section is absent.
pub fn objects_in_section(text: &str, kind: &str) -> MatchResult<Vec<ObjectSpan>> {
    match find_section(text, kind)? {
        Some(section) => objects_in(text, &section),
        None => Ok(Vec::new()),
    }
}

/// One `key = value;` entry at the top level of a dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpan {
    pub key: String,
    /// Start of the removable region: the line start for one-per-line properties.
    pub line_start: usize,
    pub key_start: usize,
    /// The value token or delimited `( ... )` / `{ ... }` block, excluding comments.
    pub value: Range<usize>,
    /// Just past the removable region.
    pub end: usize,
}

impl PropertySpan {
    pub fn raw<'a>(&self, text: &'a str) -> &'a str {
        &text[self.value.clone()]
    }

    /// The value with string quoting removed.
    pub fn scalar(&self, text: &str) -> String {
        unquote(self.raw(text))
    }

    pub fn is_list(&self, text: &str) -> bool {
        self.raw(text).starts_with('(')
    }

    pub fn is_dict(&self, text: &str) -> bool {
        self.raw(text).starts_with('{')
    }

    pub fn is_quoted(&self, text: &str) -> bool {
        self.raw(text).starts_with('"')
    }
}

/// Top-level properties of the dictionary opening at `open`.
pub fn dict_properties(text: &str, open: usize) -> MatchResult<Vec<PropertySpan>> {
    if text.as_bytes().get(open) != Some(&b'{') {
        return Err(MatchError::not_found_at("`{`", open));
    }
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = open + 1;
    loop {
        i = scan::skip_trivia(text, i)?;
        match bytes.get(i) {
            None => return Err(MatchError::not_found_at("`}` closing dictionary", open)),
            Some(b'}') => break,
            Some(_) => {}
        }
        let key_start = i;
        let key_end = scan::token_end(text, key_start)?;
        let key = unquote(&text[key_start..key_end]);
        i = scan::skip_trivia(text, key_end)?;
        if bytes.get(i) != Some(&b'=') {
            return Err(MatchError::not_found_at(format!("`=` after {key}"), i));
        }
        let value_start = scan::skip_trivia(text, i + 1)?;
        let value_end = match bytes.get(value_start) {
            Some(b'{') | Some(b'(') => scan::matching_close(text, value_start)?,
            _ => scan::token_end(text, value_start)?,
        };
        let semi = scan::skip_trivia(text, value_end)?;
        if bytes.get(semi) != Some(&b';') {
            return Err(MatchError::not_found_at(format!("`;` after {key}"), semi));
        }
        let own_line = scan::starts_line(text, key_start);
        out.push(PropertySpan {
            key,
            line_start: if own_line {
                scan::line_start(text, key_start)
            } else {
                key_start
            },
            key_start,
            value: value_start..value_end,
            end: if own_line {
                scan::line_end(text, semi)
            } else {
                scan::skip_blank(text, semi + 1)
            },
        });
        i = semi + 1;
    }
    Ok(out)
}

pub fn properties(text: &str, obj: &ObjectSpan) -> MatchResult<Vec<PropertySpan>> {
    dict_properties(text, obj.open)
}

/// A property of `obj`. Duplicate keys are an ambiguity.
pub fn find_property(text: &str, obj: &ObjectSpan, key: &str) -> MatchResult<Option<PropertySpan>> {
    let found: Vec<PropertySpan> = properties(text, obj)?
        .into_iter()
        .filter(|p| p.key == key)
        .collect();
    at_most_one(format!("{key} in {}", obj.id), found, |p| p.key_start)
}

pub fn require_property(text: &str, obj: &ObjectSpan, key: &str) -> MatchResult<PropertySpan> {
    find_property(text, obj, key)?
        .ok_or_else(|| MatchError::not_found_at(format!("{key} in {}", obj.id), obj.open))
}

/// The `isa` of an object.
pub fn isa(text: &str, obj: &ObjectSpan) -> MatchResult<String> {
    Ok(require_property(text, obj, "isa")?.scalar(text))
}

/// Open brace of the top-level dictionary.
pub fn root_dict(text: &str) -> MatchResult<usize> {
    let open = scan::skip_trivia(text, 0)?;
    if text.as_bytes().get(open) != Some(&b'{') {
        return Err(MatchError::not_found_at("top-level `{`", open));
    }
    Ok(open)
}

/// The project object named by the top-level `rootObject`.
pub fn find_root_object(text: &str) -> MatchResult<ObjectId> {
    let open = root_dict(text)?;
    let found: Vec<PropertySpan> = dict_properties(text, open)?
        .into_iter()
        .filter(|p| p.key == "rootObject")
        .collect();
    let prop = at_most_one("rootObject", found, |p| p.key_start)?
        .ok_or_else(|| MatchError::not_found("rootObject"))?;
    ObjectId::parse(&prop.scalar(text))
        .map_err(|e| MatchError::not_found_at(e.to_string(), prop.value.start))
}

/// Replace `range` of `text` with `with`.
pub fn splice(text: &str, range: Range<usize>, with: &str) -> String {
    let mut out = String::with_capacity(text.len() + with.len());
    out.push_str(&text[..range.start]);
    out.push_str(with);
    out.push_str(&text[range.end..]);
    out
}

/// Append a rendered object block at the end of `section`.
pub fn append_object(text: &str, section: &SectionSpan, block: &str) -> String {
    splice(text, section.end_marker..section.end_marker, block)
}

pub fn remove_object(text: &str, obj: &ObjectSpan) -> String {
    splice(text, obj.line_start..obj.end, "")
}

/// Insert `key = value;` into `obj`, keeping keys sorted after `isa`.
///
/// Fails with an ambiguity when the key already exists.
pub fn insert_property(
    text: &str,
    obj: &ObjectSpan,
    key: &str,
    value: &NewValue,
) -> MatchResult<String> {
    let props = properties(text, obj)?;
    if let Some(existing) = props.iter().find(|p| p.key == key) {
        return Err(MatchError::ambiguous(
            format!("{key} in {}", obj.id),
            vec![existing.key_start],
        ));
    }
    let next = props
        .iter()
        .find(|p| p.key != "isa" && p.key.as_str() > key);
    let rendered_key = quote(key);

    if obj.is_multiline(text) {
        let indent = match props.first() {
            Some(p) => scan::indent_at(text, p.key_start).to_string(),
            None => format!("{}\t", scan::indent_at(text, obj.open)),
        };
        let line = format!(
            "{indent}{rendered_key} = {};\n",
            value.render_multiline(&indent)
        );
        let at = match next {
            Some(p) => p.line_start,
            None => scan::line_start(text, obj.close - 1),
        };
        Ok(splice(text, at..at, &line))
    } else {
        let entry = format!("{rendered_key} = {}; ", value.render_inline());
        let at = match next {
            Some(p) => p.key_start,
            None => obj.close - 1,
        };
        Ok(splice(text, at..at, &entry))
    }
}

/// Replace the value of an existing property.
pub fn replace_value(text: &str, prop: &PropertySpan, rendered: &str) -> String {
    splice(text, prop.value.clone(), rendered)
}

/// How many times `id` occurs as a whole token anywhere in the text.
pub fn reference_count(text: &str, id: &str) -> usize {
    scan::token_occurrences(text, id).len()
}
