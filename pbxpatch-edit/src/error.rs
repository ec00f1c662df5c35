//! Error types for pbxpatch-edit.
//!
//! Matchers report exactly two failure shapes:
//! - the structural anchor they were asked to find is absent;
//! - the anchor matched more often than the structure allows.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// A required structural marker is absent.
    #[error("anchor not found: {anchor}{}", at(.offset))]
    AnchorNotFound {
        /// The literal anchor text (or a description of it).
        anchor: String,
        /// Byte offset the search was scoped to, if any.
        offset: Option<usize>,
    },

    /// A marker matched more than once where exactly one was expected.
    #[error("structural ambiguity: {anchor} matched {} times at byte offsets {offsets:?}", .offsets.len())]
    StructuralAmbiguity {
        anchor: String,
        offsets: Vec<usize>,
    },
}

fn at(offset: &Option<usize>) -> String {
    match offset {
        Some(o) => format!(" (at byte {o})"),
        None => String::new(),
    }
}

impl MatchError {
    pub fn not_found(anchor: impl Into<String>) -> Self {
        MatchError::AnchorNotFound {
            anchor: anchor.into(),
            offset: None,
        }
    }

    pub fn not_found_at(anchor: impl Into<String>, offset: usize) -> Self {
        MatchError::AnchorNotFound {
            anchor: anchor.into(),
            offset: Some(offset),
        }
    }

    pub fn ambiguous(anchor: impl Into<String>, offsets: Vec<usize>) -> Self {
        MatchError::StructuralAmbiguity {
            anchor: anchor.into(),
            offsets,
        }
    }

    /// The anchor text involved in the failure.
    pub fn anchor(&self) -> &str {
        match self {
            MatchError::AnchorNotFound { anchor, .. } => anchor,
            MatchError::StructuralAmbiguity { anchor, .. } => anchor,
        }
    }
}

pub type MatchResult<T> = Result<T, MatchError>;

/// Collapse a list of matches into "zero or one", raising an ambiguity on more.
pub fn at_most_one<T>(
    anchor: impl Into<String>,
    mut found: Vec<T>,
    offset_of: impl Fn(&T) -> usize,
) -> MatchResult<Option<T>> {
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        _ => Err(MatchError::ambiguous(
            anchor,
            found.iter().map(offset_of).collect(),
        )),
    }
}
