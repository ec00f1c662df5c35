//! Structural editing primitives for Xcode project descriptors.
//!
//! The descriptor is never parsed as a whole. Edits locate their target through
//! [`matchers`] (sections, objects, properties) and [`lists`] (reference lists), then splice
//! rendered text ([`format`]) into place. Every lookup that finds more than the structure
//! allows fails with [`MatchError::StructuralAmbiguity`] instead of guessing.

pub mod error;
pub mod format;
pub mod ids;
pub mod integrity;
pub mod lists;
pub mod matchers;
pub mod paths;
pub mod scan;

pub use error::{MatchError, MatchResult};
pub use ids::{IdSource, RandomIds, SequentialIds, fresh_id};
pub use integrity::{DanglingReference, check_references};

use diffy::PatchFormatter;
use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Unified diff of one file, empty when the contents are identical.
pub fn render_patch(path: &str, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }
    let mut out = String::new();
    out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
    out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));

    let formatter = PatchFormatter::new();
    let patch = diffy::create_patch(before, after);
    let body = formatter.fmt_patch(&patch).to_string();
    // diffy repeats its own `---`/`+++` header; keep only the hunks.
    let hunks = body
        .find("\n@@")
        .map(|i| &body[i + 1..])
        .unwrap_or(body.as_str());
    out.push_str(hunks);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
