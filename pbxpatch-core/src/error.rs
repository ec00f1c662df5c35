//! Error taxonomy for a patch run and its mapping to process exit codes.
//!
//! - Patch failures (exit code 2): I/O before mutation, rule errors, integrity failures and lock
//!   contention. The descriptor on disk equals its pre-run content.
//! - Unrecoverable failures (exit code 3): restoring the snapshot failed, so the descriptor may
//!   be in any state. The backup (if present) is the only copy of the original.

use camino::Utf8PathBuf;
use pbxpatch_domain::{RuleError, RuleErrorKind};
use pbxpatch_edit::{DanglingReference, MatchError};
use thiserror::Error;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_VALIDATION: u8 = 1;
pub const EXIT_PATCH_FAILED: u8 = 2;
pub const EXIT_UNRECOVERABLE: u8 = 3;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("I/O error on `{path}`: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rule `{rule}`: {source}")]
    AnchorNotFound {
        rule: String,
        #[source]
        source: MatchError,
    },

    #[error("rule `{rule}`: {source}")]
    StructuralAmbiguity {
        rule: String,
        #[source]
        source: MatchError,
    },

    #[error("rule `{rule}` failed: {message}")]
    RuleFailed { rule: String, message: String },

    #[error("another patch run holds `{lock}`")]
    ConcurrentPatchInProgress { lock: Utf8PathBuf },

    #[error("patched descriptor has {} dangling reference(s): {}", .references.len(), list(.references))]
    DanglingReference { references: Vec<DanglingReference> },

    #[error("rollback failed ({source}) while recovering from: {cause}")]
    RollbackFailed {
        cause: Box<PatchError>,
        #[source]
        source: RollbackError,
    },
}

fn list(references: &[DanglingReference]) -> String {
    references
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why a snapshot could not be restored.
#[derive(Debug, Error)]
pub enum RollbackError {
    #[error("backup `{path}` is missing")]
    BackupMissing { path: Utf8PathBuf },

    #[error("backup `{path}` digest {actual} does not match snapshot digest {expected}")]
    BackupMismatch {
        path: Utf8PathBuf,
        expected: String,
        actual: String,
    },

    #[error("I/O error on `{path}`: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        PatchError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a matcher error raised outside any rule (e.g. the integrity scan).
    pub(crate) fn from_match(rule: impl Into<String>, source: MatchError) -> Self {
        let rule = rule.into();
        match source {
            MatchError::AnchorNotFound { .. } => PatchError::AnchorNotFound { rule, source },
            MatchError::StructuralAmbiguity { .. } => {
                PatchError::StructuralAmbiguity { rule, source }
            }
        }
    }

    /// The rule that raised the error, when one did.
    pub fn rule(&self) -> Option<&str> {
        match self {
            PatchError::AnchorNotFound { rule, .. }
            | PatchError::StructuralAmbiguity { rule, .. }
            | PatchError::RuleFailed { rule, .. } => Some(rule),
            PatchError::RollbackFailed { cause, .. } => cause.rule(),
            _ => None,
        }
    }

    pub fn is_rollback_failure(&self) -> bool {
        matches!(self, PatchError::RollbackFailed { .. })
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        if self.is_rollback_failure() {
            EXIT_UNRECOVERABLE
        } else {
            EXIT_PATCH_FAILED
        }
    }
}

impl From<RuleError> for PatchError {
    fn from(err: RuleError) -> Self {
        match err.kind {
            RuleErrorKind::Match(source) => PatchError::from_match(err.rule, source),
            RuleErrorKind::Injected(message) => PatchError::RuleFailed {
                rule: err.rule.to_string(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_errors_keep_rule_name_and_offset() {
        let err = PatchError::from(RuleError::new(
            "embed-file",
            MatchError::not_found_at("productReference", 120),
        ));
        assert!(matches!(err, PatchError::AnchorNotFound { .. }));
        assert_eq!(err.rule(), Some("embed-file"));
        let msg = err.to_string();
        assert!(msg.contains("embed-file"), "{msg}");
        assert!(msg.contains("at byte 120"), "{msg}");
        assert_eq!(err.exit_code(), EXIT_PATCH_FAILED);
    }

    #[test]
    fn ambiguity_maps_to_its_own_variant() {
        let err = PatchError::from(RuleError::new(
            "dependency-edge",
            MatchError::ambiguous("PBXTargetDependency", vec![10, 20]),
        ));
        assert!(matches!(err, PatchError::StructuralAmbiguity { .. }));
        assert!(err.to_string().contains("[10, 20]"));
    }

    #[test]
    fn rollback_failure_exits_3_and_keeps_cause() {
        let cause = PatchError::RuleFailed {
            rule: "embed-file".to_string(),
            message: "boom".to_string(),
        };
        let err = PatchError::RollbackFailed {
            cause: Box::new(cause),
            source: RollbackError::BackupMissing {
                path: "p.pbxproj.backup".into(),
            },
        };
        assert_eq!(err.exit_code(), EXIT_UNRECOVERABLE);
        assert_eq!(err.rule(), Some("embed-file"));
        let msg = err.to_string();
        assert!(msg.contains("is missing"), "{msg}");
        assert!(msg.contains("boom"), "{msg}");
    }

    #[test]
    fn lock_contention_is_a_patch_failure() {
        let err = PatchError::ConcurrentPatchInProgress {
            lock: "p.pbxproj.lock".into(),
        };
        assert_eq!(err.exit_code(), EXIT_PATCH_FAILED);
        assert_eq!(err.rule(), None);
    }
}
