//! Patch rules.
//!
//! Each rule targets one structural concern and maps descriptor text to descriptor text. Rules
//! are idempotent: running a rule on its own output returns that output unchanged. They share
//! nothing but the text, so later rules locate what earlier rules inserted through the same
//! matchers.

use crate::profile::ExtensionProfile;
use pbxpatch_edit::{IdSource, MatchError};
use pbxpatch_types::{RuleRecord, RuleStatus};
use thiserror::Error;
use tracing::{debug, info};

mod dependency_edge;
mod embed_file;
mod embed_phase;
pub mod lookup;
mod path_references;
mod resource_exclusion;
mod settings_block;
mod sync_group_exception;

pub use dependency_edge::DependencyEdgeRule;
pub use embed_file::EmbedFileRule;
pub use embed_phase::EmbedPhaseRule;
pub use path_references::PathReferencesRule;
pub use resource_exclusion::ResourceExclusionRule;
pub use settings_block::SettingsBlockRule;
pub use sync_group_exception::SyncGroupExceptionRule;

/// Inputs shared by every rule in a run.
pub struct RuleContext<'a> {
    pub profile: &'a ExtensionProfile,
    pub ids: &'a mut dyn IdSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rule `{rule}` failed: {kind}")]
pub struct RuleError {
    pub rule: &'static str,
    pub kind: RuleErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleErrorKind {
    #[error(transparent)]
    Match(#[from] MatchError),

    /// The rule was forced to fail (fault injection).
    #[error("{0}")]
    Injected(String),
}

impl RuleError {
    pub fn new(rule: &'static str, kind: impl Into<RuleErrorKind>) -> Self {
        Self {
            rule,
            kind: kind.into(),
        }
    }
}

pub trait Rule {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn apply(&self, text: &str, ctx: &mut RuleContext<'_>) -> Result<String, RuleError>;
}

/// The built-in rules, in the order they must run.
pub fn builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(SettingsBlockRule),
        Box::new(PathReferencesRule),
        Box::new(DependencyEdgeRule),
        Box::new(EmbedPhaseRule),
        Box::new(EmbedFileRule),
        Box::new(ResourceExclusionRule),
        Box::new(SyncGroupExceptionRule),
    ]
}

/// Output of running a rule list over one descriptor.
#[derive(Debug, Clone)]
pub struct RuleRun {
    pub text: String,
    pub records: Vec<RuleRecord>,
}

/// Run `rules` in order. The first error aborts the run.
pub fn run_rules(
    rules: &[Box<dyn Rule>],
    text: &str,
    ctx: &mut RuleContext<'_>,
) -> Result<RuleRun, RuleError> {
    let mut current = text.to_string();
    let mut records = Vec::with_capacity(rules.len());

    for rule in rules {
        debug!(rule = rule.name(), "applying rule");
        let next = rule.apply(&current, ctx)?;
        let status = if next == current {
            RuleStatus::Noop
        } else {
            info!(
                rule = rule.name(),
                bytes_before = current.len(),
                bytes_after = next.len(),
                "rule applied"
            );
            RuleStatus::Applied
        };
        records.push(RuleRecord {
            name: rule.name().to_string(),
            status,
            bytes_before: current.len() as u64,
            bytes_after: next.len() as u64,
        });
        current = next;
    }

    Ok(RuleRun {
        text: current,
        records,
    })
}
