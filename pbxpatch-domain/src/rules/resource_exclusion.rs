use crate::rules::lookup::{self, BUILD_FILE, RESOURCES_PHASE};
use crate::rules::{Rule, RuleContext, RuleError, RuleErrorKind};
use pbxpatch_edit::MatchError;
use pbxpatch_edit::error::{MatchResult, at_most_one};
use pbxpatch_edit::lists::{self, ListEntry};
use pbxpatch_edit::matchers;
use regex::Regex;
use tracing::debug;

/// Removes extension files that leaked into the host's resources phase.
pub struct ResourceExclusionRule;

impl ResourceExclusionRule {
    pub const NAME: &'static str = "resource-exclusion";
    const DESCRIPTION: &'static str =
        "Removes extension-owned files from the host's resources phase";

    /// File name an entry refers to: the comment's `<name> in <phase>` prefix, else the
    /// referenced file's path.
    fn file_name(text: &str, entry: &ListEntry) -> MatchResult<Option<String>> {
        if let Some(comment) = &entry.comment {
            let name = comment.split(" in ").next().unwrap_or(comment);
            return Ok(Some(name.to_string()));
        }
        let Some(build_file) = matchers::find_object(text, &entry.value)? else {
            return Ok(None);
        };
        let Some(file_ref) = lookup::scalar(text, &build_file, "fileRef")? else {
            return Ok(None);
        };
        let Some(file) = matchers::find_object(text, &file_ref)? else {
            return Ok(None);
        };
        let path = lookup::display_name(text, &file)?;
        Ok(path.rsplit('/').next().map(str::to_string))
    }

    fn patch(text: &str, ctx: &RuleContext<'_>, pattern: &Regex) -> MatchResult<String> {
        let host = lookup::require_target(text, &ctx.profile.host_target)?;
        let phases = lookup::referenced_of_kind(text, &host, "buildPhases", RESOURCES_PHASE)?;
        let Some(phase) = at_most_one(
            format!("{RESOURCES_PHASE} in {}.buildPhases", host.id),
            phases,
            |p| p.line_start,
        )?
        else {
            return Ok(text.to_string());
        };

        let files = matchers::require_property(text, &phase, "files")?;
        let mut doomed = Vec::new();
        for entry in lists::parse_list(text, &files)? {
            if let Some(name) = Self::file_name(text, &entry)?
                && pattern.is_match(&name)
            {
                doomed.push(entry.value.clone());
            }
        }
        if doomed.is_empty() {
            return Ok(text.to_string());
        }

        let (mut text, removed) = lists::remove_entries(text, &files, |e| doomed.contains(&e.value))?;

        // Build files only the resources phase referenced are now orphans.
        for entry in &removed {
            if matchers::reference_count(&text, &entry.value) != 1 {
                continue;
            }
            if let Some(obj) = matchers::find_object(&text, &entry.value)?
                && matchers::isa(&text, &obj)? == BUILD_FILE
            {
                text = matchers::remove_object(&text, &obj);
            }
        }
        debug!(removed = removed.len(), "removed resource entries");
        Ok(text)
    }
}

impl Rule for ResourceExclusionRule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn apply(&self, text: &str, ctx: &mut RuleContext<'_>) -> Result<String, RuleError> {
        let pattern = ctx.profile.resource_exclusion().map_err(|e| {
            RuleError::new(
                Self::NAME,
                RuleErrorKind::Match(MatchError::not_found(e.to_string())),
            )
        })?;
        Self::patch(text, ctx, &pattern).map_err(|e| RuleError::new(Self::NAME, e))
    }
}
