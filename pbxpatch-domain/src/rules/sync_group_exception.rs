use crate::rules::lookup::{self, SYNC_EXCEPTION_SET, SYNC_ROOT_GROUP};
use crate::rules::{Rule, RuleContext, RuleError};
use pbxpatch_edit::error::{MatchResult, at_most_one};
use pbxpatch_edit::format::{NewValue, ObjectBlock, quote, render_reference};
use pbxpatch_edit::matchers::ObjectSpan;
use pbxpatch_edit::{fresh_id, lists, matchers};
use tracing::debug;

/// Keeps the extension's sources out of the host's synchronized folder.
pub struct SyncGroupExceptionRule;

impl SyncGroupExceptionRule {
    pub const NAME: &'static str = "sync-group-exception";
    const DESCRIPTION: &'static str =
        "Lists the extension subtree in the host sync group's membership exceptions";

    fn host_exception_set(
        text: &str,
        group: &ObjectSpan,
        host_id: &str,
    ) -> MatchResult<Option<ObjectSpan>> {
        let mut found = Vec::new();
        for set in lookup::referenced_of_kind(text, group, "exceptions", SYNC_EXCEPTION_SET)? {
            if lookup::scalar(text, &set, "target")?.as_deref() == Some(host_id) {
                found.push(set);
            }
        }
        at_most_one(
            format!("{SYNC_EXCEPTION_SET} for {host_id} in {}.exceptions", group.id),
            found,
            |s| s.line_start,
        )
    }

    fn patch(text: &str, ctx: &mut RuleContext<'_>) -> MatchResult<String> {
        let profile = ctx.profile;
        let subtree = profile.excluded_subtree.as_str();
        let group = lookup::require_kind(text, &profile.host_sync_group, SYNC_ROOT_GROUP)?;

        if let Some(set) = Self::host_exception_set(text, &group, &profile.host_target)? {
            return match matchers::find_property(text, &set, "membershipExceptions")? {
                Some(prop) => {
                    let (text, changed) = lists::ensure_entry(text, &prop, subtree, &quote(subtree))?;
                    if changed {
                        debug!(set = %set.id, subtree, "added membership exception");
                    }
                    Ok(text)
                }
                None => matchers::insert_property(
                    text,
                    &set,
                    "membershipExceptions",
                    &NewValue::List(vec![quote(subtree)]),
                ),
            };
        }

        let host = lookup::require_target(text, &profile.host_target)?;
        let host_id = host.object_id()?;
        let host_name = lookup::display_name(text, &host)?;
        let folder = lookup::display_name(text, &group)?;

        let text = matchers::ensure_section(text, SYNC_EXCEPTION_SET)?;
        let id = fresh_id(ctx.ids, &text);
        let comment = format!("Exceptions for \"{folder}\" folder in \"{host_name}\" target");
        let block = ObjectBlock::new(id.clone(), SYNC_EXCEPTION_SET)
            .comment(comment.as_str())
            .list("membershipExceptions", vec![quote(subtree)])
            .reference("target", &host_id, Some(&host_name));
        let section = matchers::require_section(&text, SYNC_EXCEPTION_SET)?;
        let text = matchers::append_object(&text, &section, &block.render_multiline());

        let group = matchers::require_object(&text, &group.id)?;
        let entry = render_reference(&id, Some(&comment));
        debug!(set = %id, "created exception set");
        match matchers::find_property(&text, &group, "exceptions")? {
            Some(prop) => lists::append_entry(&text, &prop, &entry),
            None => matchers::insert_property(&text, &group, "exceptions", &NewValue::List(vec![entry])),
        }
    }
}

impl Rule for SyncGroupExceptionRule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn apply(&self, text: &str, ctx: &mut RuleContext<'_>) -> Result<String, RuleError> {
        Self::patch(text, ctx).map_err(|e| RuleError::new(Self::NAME, e))
    }
}
