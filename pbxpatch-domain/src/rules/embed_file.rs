use crate::rules::lookup::{self, BUILD_FILE};
use crate::rules::{Rule, RuleContext, RuleError};
use pbxpatch_edit::MatchError;
use pbxpatch_edit::error::MatchResult;
use pbxpatch_edit::format::{NewValue, ObjectBlock, render_reference};
use pbxpatch_edit::{fresh_id, lists, matchers};
use tracing::debug;

/// Ensures the embed phase copies the extension's product.
pub struct EmbedFileRule;

impl EmbedFileRule {
    pub const NAME: &'static str = "embed-file";
    const DESCRIPTION: &'static str =
        "Adds a build file for the extension product to the host's embed phase";

    fn patch(text: &str, ctx: &mut RuleContext<'_>) -> MatchResult<String> {
        let profile = ctx.profile;
        lookup::require_dependency_edge(text, profile)?;

        let host = lookup::require_target(text, &profile.host_target)?;
        let phase = lookup::find_embed_phase(text, &host)?.ok_or_else(|| {
            MatchError::not_found(format!("embed phase in {}.buildPhases", host.id))
        })?;
        let phase_name = lookup::display_name(text, &phase)?;

        let extension = lookup::require_target(text, &profile.extension_target)?;
        let product = matchers::require_property(text, &extension, "productReference")?;
        let product = matchers::require_object(text, &product.scalar(text))?;
        let product_id = product.object_id()?;
        let product_name = lookup::display_name(text, &product)?;

        for entry in lookup::list_entries(text, &phase, "files")? {
            let Some(build_file) = matchers::find_object(text, &entry.value)? else {
                continue;
            };
            if lookup::scalar(text, &build_file, "fileRef")?.as_deref() == Some(product_id.as_str()) {
                debug!(build_file = %build_file.id, "product already embedded");
                return Ok(text.to_string());
            }
        }

        let files = matchers::require_property(text, &phase, "files")?;
        if let Some(build_file) = lookup::unlisted_build_file(text, product_id.as_str())? {
            let entry = render_reference(&build_file.object_id()?, build_file.comment.as_deref());
            debug!(build_file = %build_file.id, "listing existing embed build file");
            return lists::append_entry(text, &files, &entry);
        }

        let text = matchers::ensure_section(text, BUILD_FILE)?;
        let id = fresh_id(ctx.ids, &text);
        let comment = format!("{product_name} in {phase_name}");
        let block = ObjectBlock::new(id.clone(), BUILD_FILE)
            .comment(comment.as_str())
            .reference("fileRef", &product_id, Some(&product_name))
            .value(
                "settings",
                NewValue::Dict(vec![(
                    "ATTRIBUTES".to_string(),
                    NewValue::List(vec!["RemoveHeadersOnCopy".to_string()]),
                )]),
            );
        let section = matchers::require_section(&text, BUILD_FILE)?;
        let text = matchers::append_object(&text, &section, &block.render_inline());

        let phase = matchers::require_object(&text, &phase.id)?;
        let files = matchers::require_property(&text, &phase, "files")?;
        debug!(build_file = %id, "created embed build file");
        lists::append_entry(&text, &files, &render_reference(&id, Some(&comment)))
    }
}

impl Rule for EmbedFileRule {
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
