use crate::rules::lookup::{self, COPY_FILES_PHASE, DST_SUBFOLDER_PLUGINS};
use crate::rules::{Rule, RuleContext, RuleError};
use pbxpatch_edit::error::MatchResult;
use pbxpatch_edit::format::{ObjectBlock, render_reference};
use pbxpatch_edit::{fresh_id, lists, matchers};
use tracing::debug;

/// Ensures the host has a copy-files phase that embeds app extensions.
pub struct EmbedPhaseRule;

impl EmbedPhaseRule {
    pub const NAME: &'static str = "embed-phase";
    const DESCRIPTION: &'static str =
        "Adds a copy-files phase with destination 13 (plug-ins) to the host's build phases";

    fn patch(text: &str, ctx: &mut RuleContext<'_>) -> MatchResult<String> {
        let profile = ctx.profile;
        lookup::require_dependency_edge(text, profile)?;

        let host = lookup::require_target(text, &profile.host_target)?;
        if let Some(phase) = lookup::find_embed_phase(text, &host)? {
            debug!(phase = %phase.id, "embed phase already present");
            return Ok(text.to_string());
        }

        if let Some(phase) = lookup::unlisted_embed_phase(text)? {
            let name = lookup::display_name(text, &phase)?;
            let phases = matchers::require_property(text, &host, "buildPhases")?;
            debug!(phase = %phase.id, "listing existing embed phase");
            let entry = render_reference(&phase.object_id()?, Some(&name));
            return lists::append_entry(text, &phases, &entry);
        }

        let text = matchers::ensure_section(text, COPY_FILES_PHASE)?;
        let id = fresh_id(ctx.ids, &text);
        let block = ObjectBlock::new(id.clone(), COPY_FILES_PHASE)
            .comment(profile.embed_phase_name.as_str())
            .scalar("buildActionMask", "2147483647")
            .text("dstPath", "")
            .scalar("dstSubfolderSpec", DST_SUBFOLDER_PLUGINS)
            .list("files", vec![])
            .text("name", &profile.embed_phase_name)
            .scalar("runOnlyForDeploymentPostprocessing", "0");
        let section = matchers::require_section(&text, COPY_FILES_PHASE)?;
        let text = matchers::append_object(&text, &section, &block.render_multiline());

        let host = lookup::require_target(&text, &profile.host_target)?;
        let phases = matchers::require_property(&text, &host, "buildPhases")?;
        let entry = render_reference(&id, Some(&profile.embed_phase_name));
        debug!(phase = %id, "created embed phase");
        lists::append_entry(&text, &phases, &entry)
    }
}

impl Rule for EmbedPhaseRule {
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
