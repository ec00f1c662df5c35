use crate::rules::lookup::{self, CONTAINER_ITEM_PROXY, TARGET_DEPENDENCY};
use crate::rules::{Rule, RuleContext, RuleError};
use pbxpatch_edit::error::MatchResult;
use pbxpatch_edit::format::{NewValue, ObjectBlock, render_reference};
use pbxpatch_edit::{fresh_id, lists, matchers};
use pbxpatch_types::ObjectId;
use tracing::debug;

/// Makes the host target depend on the extension target.
///
/// The edge is `host.dependencies -> PBXTargetDependency -> PBXContainerItemProxy -> extension`.
pub struct DependencyEdgeRule;

impl DependencyEdgeRule {
    pub const NAME: &'static str = "dependency-edge";
    const DESCRIPTION: &'static str =
        "Adds a target dependency (with container proxy) from the host target to the extension";

    fn patch(text: &str, ctx: &mut RuleContext<'_>) -> MatchResult<String> {
        let profile = ctx.profile;
        if lookup::find_dependency_edge(text, profile)?.is_some() {
            debug!("host already depends on the extension");
            return Ok(text.to_string());
        }

        let extension = lookup::require_target(text, &profile.extension_target)?;
        let extension_id = extension.object_id()?;
        let extension_name = lookup::display_name(text, &extension)?;

        // Dependencies listed by other targets belong to them; only an unlisted one is reused.
        let existing = lookup::unlisted_dependency_on(text, &profile.extension_target)?;

        let (mut text, dependency_id) = match existing {
            Some(dep) => (text.to_string(), dep.object_id()?),
            None => Self::create_objects(text, ctx, &extension_id, &extension_name)?,
        };

        let host = lookup::require_target(&text, &profile.host_target)?;
        let entry = render_reference(&dependency_id, Some(TARGET_DEPENDENCY));
        text = match matchers::find_property(&text, &host, "dependencies")? {
            Some(prop) => lists::append_entry(&text, &prop, &entry)?,
            None => matchers::insert_property(
                &text,
                &host,
                "dependencies",
                &NewValue::List(vec![entry]),
            )?,
        };
        Ok(text)
    }

    fn create_objects(
        text: &str,
        ctx: &mut RuleContext<'_>,
        extension_id: &ObjectId,
        extension_name: &str,
    ) -> MatchResult<(String, ObjectId)> {
        let root = matchers::find_root_object(text)?;

        let text = matchers::ensure_section(text, CONTAINER_ITEM_PROXY)?;
        let proxy_id = fresh_id(ctx.ids, &text);
        let proxy = ObjectBlock::new(proxy_id.clone(), CONTAINER_ITEM_PROXY)
            .comment(CONTAINER_ITEM_PROXY)
            .reference("containerPortal", &root, Some("Project object"))
            .scalar("proxyType", "1")
            .scalar("remoteGlobalIDString", extension_id.as_str())
            .text("remoteInfo", extension_name);
        let section = matchers::require_section(&text, CONTAINER_ITEM_PROXY)?;
        let text = matchers::append_object(&text, &section, &proxy.render_multiline());

        let text = matchers::ensure_section(&text, TARGET_DEPENDENCY)?;
        let dependency_id = fresh_id(ctx.ids, &text);
        let dependency = ObjectBlock::new(dependency_id.clone(), TARGET_DEPENDENCY)
            .comment(TARGET_DEPENDENCY)
            .reference("target", extension_id, Some(extension_name))
            .reference("targetProxy", &proxy_id, Some(CONTAINER_ITEM_PROXY));
        let section = matchers::require_section(&text, TARGET_DEPENDENCY)?;
        let text = matchers::append_object(&text, &section, &dependency.render_multiline());

        debug!(proxy = %proxy_id, dependency = %dependency_id, "created dependency objects");
        Ok((text, dependency_id))
    }
}

impl Rule for DependencyEdgeRule {
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
