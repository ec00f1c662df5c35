use crate::rules::{Rule, RuleContext, RuleError};
use pbxpatch_edit::paths::replace_path;
use tracing::debug;

/// Rewrites known file paths to their new locations.
pub struct PathReferencesRule;

impl PathReferencesRule {
    pub const NAME: &'static str = "path-references";
    const DESCRIPTION: &'static str =
        "Rewrites literal paths of moved extension files, matching whole values only";
}

impl Rule for PathReferencesRule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn apply(&self, text: &str, ctx: &mut RuleContext<'_>) -> Result<String, RuleError> {
        let mut text = text.to_string();
        for rewrite in &ctx.profile.path_rewrites {
            let (next, count) = replace_path(&text, &rewrite.from, &rewrite.to);
            if count > 0 {
                debug!(from = %rewrite.from, to = %rewrite.to, count, "rewrote path");
            }
            text = next;
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ExtensionProfile;
    use pbxpatch_edit::SequentialIds;

    const BEFORE: &str =
        include_str!("../../../tests/fixtures/share_extension/before/project.pbxproj");

    fn run(text: &str) -> String {
        let profile = ExtensionProfile::default();
        let mut ids = SequentialIds::default();
        let mut ctx = RuleContext {
            profile: &profile,
            ids: &mut ids,
        };
        PathReferencesRule.apply(text, &mut ctx).unwrap()
    }

    #[test]
    fn rewrites_known_paths_and_spares_lookalikes() {
        let out = run(BEFORE);
        // Quoted values keep their quotes.
        assert!(out.contains("path = \"ShareExtension/Sources/ShareViewController.swift\";"));
        assert!(out.contains("path = \"ShareExtension/Sources/Info.plist\";"));
        assert!(out.contains("INFOPLIST_FILE = \"ShareExtension/Sources/Info.plist\";"));
        assert!(out.contains("\"legacy/hamrah-ios/ShareExtension/Info.plist\""));
        assert!(!out.contains("\"hamrah-ios/ShareExtension/ShareViewController.swift\""));
    }

    #[test]
    fn second_run_is_a_noop() {
        let once = run(BEFORE);
        assert_eq!(run(&once), once);
    }
}
