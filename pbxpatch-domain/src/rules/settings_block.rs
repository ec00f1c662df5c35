use crate::rules::lookup::{self, BUILD_CONFIGURATION};
use crate::rules::{Rule, RuleContext, RuleError};
use crate::settings_table::settings_value;
use pbxpatch_edit::MatchError;
use pbxpatch_edit::error::MatchResult;
use pbxpatch_edit::matchers;
use pbxpatch_edit::scan;
use tracing::debug;

/// Replaces each extension configuration's `buildSettings` with the canonical table.
pub struct SettingsBlockRule;

impl SettingsBlockRule {
    pub const NAME: &'static str = "settings-block";
    const DESCRIPTION: &'static str =
        "Replaces the extension's per-configuration buildSettings with the canonical table";

    fn patch(text: &str, ctx: &RuleContext<'_>) -> MatchResult<String> {
        let mut text = text.to_string();
        for target in &ctx.profile.configurations {
            let obj = lookup::require_kind(&text, &target.id, BUILD_CONFIGURATION)?;
            let name = lookup::scalar(&text, &obj, "name")?;
            if name.as_deref() != Some(target.kind.name()) {
                return Err(MatchError::not_found_at(
                    format!("name = {} in {}", target.kind.name(), target.id),
                    obj.open,
                ));
            }

            let settings = matchers::require_property(&text, &obj, "buildSettings")?;
            if !settings.is_dict(&text) {
                return Err(MatchError::not_found_at(
                    format!("buildSettings dictionary in {}", target.id),
                    settings.value.start,
                ));
            }

            let indent = scan::indent_at(&text, settings.key_start).to_string();
            let rendered = settings_value(ctx.profile, target.kind).render_multiline(&indent);
            if settings.raw(&text) == rendered {
                debug!(configuration = %target.id, "settings already canonical");
                continue;
            }
            text = matchers::replace_value(&text, &settings, &rendered);
        }
        Ok(text)
    }
}

impl Rule for SettingsBlockRule {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ExtensionProfile;
    use pbxpatch_edit::SequentialIds;

    const BEFORE: &str =
        include_str!("../../../tests/fixtures/share_extension/before/project.pbxproj");

    fn run(text: &str, profile: &ExtensionProfile) -> Result<String, RuleError> {
        let mut ids = SequentialIds::default();
        let mut ctx = RuleContext {
            profile,
            ids: &mut ids,
        };
        SettingsBlockRule.apply(text, &mut ctx)
    }

    fn settings_of(text: &str, id: &str) -> String {
        let obj = matchers::require_object(text, id).unwrap();
        matchers::require_property(text, &obj, "buildSettings")
            .unwrap()
            .raw(text)
            .to_string()
    }

    #[test]
    fn replaces_the_whole_block() {
        let out = run(BEFORE, &ExtensionProfile::default()).unwrap();
        let debug = settings_of(&out, "5FEXTDBG0001");
        assert!(!debug.contains("STALE_LEFTOVER_SETTING"));
        assert!(debug.contains("SWIFT_OPTIMIZATION_LEVEL = \"-Onone\";"));
        assert!(debug.contains("PRODUCT_BUNDLE_IDENTIFIER = app.hamrah.ios.ShareExtension;"));
        let release = settings_of(&out, "5FEXTREL0001");
        assert!(release.contains("SWIFT_COMPILATION_MODE = wholemodule;"));
        assert!(release.contains("DEBUG_INFORMATION_FORMAT = \"dwarf-with-dsym\";"));
    }

    #[test]
    fn other_blocks_are_untouched() {
        let out = run(BEFORE, &ExtensionProfile::default()).unwrap();
        for id in [
            "3AC7BF8D2E4900DF00D7AA35",
            "3AC7BF912E4900DF00D7AA35",
            "3AC7BF942E4900DF00D7AA35",
        ] {
            assert_eq!(settings_of(&out, id), settings_of(BEFORE, id));
        }
    }

    #[test]
    fn second_run_is_a_noop() {
        let once = run(BEFORE, &ExtensionProfile::default()).unwrap();
        let twice = run(&once, &ExtensionProfile::default()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn anchor_must_be_a_build_configuration_with_matching_name() {
        let mut profile = ExtensionProfile::default();
        profile.configurations[0].id = "5FEXTTGT0001".to_string();
        let err = run(BEFORE, &profile).unwrap_err();
        assert_eq!(err.rule, "settings-block");
        assert!(err.to_string().contains("XCBuildConfiguration"));

        let mut profile = ExtensionProfile::default();
        profile.configurations[0].kind = crate::profile::ConfigurationKind::Release;
        let err = run(BEFORE, &profile).unwrap_err();
        assert!(err.to_string().contains("name = Release in 5FEXTDBG0001"));
    }

    #[test]
    fn missing_configuration_is_anchor_not_found() {
        let mut profile = ExtensionProfile::default();
        profile.configurations[0].id = "DEADBEEF0001".to_string();
        let err = run(BEFORE, &profile).unwrap_err();
        assert!(matches!(
            err.kind,
            crate::rules::RuleErrorKind::Match(MatchError::AnchorNotFound { .. })
        ));
    }
}
