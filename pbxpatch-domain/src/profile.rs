//! The extension profile: which objects to patch and the canonical values written into them.

use pbxpatch_types::ObjectId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigurationKind {
    Debug,
    Release,
}

impl ConfigurationKind {
    /// The configuration `name` the toolchain uses.
    pub fn name(self) -> &'static str {
        match self {
            ConfigurationKind::Debug => "Debug",
            ConfigurationKind::Release => "Release",
        }
    }
}

/// One extension build configuration object to rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigurationTarget {
    pub id: String,
    pub kind: ConfigurationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathRewrite {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("profile field `{field}` is not a valid object id: {value:?}")]
    InvalidId { field: &'static str, value: String },

    #[error("profile field `{field}` must not be empty")]
    Empty { field: &'static str },

    #[error("profile resource_exclusion_pattern is not a valid regex: {0}")]
    Pattern(String),

    #[error("profile lists configuration {id} more than once")]
    DuplicateConfiguration { id: String },
}

/// Everything the rules need to know about the host app and its extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionProfile {
    /// Native target of the host application.
    pub host_target: String,
    /// Native target of the extension.
    pub extension_target: String,
    /// Extension build configurations whose settings are replaced.
    pub configurations: Vec<ConfigurationTarget>,
    /// Synchronized root group holding the host's sources.
    pub host_sync_group: String,

    pub bundle_identifier: String,
    pub display_name: String,
    pub info_plist: String,
    pub entitlements: String,
    pub code_sign_style: String,
    pub development_team: String,
    pub ios_deployment_target: String,
    pub macos_deployment_target: String,
    pub product_name: String,
    pub supported_platforms: String,
    pub marketing_version: String,
    pub build_version: String,

    pub path_rewrites: Vec<PathRewrite>,
    /// Matched against the file name of each entry in the host resources phase.
    pub resource_exclusion_pattern: String,
    /// Folder inside the host sync group that belongs to the extension instead.
    pub excluded_subtree: String,
    pub embed_phase_name: String,

    /// Files (relative to the project root) that must exist before patching.
    pub required_sources: Vec<String>,
    pub app_group: String,
    /// Host entitlements file (relative to the project root).
    pub host_entitlements: String,
}

impl Default for ExtensionProfile {
    fn default() -> Self {
        let rewrite = |from: &str, to: &str| PathRewrite {
            from: from.to_string(),
            to: to.to_string(),
        };
        Self {
            host_target: "3AC7BF752E4900DF00D7AA35".to_string(),
            extension_target: "5FEXTTGT0001".to_string(),
            configurations: vec![
                ConfigurationTarget {
                    id: "5FEXTDBG0001".to_string(),
                    kind: ConfigurationKind::Debug,
                },
                ConfigurationTarget {
                    id: "5FEXTREL0001".to_string(),
                    kind: ConfigurationKind::Release,
                },
            ],
            host_sync_group: "5FMAINGRP0001".to_string(),
            bundle_identifier: "app.hamrah.ios.ShareExtension".to_string(),
            display_name: "Hamrah Share".to_string(),
            info_plist: "ShareExtension/Sources/Info.plist".to_string(),
            entitlements: "ShareExtension/Sources/ShareExtension.entitlements".to_string(),
            code_sign_style: "Automatic".to_string(),
            development_team: String::new(),
            ios_deployment_target: "17.0".to_string(),
            macos_deployment_target: "14.0".to_string(),
            product_name: "$(TARGET_NAME)".to_string(),
            supported_platforms: "iphoneos iphonesimulator macosx".to_string(),
            marketing_version: "1.0".to_string(),
            build_version: "1".to_string(),
            path_rewrites: vec![
                rewrite(
                    "hamrah-ios/ShareExtension/ShareViewController.swift",
                    "ShareExtension/Sources/ShareViewController.swift",
                ),
                rewrite(
                    "hamrah-ios/ShareExtension/Info.plist",
                    "ShareExtension/Sources/Info.plist",
                ),
                rewrite(
                    "hamrah-ios/ShareExtension/Utilities/ShareExtensionDataStack.swift",
                    "ShareExtension/Sources/Utilities/ShareExtensionDataStack.swift",
                ),
            ],
            resource_exclusion_pattern: r"^(Info\.plist|ShareExtension)$".to_string(),
            excluded_subtree: "ShareExtension".to_string(),
            embed_phase_name: "Embed App Extensions".to_string(),
            required_sources: vec![
                "ShareExtension/Sources/ShareViewController.swift".to_string(),
                "ShareExtension/Sources/Info.plist".to_string(),
                "ShareExtension/Sources/ShareExtension.entitlements".to_string(),
                "ShareExtension/Sources/Utilities/ShareExtensionDataStack.swift".to_string(),
            ],
            app_group: "group.app.hamrah.ios".to_string(),
            host_entitlements: "hamrah-ios/hamrah-ios.entitlements".to_string(),
        }
    }
}

impl ExtensionProfile {
    /// Check the profile before any rule sees it.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let check_id = |field: &'static str, value: &str| {
            ObjectId::parse(value)
                .map(|_| ())
                .map_err(|_| ProfileError::InvalidId {
                    field,
                    value: value.to_string(),
                })
        };
        check_id("host_target", &self.host_target)?;
        check_id("extension_target", &self.extension_target)?;
        check_id("host_sync_group", &self.host_sync_group)?;

        let mut seen = Vec::new();
        for c in &self.configurations {
            check_id("configurations.id", &c.id)?;
            if seen.contains(&c.id) {
                return Err(ProfileError::DuplicateConfiguration { id: c.id.clone() });
            }
            seen.push(c.id.clone());
        }

        for (field, value) in [
            ("excluded_subtree", &self.excluded_subtree),
            ("embed_phase_name", &self.embed_phase_name),
            ("bundle_identifier", &self.bundle_identifier),
        ] {
            if value.is_empty() {
                return Err(ProfileError::Empty { field });
            }
        }
        if self.path_rewrites.iter().any(|r| r.from.is_empty()) {
            return Err(ProfileError::Empty {
                field: "path_rewrites.from",
            });
        }

        self.resource_exclusion()?;
        Ok(())
    }

    pub fn resource_exclusion(&self) -> Result<Regex, ProfileError> {
        Regex::new(&self.resource_exclusion_pattern).map_err(|e| ProfileError::Pattern(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_valid() {
        ExtensionProfile::default().validate().unwrap();
    }

    #[test]
    fn default_exclusion_pattern_matches_whole_names() {
        let re = ExtensionProfile::default().resource_exclusion().unwrap();
        assert!(re.is_match("Info.plist"));
        assert!(re.is_match("ShareExtension"));
        assert!(!re.is_match("Assets.xcassets"));
        assert!(!re.is_match("MyInfo.plist"));
    }

    #[test]
    fn rejects_bad_ids_and_patterns() {
        let mut p = ExtensionProfile::default();
        p.host_target = "not an id".to_string();
        assert!(matches!(p.validate(), Err(ProfileError::InvalidId { field: "host_target", .. })));

        let mut p = ExtensionProfile::default();
        p.resource_exclusion_pattern = "(".to_string();
        assert!(matches!(p.validate(), Err(ProfileError::Pattern(_))));

        let mut p = ExtensionProfile::default();
        p.configurations.push(p.configurations[0].clone());
        assert!(matches!(
            p.validate(),
            Err(ProfileError::DuplicateConfiguration { .. })
        ));
    }

    #[test]
    fn partial_profile_fills_defaults() {
        let p: ExtensionProfile = serde_json::from_value(serde_json::json!({
            "display_name": "Other Share",
            "configurations": [{ "id": "AAAA0001", "kind": "debug" }],
        }))
        .unwrap();
        assert_eq!(p.display_name, "Other Share");
        assert_eq!(p.configurations.len(), 1);
        assert_eq!(p.configurations[0].kind, ConfigurationKind::Debug);
        assert_eq!(p.host_target, "3AC7BF752E4900DF00D7AA35");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_value::<ExtensionProfile>(serde_json::json!({
            "host_targte": "X"
        }));
        assert!(err.is_err());
    }
}
