//! Keys the share extension's Info.plist must carry.

use crate::profile::ExtensionProfile;
use serde_json::{Value, json};

pub const SHARE_SERVICES_EXTENSION_POINT: &str = "com.apple.share-services";

/// Override mapping merged over the extension's existing Info.plist.
pub fn share_extension_overrides(profile: &ExtensionProfile) -> Value {
    json!({
        "CFBundleDisplayName": profile.display_name,
        "CFBundleVersion": profile.build_version,
        "CFBundleShortVersionString": profile.marketing_version,
        "NSExtension": {
            "NSExtensionPointIdentifier": SHARE_SERVICES_EXTENSION_POINT,
            "NSExtensionPrincipalClass": "$(PRODUCT_MODULE_NAME).ShareViewController",
            "NSExtensionAttributes": {
                "NSExtensionActivationSupportsWebURLWithMaxCount": 1,
                "NSExtensionActivationSupportsURLWithMaxCount": 1,
                "NSExtensionActivationSupportsText": true,
                "NSExtensionActivationSupportsAttachmentWithMaxCount": 1,
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_follow_the_profile() {
        let profile = ExtensionProfile {
            display_name: "Other".to_string(),
            ..ExtensionProfile::default()
        };
        let v = share_extension_overrides(&profile);
        assert_eq!(v["CFBundleDisplayName"], "Other");
        assert_eq!(v["CFBundleVersion"], "1");
        assert_eq!(
            v["NSExtension"]["NSExtensionPointIdentifier"],
            SHARE_SERVICES_EXTENSION_POINT
        );
        assert_eq!(
            v["NSExtension"]["NSExtensionAttributes"]["NSExtensionActivationSupportsText"],
            true
        );
    }
}
