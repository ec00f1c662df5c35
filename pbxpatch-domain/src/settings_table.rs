//! Canonical build settings for the extension target.
//!
//! The table is fixed and versioned. Bump [`SETTINGS_TABLE_VERSION`] whenever an entry changes
//! so receipts from older runs can be told apart.

use crate::profile::{ConfigurationKind, ExtensionProfile};
use pbxpatch_edit::format::{NewValue, quote};
use std::collections::BTreeMap;

pub const SETTINGS_TABLE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Scalar(String),
    List(Vec<String>),
}

impl SettingValue {
    fn to_new_value(&self) -> NewValue {
        match self {
            SettingValue::Scalar(s) => NewValue::text(s),
            SettingValue::List(items) => NewValue::List(items.iter().map(|s| quote(s)).collect()),
        }
    }
}

const COMMON_FLAGS: &[(&str, &str)] = &[
    ("ASSETCATALOG_COMPILER_GENERATE_SWIFT_ASSET_SYMBOL_EXTENSIONS", "YES"),
    ("CLANG_ANALYZER_NONNULL", "YES"),
    ("CLANG_ANALYZER_NUMBER_OBJECT_CONVERSION", "YES_AGGRESSIVE"),
    ("CLANG_CXX_LANGUAGE_STANDARD", "gnu++20"),
    ("CLANG_ENABLE_MODULES", "YES"),
    ("CLANG_ENABLE_OBJC_ARC", "YES"),
    ("CLANG_ENABLE_OBJC_WEAK", "YES"),
    ("CLANG_WARN_BLOCK_CAPTURE_AUTORELEASING", "YES"),
    ("CLANG_WARN_BOOL_CONVERSION", "YES"),
    ("CLANG_WARN_COMMA", "YES"),
    ("CLANG_WARN_CONSTANT_CONVERSION", "YES"),
    ("CLANG_WARN_DEPRECATED_OBJC_IMPLEMENTATIONS", "YES"),
    ("CLANG_WARN_DIRECT_OBJC_ISA_USAGE", "YES_ERROR"),
    ("CLANG_WARN_DOCUMENTATION_COMMENTS", "YES"),
    ("CLANG_WARN_EMPTY_BODY", "YES"),
    ("CLANG_WARN_ENUM_CONVERSION", "YES"),
    ("CLANG_WARN_INFINITE_RECURSION", "YES"),
    ("CLANG_WARN_INT_CONVERSION", "YES"),
    ("CLANG_WARN_NON_LITERAL_NULL_CONVERSION", "YES"),
    ("CLANG_WARN_OBJC_IMPLICIT_RETAIN_SELF", "YES"),
    ("CLANG_WARN_OBJC_LITERAL_CONVERSION", "YES"),
    ("CLANG_WARN_OBJC_ROOT_CLASS", "YES_ERROR"),
    ("CLANG_WARN_QUOTED_INCLUDE_IN_FRAMEWORK_HEADER", "YES"),
    ("CLANG_WARN_RANGE_LOOP_ANALYSIS", "YES"),
    ("CLANG_WARN_STRICT_PROTOTYPES", "YES"),
    ("CLANG_WARN_SUSPICIOUS_MOVE", "YES"),
    ("CLANG_WARN_UNGUARDED_AVAILABILITY", "YES_AGGRESSIVE"),
    ("CLANG_WARN_UNREACHABLE_CODE", "YES"),
    // Misspelled upstream; the toolchain accepts it as written.
    ("CLANG_WARN_UNUSUED_VARIABLE", "YES"),
    ("ENABLE_STRICT_OBJC_MSGSEND", "YES"),
    ("GCC_C_LANGUAGE_STANDARD", "gnu17"),
    ("GCC_NO_COMMON_BLOCKS", "YES"),
    ("GCC_WARN_64_TO_32_BIT_CONVERSION", "YES"),
    ("GCC_WARN_ABOUT_RETURN_TYPE", "YES_ERROR"),
    ("GCC_WARN_UNDECLARED_SELECTOR", "YES"),
    ("GCC_WARN_UNINITIALIZED_AUTOS", "YES_AGGRESSIVE"),
    ("GCC_WARN_UNUSED_FUNCTION", "YES"),
    ("GCC_WARN_UNUSED_VARIABLE", "YES"),
    ("GENERATE_INFOPLIST_FILE", "YES"),
    ("INFOPLIST_KEY_NSHumanReadableCopyright", ""),
    ("MTL_ENABLE_DEBUG_INFO", "INCLUDE_SOURCE"),
    ("MTL_FAST_MATH", "YES"),
    ("SKIP_INSTALL", "YES"),
    ("SWIFT_EMIT_LOC_STRINGS", "YES"),
    ("SWIFT_VERSION", "5.0"),
    ("TARGETED_DEVICE_FAMILY", "1,2"),
];

const DEBUG_FLAGS: &[(&str, &str)] = &[
    ("DEBUG_INFORMATION_FORMAT", "dwarf"),
    ("ENABLE_TESTABILITY", "YES"),
    ("GCC_DYNAMIC_NO_PIC", "NO"),
    ("GCC_OPTIMIZATION_LEVEL", "0"),
    ("ONLY_ACTIVE_ARCH", "YES"),
    ("SWIFT_ACTIVE_COMPILATION_CONDITIONS", "DEBUG $(inherited)"),
    ("SWIFT_OPTIMIZATION_LEVEL", "-Onone"),
];

const RELEASE_FLAGS: &[(&str, &str)] = &[
    ("COPY_PHASE_STRIP", "NO"),
    ("DEBUG_INFORMATION_FORMAT", "dwarf-with-dsym"),
    ("ENABLE_NS_ASSERTIONS", "NO"),
    ("MTL_ENABLE_DEBUG_INFO", "NO"),
    ("SWIFT_COMPILATION_MODE", "wholemodule"),
];

fn scalars(table: &[(&str, &str)], into: &mut BTreeMap<String, SettingValue>) {
    for (k, v) in table {
        into.insert(k.to_string(), SettingValue::Scalar(v.to_string()));
    }
}

/// The complete settings for one configuration. Configuration-specific entries win.
pub fn canonical_settings(
    profile: &ExtensionProfile,
    kind: ConfigurationKind,
) -> BTreeMap<String, SettingValue> {
    let mut out = BTreeMap::new();
    scalars(COMMON_FLAGS, &mut out);

    let s = |v: &str| SettingValue::Scalar(v.to_string());
    out.insert("CODE_SIGN_ENTITLEMENTS".into(), s(&profile.entitlements));
    out.insert("CODE_SIGN_STYLE".into(), s(&profile.code_sign_style));
    out.insert("CURRENT_PROJECT_VERSION".into(), s(&profile.build_version));
    out.insert("DEVELOPMENT_TEAM".into(), s(&profile.development_team));
    out.insert("INFOPLIST_FILE".into(), s(&profile.info_plist));
    out.insert(
        "INFOPLIST_KEY_CFBundleDisplayName".into(),
        s(&profile.display_name),
    );
    out.insert(
        "IPHONEOS_DEPLOYMENT_TARGET".into(),
        s(&profile.ios_deployment_target),
    );
    out.insert(
        "LD_RUNPATH_SEARCH_PATHS".into(),
        SettingValue::List(vec![
            "$(inherited)".to_string(),
            "@executable_path/Frameworks".to_string(),
            "@executable_path/../../Frameworks".to_string(),
        ]),
    );
    out.insert(
        "MACOSX_DEPLOYMENT_TARGET".into(),
        s(&profile.macos_deployment_target),
    );
    out.insert("MARKETING_VERSION".into(), s(&profile.marketing_version));
    out.insert(
        "PRODUCT_BUNDLE_IDENTIFIER".into(),
        s(&profile.bundle_identifier),
    );
    out.insert("PRODUCT_NAME".into(), s(&profile.product_name));
    out.insert(
        "SUPPORTED_PLATFORMS".into(),
        s(&profile.supported_platforms),
    );

    match kind {
        ConfigurationKind::Debug => {
            scalars(DEBUG_FLAGS, &mut out);
            out.insert(
                "GCC_PREPROCESSOR_DEFINITIONS".into(),
                SettingValue::List(vec!["DEBUG=1".to_string(), "$(inherited)".to_string()]),
            );
        }
        ConfigurationKind::Release => scalars(RELEASE_FLAGS, &mut out),
    }
    out
}

/// The table as a `buildSettings` dictionary value, keys sorted.
pub fn settings_value(profile: &ExtensionProfile, kind: ConfigurationKind) -> NewValue {
    NewValue::Dict(
        canonical_settings(profile, kind)
            .iter()
            .map(|(k, v)| (k.clone(), v.to_new_value()))
            .collect(),
    )
}
