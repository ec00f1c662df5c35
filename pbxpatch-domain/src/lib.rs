//! Domain logic: which structural edits embed an app extension in its host project.
//!
//! This crate owns *what* is changed. Locating and splicing text is the `pbxpatch-edit`
//! crate's job; running rules safely against a file on disk belongs to `pbxpatch-core`.

pub mod metadata_overrides;
pub mod profile;
pub mod rules;
pub mod settings_table;

pub use metadata_overrides::share_extension_overrides;
pub use profile::{ConfigurationKind, ConfigurationTarget, ExtensionProfile, PathRewrite, ProfileError};
pub use rules::{Rule, RuleContext, RuleError, RuleErrorKind, RuleRun, builtin_rules, run_rules};
pub use settings_table::SETTINGS_TABLE_VERSION;
