//! Metadata files that sit beside the project descriptor.
//!
//! Info.plist and entitlement files are loaded into a nested mapping, merged with an override
//! set, and written back in the encoding they came from. JSON, YAML and TOML files are handled
//! the same way.

pub mod document;
pub mod entitlements;
pub mod error;
pub mod format;
pub mod merge;

pub use document::{MetadataDocument, merge_file};
pub use entitlements::{APPLICATION_GROUPS_KEY, AppGroupCheck, check_app_group};
pub use error::{MetadataError, MetadataResult};
pub use format::MetadataFormat;
pub use merge::{merge, merge_in_place};
