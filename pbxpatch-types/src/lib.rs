//! Shared types for pbxpatch.
//!
//! - [`id::ObjectId`]: the cross-reference key between descriptor objects.
//! - [`report`]: the structured outcome of one patch run.

pub mod id;
pub mod report;

pub mod schema {
    pub const PBXPATCH_REPORT_V1: &str = "pbxpatch.report.v1";
}

pub use id::{InvalidObjectId, ObjectId};
pub use report::{PatchReport, RuleRecord, RuleStatus, RunState, ToolInfo};
