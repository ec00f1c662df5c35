use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Orchestrator state machine.
///
/// `Idle -> Snapshotting -> Patching -> Persisting -> Done`, with an error edge from every
/// non-terminal state to `RolledBack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Snapshotting,
    Patching,
    Persisting,
    Done,
    RolledBack,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::RolledBack)
    }

    /// Whether `self -> next` is an edge of the state machine.
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Idle, Snapshotting) | (Snapshotting, Patching) | (Patching, Persisting) => true,
            (Persisting, Done) => true,
            (from, RolledBack) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Snapshotting => "snapshotting",
            RunState::Patching => "patching",
            RunState::Persisting => "persisting",
            RunState::Done => "done",
            RunState::RolledBack => "rolled_back",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    /// The rule changed the descriptor text.
    Applied,
    /// The descriptor already satisfied the rule.
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub name: String,
    pub status: RuleStatus,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchReport {
    pub schema: String,
    pub tool: ToolInfo,
    pub descriptor: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,

    pub dry_run: bool,
    pub state: RunState,

    #[serde(default)]
    pub rules: Vec<RuleRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_after: Option<String>,

    /// Whether the descriptor was (or, in a dry run, would be) rewritten.
    pub changed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    /// Unified diff between the original and patched descriptor.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub patch: String,
}

impl PatchReport {
    pub fn new(tool: ToolInfo, descriptor: impl Into<String>, dry_run: bool) -> Self {
        Self {
            schema: crate::schema::PBXPATCH_REPORT_V1.to_string(),
            tool,
            descriptor: descriptor.into(),
            backup: None,
            dry_run,
            state: RunState::Idle,
            rules: vec![],
            sha256_before: None,
            sha256_after: None,
            changed: false,
            started_at: None,
            ended_at: None,
            patch: String::new(),
        }
    }

    pub fn applied_rules(&self) -> impl Iterator<Item = &str> {
        self.rules_with(RuleStatus::Applied)
    }

    pub fn noop_rules(&self) -> impl Iterator<Item = &str> {
        self.rules_with(RuleStatus::Noop)
    }

    fn rules_with(&self, status: RuleStatus) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter(move |r| r.status == status)
            .map(|r| r.name.as_str())
    }
}
