//! The patch orchestrator.
//!
//! `Idle -> Snapshotting -> Patching -> Persisting -> Done`. Any error after the snapshot restores
//! the descriptor from its backup and ends the run in `RolledBack`; an error before it ends the
//! run in `RolledBack` with nothing to restore. A failed restore leaves the state where the run
//! stopped and surfaces as [`PatchError::RollbackFailed`].

use crate::error::PatchError;
use crate::lock::PatchLock;
use crate::ports::DescriptorStore;
use crate::settings::PatchSettings;
use crate::snapshot::{Snapshot, SnapshotManager};
use chrono::Utc;
use pbxpatch_domain::{Rule, RuleContext, builtin_rules, run_rules};
use pbxpatch_edit::{
    DanglingReference, IdSource, RandomIds, check_references, render_patch, sha256_hex,
};
use pbxpatch_types::{PatchReport, RunState, ToolInfo};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Rule name attached to failures of the post-patch reference scan.
pub const INTEGRITY_CHECK: &str = "integrity";

/// A failed run: the error plus the report as far as the run got.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    pub error: PatchError,
    pub report: Box<PatchReport>,
}

impl RunFailure {
    pub fn exit_code(&self) -> u8 {
        self.error.exit_code()
    }
}

pub struct Orchestrator<'a> {
    store: &'a dyn DescriptorStore,
    rules: Vec<Box<dyn Rule>>,
    ids: Box<dyn IdSource>,
}

impl<'a> Orchestrator<'a> {
    /// Built-in rules with random object IDs.
    pub fn new(store: &'a dyn DescriptorStore) -> Self {
        Self {
            store,
            rules: builtin_rules(),
            ids: Box::new(RandomIds),
        }
    }

    pub fn with_rules(mut self, rules: Vec<Box<dyn Rule>>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_ids(mut self, ids: Box<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    /// Run every rule against the descriptor named by `settings` and persist the result.
    pub fn apply(
        &mut self,
        settings: &PatchSettings,
        tool: ToolInfo,
    ) -> Result<PatchReport, RunFailure> {
        let descriptor = settings.descriptor.as_path();
        let mut report = PatchReport::new(tool, descriptor.as_str(), settings.dry_run);
        report.started_at = Some(Utc::now());

        let lock = match PatchLock::acquire(self.store, descriptor) {
            Ok(lock) => lock,
            Err(error) => return Err(abort(report, error)),
        };
        let snapshots = SnapshotManager::new(self.store, settings.backup_suffix.as_str());

        transition(&mut report, RunState::Snapshotting);
        let snapshot = if settings.dry_run {
            snapshots.capture(descriptor)
        } else {
            snapshots.begin(descriptor)
        };
        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(error) => return Err(abort(report, error)),
        };
        report.backup = snapshot.backup().map(ToString::to_string);
        report.sha256_before = Some(snapshot.sha256().to_string());

        let outcome = self.patch_and_persist(&snapshot, settings, &mut report);
        let result = match outcome {
            Ok(()) => {
                transition(&mut report, RunState::Done);
                snapshots.commit(snapshot);
                info!(
                    descriptor = %descriptor,
                    applied = report.applied_rules().count(),
                    changed = report.changed,
                    dry_run = settings.dry_run,
                    "patch run complete"
                );
                Ok(report)
            }
            Err(error) if settings.dry_run => Err(abort(report, error)),
            Err(error) => match snapshots.restore(&snapshot) {
                Ok(()) => Err(abort(report, error)),
                Err(source) => {
                    warn!(descriptor = %descriptor, error = %source, "rollback failed");
                    report.ended_at = Some(Utc::now());
                    Err(RunFailure {
                        error: PatchError::RollbackFailed {
                            cause: Box::new(error),
                            source,
                        },
                        report: Box::new(report),
                    })
                }
            },
        };
        drop(lock);
        result.map(|mut report| {
            report.ended_at = Some(Utc::now());
            report
        })
    }

    fn patch_and_persist(
        &mut self,
        snapshot: &Snapshot,
        settings: &PatchSettings,
        report: &mut PatchReport,
    ) -> Result<(), PatchError> {
        transition(report, RunState::Patching);
        let original = snapshot.text()?;
        let mut ctx = RuleContext {
            profile: &settings.profile,
            ids: self.ids.as_mut(),
        };
        let run = run_rules(&self.rules, original, &mut ctx)?;
        report.rules = run.records;

        check_integrity(original, &run.text)?;

        report.sha256_after = Some(sha256_hex(run.text.as_bytes()));
        report.changed = run.text != original;
        report.patch = render_patch(settings.descriptor_display().as_str(), original, &run.text);

        transition(report, RunState::Persisting);
        if settings.dry_run {
            debug!("dry run: descriptor not written");
        } else if report.changed {
            self.store
                .write(&settings.descriptor, run.text.as_bytes())
                .map_err(|e| PatchError::io(&settings.descriptor, e))?;
            info!(
                descriptor = %settings.descriptor,
                bytes = run.text.len(),
                "descriptor written"
            );
        } else {
            info!(descriptor = %settings.descriptor, "descriptor already patched");
        }
        Ok(())
    }
}

fn transition(report: &mut PatchReport, next: RunState) {
    debug_assert!(
        report.state.can_transition_to(next),
        "illegal transition {} -> {}",
        report.state.as_str(),
        next.as_str()
    );
    debug!(from = report.state.as_str(), to = next.as_str(), "state transition");
    report.state = next;
}

fn abort(mut report: PatchReport, error: PatchError) -> RunFailure {
    warn!(state = report.state.as_str(), error = %error, "patch run rolled back");
    transition(&mut report, RunState::RolledBack);
    report.ended_at = Some(Utc::now());
    RunFailure {
        error,
        report: Box::new(report),
    }
}

/// Fail on references the rules left dangling. References that were already dangling in the
/// original descriptor are logged but tolerated.
fn check_integrity(before: &str, after: &str) -> Result<(), PatchError> {
    let scan = |text: &str| {
        check_references(text).map_err(|e| PatchError::from_match(INTEGRITY_CHECK, e))
    };
    let baseline = scan(before)?;
    if !baseline.is_empty() {
        warn!(count = baseline.len(), "descriptor already had dangling references");
    }
    let same = |a: &DanglingReference, b: &DanglingReference| {
        a.from == b.from && a.property == b.property && a.id == b.id
    };
    let introduced: Vec<DanglingReference> = scan(after)?
        .into_iter()
        .filter(|r| !baseline.iter().any(|b| same(b, r)))
        .collect();
    if introduced.is_empty() {
        Ok(())
    } else {
        Err(PatchError::DanglingReference {
            references: introduced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_OBJECTS: &str = "// !$*UTF8*$!\n{\n\tobjects = {\n\n/* Begin PBXGroup section */\n\t\tAAA = {isa = PBXGroup; children = (BBB, ); };\n\t\tBBB = {isa = PBXGroup; children = (); };\n/* End PBXGroup section */\n\t};\n\trootObject = AAA;\n}\n";

    #[test]
    fn integrity_flags_new_dangling_reference() {
        let after = TWO_OBJECTS.replace("children = (BBB, )", "children = (BBB, CCC, )");
        let err = check_integrity(TWO_OBJECTS, &after).unwrap_err();
        match err {
            PatchError::DanglingReference { references } => {
                assert_eq!(references.len(), 1);
                assert_eq!(references[0].id, "CCC");
                assert_eq!(references[0].from, "AAA");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn integrity_tolerates_preexisting_dangling_reference() {
        let before = TWO_OBJECTS.replace("children = (BBB, )", "children = (BBB, ZZZ, )");
        assert!(check_integrity(&before, &before).is_ok());
    }

    #[test]
    fn transition_moves_report_state() {
        let mut report = PatchReport::new(
            ToolInfo {
                name: "pbxpatch".to_string(),
                version: None,
            },
            "p",
            false,
        );
        transition(&mut report, RunState::Snapshotting);
        assert_eq!(report.state, RunState::Snapshotting);
        let failure = abort(report, PatchError::ConcurrentPatchInProgress { lock: "l".into() });
        assert_eq!(failure.report.state, RunState::RolledBack);
        assert!(failure.report.ended_at.is_some());
    }
}
