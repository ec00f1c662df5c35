//! Golden fixture tests for the rule pipeline.
//!
//! Each fixture under `tests/fixtures/<name>/` contains:
//!
//! - `before/project.pbxproj` - the descriptor as found
//! - `expected/project.pbxproj` - the descriptor after all built-in rules
//! - `expected/rules.json` - per-rule status
//!
//! Missing expected files are written on first run (bootstrap mode). Set `PBXPATCH_BLESS=1`
//! (or run `cargo xtask bless-fixtures`) to regenerate them after an intended change.

use fs_err as fs;
use pbxpatch_domain::{ExtensionProfile, RuleContext, builtin_rules, run_rules};
use pbxpatch_edit::{SequentialIds, check_references};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

fn fixtures_dir() -> PathBuf {
    // Fixtures live at the workspace root, beside this crate.
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .expect("workspace root")
        .join("tests")
        .join("fixtures")
}

fn bless() -> bool {
    std::env::var("PBXPATCH_BLESS").is_ok_and(|v| v == "1")
}

fn run_fixture_test(fixture_name: &str) {
    let fixture_path = fixtures_dir().join(fixture_name);
    assert!(
        fixture_path.exists(),
        "Fixture directory does not exist: {}",
        fixture_path.display()
    );

    let before = fs::read_to_string(fixture_path.join("before").join("project.pbxproj"))
        .expect("read before descriptor");

    let profile = ExtensionProfile::default();
    let mut ids = SequentialIds::default();
    let mut ctx = RuleContext {
        profile: &profile,
        ids: &mut ids,
    };
    let run = run_rules(&builtin_rules(), &before, &mut ctx).expect("rules succeed");

    assert_eq!(
        check_references(&run.text).expect("integrity scan"),
        vec![],
        "patched descriptor has dangling references"
    );

    let statuses: serde_json::Value = run
        .records
        .iter()
        .map(|r| (r.name.clone(), serde_json::to_value(r.status).expect("status")))
        .collect::<serde_json::Map<_, _>>()
        .into();

    let expected_dir = fixture_path.join("expected");
    let expected_descriptor = expected_dir.join("project.pbxproj");
    let expected_rules = expected_dir.join("rules.json");

    if expected_descriptor.exists() && expected_rules.exists() && !bless() {
        let expected = fs::read_to_string(&expected_descriptor).expect("read expected descriptor");
        assert_eq!(
            run.text, expected,
            "Descriptor mismatch for fixture '{}'",
            fixture_name
        );
        let expected_statuses: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&expected_rules).expect("read rules.json"))
                .expect("valid rules.json");
        assert_eq!(
            statuses, expected_statuses,
            "Rule statuses mismatch for fixture '{}'",
            fixture_name
        );
    } else {
        // Write the expected files for first run (bootstrap mode)
        fs::create_dir_all(&expected_dir).expect("create expected dir");
        fs::write(&expected_descriptor, &run.text).expect("write expected descriptor");
        let rules = serde_json::to_string_pretty(&statuses).expect("serialize statuses");
        fs::write(&expected_rules, rules + "\n").expect("write rules.json");
        println!(
            "Created expected output for '{}' at {}",
            fixture_name,
            expected_dir.display()
        );
    }

    // A second pass over the patched descriptor changes nothing.
    let mut ids = SequentialIds::default();
    let mut ctx = RuleContext {
        profile: &profile,
        ids: &mut ids,
    };
    let again = run_rules(&builtin_rules(), &run.text, &mut ctx).expect("second pass succeeds");
    assert_eq!(again.text, run.text, "second pass changed '{}'", fixture_name);
    assert!(
        again
            .records
            .iter()
            .all(|r| r.status == pbxpatch_types::RuleStatus::Noop),
        "second pass reported applied rules for '{}'",
        fixture_name
    );
}

#[test]
fn golden_share_extension() {
    run_fixture_test("share_extension");
}
