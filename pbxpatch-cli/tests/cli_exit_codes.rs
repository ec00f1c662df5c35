//! Exit codes and output of the `pbxpatch` binary against an on-disk project.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use tempfile::TempDir;

const BEFORE: &str = include_str!("../../tests/fixtures/share_extension/before/project.pbxproj");
const DESCRIPTOR: &str = "hamrah-ios.xcodeproj/project.pbxproj";

const SOURCES: &[&str] = &[
    "ShareExtension/Sources/ShareViewController.swift",
    "ShareExtension/Sources/ShareExtension.entitlements",
    "ShareExtension/Sources/Utilities/ShareExtensionDataStack.swift",
];

const INFO_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>CFBundleDisplayName</key>
	<string>Old Name</string>
	<key>CFBundleIdentifier</key>
	<string>$(PRODUCT_BUNDLE_IDENTIFIER)</string>
</dict>
</plist>
"#;

fn pbxpatch() -> Command {
    Command::cargo_bin("pbxpatch").unwrap()
}

struct Project {
    _temp: TempDir,
    root: PathBuf,
}

impl Project {
    /// Fixture descriptor plus every required extension source.
    fn new(descriptor: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let project = Self { _temp: temp, root };
        project.write(DESCRIPTOR, descriptor);
        for source in SOURCES {
            project.write(source, "");
        }
        project.write("ShareExtension/Sources/Info.plist", INFO_PLIST);
        project
    }

    fn write(&self, rel: &str, contents: &str) {
        let path = self.root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.root.join(rel)).unwrap()
    }

    fn exists(&self, rel: &str) -> bool {
        self.root.join(rel).exists()
    }

    fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        let mut cmd = pbxpatch();
        if let Some((first, rest)) = args.split_first() {
            cmd.arg(first).arg(&self.root).args(rest);
        } else {
            cmd.arg(&self.root);
        }
        cmd.assert()
    }

    fn patch(&self, flags: &[&str]) -> assert_cmd::assert::Assert {
        pbxpatch().arg(&self.root).args(flags).assert()
    }
}

#[test]
fn help_lists_subcommands() {
    pbxpatch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("merge-metadata"))
        .stdout(predicate::str::contains("check-entitlements"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn patch_succeeds_then_changes_nothing() {
    let project = Project::new(BEFORE);

    project
        .patch(&[])
        .code(0)
        .stdout(predicate::str::contains("state: done"))
        .stdout(predicate::str::contains("descriptor: changed"));
    let patched = project.read(DESCRIPTOR);
    assert_ne!(patched, BEFORE);
    assert_eq!(project.read(&format!("{DESCRIPTOR}.backup")), BEFORE);
    assert!(!project.exists(&format!("{DESCRIPTOR}.lock")));

    project
        .patch(&[])
        .code(0)
        .stdout(predicate::str::contains("descriptor: unchanged"));
    assert_eq!(project.read(DESCRIPTOR), patched);
    // The second run snapshots the already patched descriptor.
    assert_eq!(project.read(&format!("{DESCRIPTOR}.backup")), patched);
    assert!(!project.exists(&format!("{DESCRIPTOR}.lock")));
}

#[test]
fn dry_run_leaves_descriptor_alone() {
    let project = Project::new(BEFORE);

    project
        .patch(&["--dry-run"])
        .code(0)
        .stdout(predicate::str::contains("(dry run)"))
        .stdout(predicate::str::contains("descriptor: would change"));
    assert_eq!(project.read(DESCRIPTOR), BEFORE);
    assert!(!project.exists(&format!("{DESCRIPTOR}.backup")));
}

#[test]
fn missing_sources_exit_with_validation_failure() {
    let project = Project::new(BEFORE);
    std::fs::remove_file(project.root.join(SOURCES[0])).unwrap();

    project
        .patch(&[])
        .code(1)
        .stderr(predicate::str::contains("ShareViewController.swift"));
    assert_eq!(project.read(DESCRIPTOR), BEFORE);
    assert!(!project.exists(&format!("{DESCRIPTOR}.backup")));
}

#[test]
fn missing_project_is_a_validation_failure() {
    let temp = TempDir::new().unwrap();
    pbxpatch()
        .arg(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no .xcodeproj found"));
}

#[test]
fn bad_profile_is_a_validation_failure() {
    let project = Project::new(BEFORE);
    project.write("pbxpatch.toml", "[profile]\nhost_target = \"\"\n");

    project
        .patch(&[])
        .code(1)
        .stderr(predicate::str::contains("invalid [profile]"));
    assert_eq!(project.read(DESCRIPTOR), BEFORE);
}

#[test]
fn rule_failure_rolls_back_with_exit_2() {
    let broken = BEFORE.replace(
        "\t\t\tproductReference = 5FEXTPRD0001 /* HamrahShare.appex */;\n",
        "",
    );
    let project = Project::new(&broken);

    project
        .patch(&[])
        .code(2)
        .stdout(predicate::str::contains("state: rolled_back"))
        .stdout(predicate::str::contains("failed rule: embed-file"))
        .stdout(predicate::str::contains("exit code: 2"));
    assert_eq!(project.read(DESCRIPTOR), broken);
    assert!(!project.exists(&format!("{DESCRIPTOR}.lock")));
}

#[test]
fn held_lock_exits_2() {
    let project = Project::new(BEFORE);
    project.write(&format!("{DESCRIPTOR}.lock"), "");

    project
        .patch(&[])
        .code(2)
        .stdout(predicate::str::contains("another patch run"));
    assert_eq!(project.read(DESCRIPTOR), BEFORE);
}

#[test]
fn json_output_from_config() {
    let project = Project::new(BEFORE);
    project.write("pbxpatch.toml", "[output]\nformat = \"json\"\n");

    let output = project.patch(&["--dry-run"]).code(0).get_output().stdout.clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["schema"], "pbxpatch.report.v1");
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["rules"].as_array().unwrap().len(), 7);
}

#[test]
fn validate_lists_missing_sources() {
    let project = Project::new(BEFORE);
    project
        .run(&["validate"])
        .code(0)
        .stdout(predicate::str::contains("4 required file(s) present"));

    std::fs::remove_file(project.root.join(SOURCES[2])).unwrap();
    project
        .run(&["validate"])
        .code(1)
        .stdout(predicate::str::contains(format!("missing: {}", SOURCES[2])));
    assert_eq!(project.read(DESCRIPTOR), BEFORE);
}

#[test]
fn list_rules_in_order() {
    let output = pbxpatch()
        .arg("list-rules")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let names: Vec<&str> = text
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(1))
        .collect();
    assert_eq!(names.len(), 7);
    assert_eq!(names[0], "settings-block");
    assert!(names.contains(&"embed-file"));
}

#[test]
fn merge_metadata_applies_overrides_once() {
    let project = Project::new(BEFORE);
    project.write(
        "pbxpatch.toml",
        "[metadata.overrides]\nCFBundleVersion = \"42\"\n",
    );

    project
        .run(&["merge-metadata"])
        .code(0)
        .stdout(predicate::str::contains("updated"));
    let plist = project.read("ShareExtension/Sources/Info.plist");
    assert!(plist.contains("<string>Hamrah Share</string>"));
    assert!(plist.contains("<string>com.apple.share-services</string>"));
    assert!(plist.contains("<string>42</string>"));
    assert!(plist.contains("<string>$(PRODUCT_BUNDLE_IDENTIFIER)</string>"));

    project
        .run(&["merge-metadata"])
        .code(0)
        .stdout(predicate::str::contains("unchanged"));
}

#[test]
fn check_entitlements_reports_app_group() {
    let project = Project::new(BEFORE);

    project.run(&["check-entitlements"]).code(1);

    project.write(
        "hamrah-ios/hamrah-ios.entitlements",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>com.apple.security.application-groups</key>
	<array>
		<string>group.app.hamrah.ios</string>
	</array>
</dict>
</plist>
"#,
    );
    project
        .run(&["check-entitlements"])
        .code(0)
        .stdout(predicate::str::contains("group.app.hamrah.ios: present"));

    project.write("pbxpatch.toml", "[profile]\napp_group = \"group.other\"\n");
    project
        .run(&["check-entitlements"])
        .code(0)
        .stdout(predicate::str::contains("group.other: missing"))
        .stdout(predicate::str::contains("declared groups: group.app.hamrah.ios"));
}

#[test]
fn cleanup_removes_backup() {
    let project = Project::new(BEFORE);
    project.patch(&[]).code(0);
    assert!(project.exists(&format!("{DESCRIPTOR}.backup")));

    project
        .run(&["cleanup"])
        .code(0)
        .stdout(predicate::str::contains("removed"));
    assert!(!project.exists(&format!("{DESCRIPTOR}.backup")));

    project
        .run(&["cleanup"])
        .code(0)
        .stdout(predicate::str::contains("no backup"));
}
