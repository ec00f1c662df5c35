#![no_main]

//! Fuzz target for the full rule pipeline.
//!
//! Splices arbitrary bytes into the share-extension fixture so most inputs still look like a
//! descriptor. Whenever the rules succeed, a second run must be a byte-for-byte no-op.

use libfuzzer_sys::fuzz_target;
use pbxpatch_domain::{ExtensionProfile, RuleContext, builtin_rules, run_rules};
use pbxpatch_edit::SequentialIds;

const BEFORE: &str = include_str!("../../tests/fixtures/share_extension/before/project.pbxproj");

#[derive(Debug, arbitrary::Arbitrary)]
struct PipelineInput {
    /// Byte offset (modulo the fixture length) where the splice starts.
    at: u16,
    /// Bytes removed from the fixture at `at`.
    remove: u8,
    insert: String,
}

fuzz_target!(|input: PipelineInput| {
    let mut start = input.at as usize % (BEFORE.len() + 1);
    while !BEFORE.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (start + input.remove as usize).min(BEFORE.len());
    while !BEFORE.is_char_boundary(end) {
        end += 1;
    }
    let text = format!("{}{}{}", &BEFORE[..start], input.insert, &BEFORE[end..]);

    let profile = ExtensionProfile::default();
    let rules = builtin_rules();
    let mut ids = SequentialIds::default();
    let mut ctx = RuleContext {
        profile: &profile,
        ids: &mut ids,
    };
    let Ok(first) = run_rules(&rules, &text, &mut ctx) else {
        return;
    };
    let second = run_rules(&rules, &first.text, &mut ctx).expect("patched descriptor re-runs");
    assert_eq!(first.text, second.text, "second run changed the descriptor");
});
