//! Property-based tests for list and path editing.
//!
//! These verify:
//! - Set semantics: ensuring an entry twice leaves exactly one copy
//! - Removal only touches matching entries
//! - Path rewrites are idempotent and never touch longer paths

use pbxpatch_edit::lists::{ensure_entry, parse_list, remove_entries};
use pbxpatch_edit::matchers::{require_object, require_property};
use pbxpatch_edit::paths::{path_occurrences, replace_path};
use proptest::prelude::*;

fn arb_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(prop::string::string_regex(r"[0-9A-F]{24}").unwrap(), 0..6)
        .prop_map(|s| s.into_iter().collect())
}

fn phase(entries: &[String]) -> String {
    let mut text = String::from("\t\tPHASE0001 /* Resources */ = {\n\t\t\tisa = PBXResourcesBuildPhase;\n\t\t\tfiles = (\n");
    for e in entries {
        text.push_str(&format!("\t\t\t\t{e} /* entry */,\n"));
    }
    text.push_str("\t\t\t);\n\t\t};\n");
    text
}

fn files(text: &str) -> Vec<String> {
    let obj = require_object(text, "PHASE0001").unwrap();
    let prop = require_property(text, &obj, "files").unwrap();
    parse_list(text, &prop)
        .unwrap()
        .into_iter()
        .map(|e| e.value)
        .collect()
}

fn ensure(text: &str, id: &str) -> (String, bool) {
    let obj = require_object(text, "PHASE0001").unwrap();
    let prop = require_property(text, &obj, "files").unwrap();
    ensure_entry(text, &prop, id, &format!("{id} /* new */")).unwrap()
}

proptest! {
    #[test]
    fn ensure_entry_has_set_semantics(existing in arb_ids(), new in prop::string::string_regex(r"[0-9A-F]{24}").unwrap()) {
        let text = phase(&existing);
        let (once, _) = ensure(&text, &new);
        let (twice, changed) = ensure(&once, &new);

        prop_assert!(!changed);
        prop_assert_eq!(&once, &twice);
        let values = files(&twice);
        prop_assert_eq!(values.iter().filter(|v| **v == new).count(), 1);
        prop_assert_eq!(values.len(), existing.len() + usize::from(!existing.contains(&new)));
    }

    #[test]
    fn remove_entries_keeps_the_rest_in_order(existing in arb_ids(), pick in 0usize..6) {
        let text = phase(&existing);
        let victim = existing.get(pick).cloned();
        let obj = require_object(&text, "PHASE0001").unwrap();
        let prop = require_property(&text, &obj, "files").unwrap();
        let (out, removed) =
            remove_entries(&text, &prop, |e| Some(&e.value) == victim.as_ref()).unwrap();

        let expected: Vec<String> = existing
            .iter()
            .filter(|e| Some(*e) != victim.as_ref())
            .cloned()
            .collect();
        prop_assert_eq!(files(&out), expected);
        prop_assert_eq!(removed.len(), usize::from(victim.is_some()));
    }

    #[test]
    fn path_rewrite_is_idempotent(dir in "[a-z]{1,8}", file in "[A-Za-z]{1,8}\\.swift") {
        let old = format!("{dir}/{file}");
        let new = format!("Sources/{file}");
        let text = format!(
            "path = \"{old}\"; decoy = \"legacy/{old}\"; suffix = \"{old}.orig\";"
        );
        let (once, n) = replace_path(&text, &old, &new);
        prop_assert_eq!(n, 1);
        let (twice, m) = replace_path(&once, &old, &new);
        prop_assert_eq!(m, 0);
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(path_occurrences(&once, &format!("legacy/{old}")).len(), 1);
    }
}
