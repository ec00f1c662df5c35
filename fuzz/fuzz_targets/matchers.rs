#![no_main]

//! Fuzz target for the section, object and list matchers.
//!
//! Arbitrary text must produce either spans inside the input or a `MatchError`, never a panic.

use libfuzzer_sys::fuzz_target;
use pbxpatch_edit::{check_references, lists, matchers};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = pbxpatch_types::ObjectId::parse(text);
    let _ = matchers::find_root_object(text);
    let _ = check_references(text);

    let Ok(sections) = matchers::sections(text) else {
        return;
    };
    for section in &sections {
        let Ok(objects) = matchers::objects_in(text, section) else {
            continue;
        };
        for obj in &objects {
            assert!(obj.text(text).len() <= text.len());
            let Ok(props) = matchers::properties(text, obj) else {
                continue;
            };
            for prop in &props {
                if prop.is_list(text) {
                    if let Ok(entries) = lists::parse_list(text, prop) {
                        for entry in &entries {
                            assert!(entry.token.end <= text.len());
                        }
                    }
                }
            }
        }
    }
});
