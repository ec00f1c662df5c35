//! Post-patch reference integrity.
//!
//! Every ID written into a reference property must resolve to exactly one object definition.
//! Quoted values are literals (paths, names) and are never treated as references.

use crate::error::{MatchError, MatchResult};
use crate::lists::parse_list;
use crate::matchers::{self, PropertySpan};
use std::collections::BTreeMap;
use std::fmt;

const SCALAR_REFERENCES: &[&str] = &[
    "buildConfigurationList",
    "containerPortal",
    "fileRef",
    "mainGroup",
    "productRef",
    "productRefGroup",
    "productReference",
    "target",
    "targetProxy",
];

const LIST_REFERENCES: &[&str] = &[
    "buildConfigurations",
    "buildPhases",
    "buildRules",
    "children",
    "dependencies",
    "exceptions",
    "files",
    "fileSystemSynchronizedGroups",
    "packageProductDependencies",
    "packageReferences",
    "targets",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    /// ID of the object holding the reference (`rootObject` for the top level).
    pub from: String,
    pub property: String,
    pub id: String,
    pub offset: usize,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} references undefined object {} (at byte {})",
            self.from, self.property, self.id, self.offset
        )
    }
}

/// Map of every defined object ID to its definition offset.
///
/// A second definition of the same ID is a structural ambiguity.
pub fn defined_ids(text: &str) -> MatchResult<BTreeMap<String, usize>> {
    let mut defined: BTreeMap<String, usize> = BTreeMap::new();
    for section in matchers::sections(text)? {
        for obj in matchers::objects_in(text, &section)? {
            if let Some(first) = defined.insert(obj.id.clone(), obj.line_start) {
                return Err(MatchError::ambiguous(
                    format!("{} = {{", obj.id),
                    vec![first, obj.line_start],
                ));
            }
        }
    }
    Ok(defined)
}

fn check_property(
    text: &str,
    from: &str,
    prop: &PropertySpan,
    defined: &BTreeMap<String, usize>,
    out: &mut Vec<DanglingReference>,
) -> MatchResult<()> {
    let mut check = |value: String, offset: usize| {
        if !defined.contains_key(&value) {
            out.push(DanglingReference {
                from: from.to_string(),
                property: prop.key.clone(),
                id: value,
                offset,
            });
        }
    };
    if SCALAR_REFERENCES.contains(&prop.key.as_str()) && !prop.is_quoted(text) {
        check(prop.scalar(text), prop.value.start);
    } else if LIST_REFERENCES.contains(&prop.key.as_str()) && prop.is_list(text) {
        for entry in parse_list(text, prop)? {
            if !entry.is_quoted(text) {
                check(entry.value, entry.token.start);
            }
        }
    }
    Ok(())
}

/// Every reference that does not resolve to a definition.
pub fn check_references(text: &str) -> MatchResult<Vec<DanglingReference>> {
    let defined = defined_ids(text)?;
    let mut out = Vec::new();

    for section in matchers::sections(text)? {
        for obj in matchers::objects_in(text, &section)? {
            for prop in matchers::properties(text, &obj)? {
                check_property(text, &obj.id, &prop, &defined, &mut out)?;
            }
        }
    }

    let root = matchers::root_dict(text)?;
    for prop in matchers::dict_properties(text, root)? {
        if prop.key == "rootObject" {
            let value = prop.scalar(text);
            if !defined.contains_key(&value) {
                out.push(DanglingReference {
                    from: "rootObject".to_string(),
                    property: prop.key.clone(),
                    id: value,
                    offset: prop.value.start,
                });
            }
        }
    }
    Ok(out)
}
