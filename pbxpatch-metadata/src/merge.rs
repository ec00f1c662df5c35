//! Recursive mapping merge.

use serde_json::Value;

/// Merge `overrides` over `existing` and return the result.
///
/// Keys present in both mappings merge recursively when both sides are mappings; otherwise the
/// override wins. Lists and scalars are replaced whole.
pub fn merge(existing: &Value, overrides: &Value) -> Value {
    let mut merged = existing.clone();
    merge_in_place(&mut merged, overrides);
    merged
}

pub fn merge_in_place(target: &mut Value, overrides: &Value) {
    match (target, overrides) {
        (Value::Object(target), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match target.get_mut(key) {
                    Some(slot) => merge_in_place(slot, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, overrides) => *target = overrides.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn override_keys_win() {
        let merged = merge(&json!({"a": 1, "b": 2}), &json!({"b": 3}));
        assert_eq!(merged, json!({"a": 1, "b": 3}));
    }

    #[test]
    fn nested_mappings_merge() {
        let existing = json!({
            "NSExtension": {
                "NSExtensionPointIdentifier": "old",
                "NSExtensionAttributes": {"Keep": true}
            }
        });
        let overrides = json!({
            "NSExtension": {
                "NSExtensionPointIdentifier": "com.apple.share-services",
                "NSExtensionAttributes": {"Added": 1}
            }
        });
        assert_eq!(
            merge(&existing, &overrides),
            json!({
                "NSExtension": {
                    "NSExtensionPointIdentifier": "com.apple.share-services",
                    "NSExtensionAttributes": {"Keep": true, "Added": 1}
                }
            })
        );
    }

    #[test]
    fn lists_are_replaced() {
        let merged = merge(&json!({"l": [1, 2, 3]}), &json!({"l": [4]}));
        assert_eq!(merged, json!({"l": [4]}));
    }

    #[test]
    fn mapping_replaces_scalar() {
        let merged = merge(&json!({"k": "flat"}), &json!({"k": {"nested": true}}));
        assert_eq!(merged, json!({"k": {"nested": true}}));
    }

    #[test]
    fn merging_twice_is_stable() {
        let existing = json!({"a": {"b": 1}, "c": [1]});
        let overrides = json!({"a": {"d": 2}, "c": [2]});
        let once = merge(&existing, &overrides);
        assert_eq!(merge(&once, &overrides), once);
    }
}
