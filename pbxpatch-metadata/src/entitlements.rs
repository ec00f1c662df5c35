//! Application-group lookup in an entitlements property list.

use serde_json::Value;

pub const APPLICATION_GROUPS_KEY: &str = "com.apple.security.application-groups";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppGroupCheck {
    pub group: String,
    /// Groups listed under the application-groups key, in file order.
    pub groups: Vec<String>,
    pub present: bool,
}

pub fn check_app_group(entitlements: &Value, group: &str) -> AppGroupCheck {
    let groups: Vec<String> = entitlements
        .get(APPLICATION_GROUPS_KEY)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let present = groups.iter().any(|g| g == group);
    AppGroupCheck {
        group: group.to_string(),
        groups,
        present,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_listed_group() {
        let ents = json!({"com.apple.security.application-groups": ["group.a", "group.b"]});
        let check = check_app_group(&ents, "group.b");
        assert!(check.present);
        assert_eq!(check.groups, vec!["group.a", "group.b"]);
    }

    #[test]
    fn missing_key_means_absent() {
        let check = check_app_group(&json!({}), "group.a");
        assert!(!check.present);
        assert!(check.groups.is_empty());
    }
}
