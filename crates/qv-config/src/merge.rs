use serde_json::Value;

/// Deep merge two JSON values. Overlay wins for non-object values.
/// Objects are merged recursively key-by-key; arrays and scalars are
/// replaced wholesale, never concatenated.
pub fn merge_json_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged_val = match base_map.remove(&key) {
                    Some(base_val) => merge_json_values(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged_val);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_arrays_replace_wholesale() {
        let merged = merge_json_values(json!({"a": [1, 2]}), json!({"a": [3]}));
        assert_eq!(merged, json!({"a": [3]}));
    }

    #[test]
    fn test_nested_objects_merge_recursively() {
        let base = json!({"capabilities": {"enabled": true, "failClosed": true}});
        let overlay = json!({"capabilities": {"failClosed": false}});
        let merged = merge_json_values(base, overlay);
        assert_eq!(
            merged,
            json!({"capabilities": {"enabled": true, "failClosed": false}})
        );
    }

    #[test]
    fn test_overlay_adds_new_keys() {
        let merged = merge_json_values(json!({"a": 1}), json!({"b": 2}));
        assert_eq!(merged, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_scalar_replaces_object() {
        let merged = merge_json_values(json!({"a": {"deep": true}}), json!({"a": 5}));
        assert_eq!(merged, json!({"a": 5}));
    }

    #[test]
    fn test_object_replaces_scalar() {
        let merged = merge_json_values(json!({"a": 5}), json!({"a": {"deep": true}}));
        assert_eq!(merged, json!({"a": {"deep": true}}));
    }

    #[test]
    fn test_three_layer_merge_later_wins() {
        let defaults = json!({"trustLevel": "standard", "maxVerificationTokens": 500});
        let user = json!({"trustLevel": "strict"});
        let project = json!({"trustLevel": "minimal", "leanMode": true});
        let merged = merge_json_values(merge_json_values(defaults, user), project);
        assert_eq!(
            merged,
            json!({"trustLevel": "minimal", "maxVerificationTokens": 500, "leanMode": true})
        );
    }
}
