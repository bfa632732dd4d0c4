//! Right-biased deep merge for JSON values.
//!
//! This is the merge used by `create` and `update`. The resolution rules:
//!
//! 1. Two objects merge recursively, key by key.
//! 2. Any non-object right-hand value replaces the left wholesale. Arrays
//!    are values, not containers: no element-wise merging.
//! 3. A right-hand `null` is the explicit "absent" marker: the key is
//!    removed from the result. An absent right-hand key leaves the left
//!    value untouched.
//!
//! Rule 3 applies recursively, so nulls never survive a merge. Merging a
//! value into an empty object is therefore also the way to strip nulls
//! from caller input.

use serde_json::{Map, Value};

/// Merge `right` into `left`, right side winning.
pub fn deep_merge(left: Value, right: Value) -> Value {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => Value::Object(merge_objects(l, r)),
        // Right-hand object over a non-object left: the object wins, but
        // its nulls are still stripped.
        (_, Value::Object(r)) => Value::Object(merge_objects(Map::new(), r)),
        (_, right) => right,
    }
}

/// Merge a sequence of values left to right into one object.
///
/// Later values win over earlier ones. Starts from an empty object, so
/// top-level nulls in every argument are stripped.
pub fn merge_all<I>(values: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    values
        .into_iter()
        .fold(Value::Object(Map::new()), deep_merge)
}

fn merge_objects(mut left: Map<String, Value>, right: Map<String, Value>) -> Map<String, Value> {
    for (key, right_value) in right {
        if right_value.is_null() {
            left.remove(&key);
            continue;
        }
        let left_value = left.remove(&key).unwrap_or(Value::Null);
        left.insert(key, deep_merge(left_value, right_value));
    }
    left
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_right_bias() {
        let merged = deep_merge(json!({"a": 1, "b": 2}), json!({"a": 9}));
        assert_eq!(merged, json!({"a": 9, "b": 2}));
    }

    #[test]
    fn nested_objects_merge_recursively() {
        let merged = deep_merge(
            json!({"outer": {"keep": 1, "swap": 2}, "other": true}),
            json!({"outer": {"swap": 3, "add": 4}}),
        );
        assert_eq!(
            merged,
            json!({"outer": {"keep": 1, "swap": 3, "add": 4}, "other": true})
        );
    }

    #[test]
    fn arrays_replace_wholesale() {
        let merged = deep_merge(json!({"xs": [1, 2, 3]}), json!({"xs": [9]}));
        assert_eq!(merged, json!({"xs": [9]}));
    }

    #[test]
    fn scalar_replaces_object() {
        let merged = deep_merge(json!({"a": {"nested": true}}), json!({"a": 7}));
        assert_eq!(merged, json!({"a": 7}));
    }

    #[test]
    fn null_removes_key() {
        let merged = deep_merge(json!({"a": 1, "b": 2}), json!({"a": null}));
        assert_eq!(merged, json!({"b": 2}));
    }

    #[test]
    fn null_removes_nested_key() {
        let merged = deep_merge(
            json!({"outer": {"a": 1, "b": 2}}),
            json!({"outer": {"a": null}}),
        );
        assert_eq!(merged, json!({"outer": {"b": 2}}));
    }

    #[test]
    fn absent_key_does_not_restore() {
        // Deleting via null, then merging a patch without the key: the key
        // stays gone.
        let step1 = deep_merge(json!({"a": 1}), json!({"a": null}));
        let step2 = deep_merge(step1, json!({"b": 2}));
        assert_eq!(step2, json!({"b": 2}));
    }

    #[test]
    fn nulls_stripped_from_fresh_objects() {
        let merged = deep_merge(json!({}), json!({"a": {"b": null, "c": 1}}));
        assert_eq!(merged, json!({"a": {"c": 1}}));
    }

    #[test]
    fn merge_all_later_wins() {
        let merged = merge_all([
            json!({"a": 1}),
            json!({"a": 2, "b": 2}),
            json!({"b": 3}),
        ]);
        assert_eq!(merged, json!({"a": 2, "b": 3}));
    }

    #[test]
    fn merge_all_strips_top_level_nulls() {
        let merged = merge_all([json!({"a": null, "b": 1})]);
        assert_eq!(merged, json!({"b": 1}));
    }

    #[test]
    fn non_object_inputs_collapse_to_right() {
        assert_eq!(deep_merge(json!(1), json!("x")), json!("x"));
        assert_eq!(deep_merge(json!({"a": 1}), json!([1, 2])), json!([1, 2]));
    }
}
