//! Policy-driven deep merge over JSON maps.
//!
//! Two callers with different needs share this module:
//!
//! - config layering (files, env, programmatic overrides) merges with
//!   [`ArrayMode::Replace`]: a later layer's array replaces the earlier one.
//! - step options merge with [`ArrayMode::Union`]: plugin, preset and path
//!   lists accumulate and are de-duplicated, while scalars still override.
//!
//! The policy for each key is chosen by [`policy_for`] from the shapes found on
//! both sides. A `null` in the overlay means "absent" and never clobbers the base.

use serde_json::{Map, Value};

/// How a key present on both sides is combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// The overlay value replaces the base value.
    Override,
    /// Both arrays are concatenated, keeping the first occurrence of each item.
    Union,
    /// Both sides are maps; merge them key by key.
    Recurse,
}

/// How arrays found on both sides of a merge are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayMode {
    Replace,
    Union,
}

/// Pick the policy for one key given the base and overlay values.
pub fn policy_for(base: &Value, overlay: &Value, arrays: ArrayMode) -> MergePolicy {
    match (base, overlay) {
        (Value::Object(_), Value::Object(_)) => MergePolicy::Recurse,
        (Value::Array(_), Value::Array(_)) if arrays == ArrayMode::Union => MergePolicy::Union,
        _ => MergePolicy::Override,
    }
}

/// Deep-merge `overlay` on top of `base`.
///
/// Keys keep their position in `base`; keys new to `base` are appended in
/// overlay order.
pub fn deep_merge(mut base: Map<String, Value>, overlay: Map<String, Value>, arrays: ArrayMode) -> Map<String, Value> {
    merge_into(&mut base, overlay, arrays);
    base
}

/// In-place form of [`deep_merge`].
pub fn merge_into(base: &mut Map<String, Value>, overlay: Map<String, Value>, arrays: ArrayMode) {
    for (key, overlay_val) in overlay {
        if overlay_val.is_null() {
            continue;
        }
        match base.get_mut(&key) {
            Some(slot) => {
                let base_val = slot.take();
                *slot = merge_value(base_val, overlay_val, arrays);
            }
            None => {
                base.insert(key, strip_nulls(overlay_val));
            }
        }
    }
}

fn merge_value(base: Value, overlay: Value, arrays: ArrayMode) -> Value {
    match policy_for(&base, &overlay, arrays) {
        MergePolicy::Recurse => match (base, overlay) {
            (Value::Object(base_map), Value::Object(overlay_map)) => {
                Value::Object(deep_merge(base_map, overlay_map, arrays))
            }
            (_, overlay) => overlay,
        },
        MergePolicy::Union => match (base, overlay) {
            (Value::Array(base_items), Value::Array(overlay_items)) => {
                Value::Array(union(base_items, overlay_items))
            }
            (_, overlay) => overlay,
        },
        MergePolicy::Override => strip_nulls(overlay),
    }
}

/// Concatenate two lists, dropping any item already present.
pub fn union(base: Vec<Value>, overlay: Vec<Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(base.len() + overlay.len());
    for item in base.into_iter().chain(overlay) {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

// Nested nulls in a fresh value are dropped too, so "absent" stays absent.
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn disjoint_keys_merge() {
        let merged = deep_merge(
            map(json!({"fix": true})),
            map(json!({"cache": false})),
            ArrayMode::Union,
        );
        assert_eq!(Value::Object(merged), json!({"fix": true, "cache": false}));
    }

    #[test]
    fn arrays_union_and_scalars_override() {
        let merged = deep_merge(
            map(json!({"presets": ["es2015"], "comments": true})),
            map(json!({"presets": ["stage-2"], "comments": false})),
            ArrayMode::Union,
        );
        assert_eq!(merged["presets"], json!(["es2015", "stage-2"]));
        assert_eq!(merged["comments"], json!(false));
    }

    #[test]
    fn union_deduplicates() {
        let merged = deep_merge(
            map(json!({"presets": ["es2015"]})),
            map(json!({"presets": ["es2015", "stage-2"]})),
            ArrayMode::Union,
        );
        assert_eq!(merged["presets"], json!(["es2015", "stage-2"]));
    }

    #[test]
    fn replace_mode_overrides_arrays() {
        let merged = deep_merge(
            map(json!({"presets": ["es2015"]})),
            map(json!({"presets": ["stage-2"]})),
            ArrayMode::Replace,
        );
        assert_eq!(merged["presets"], json!(["stage-2"]));
    }

    #[test]
    fn nested_maps_recurse() {
        let merged = deep_merge(
            map(json!({"env": {"targets": ["chrome"], "debug": false}})),
            map(json!({"env": {"targets": ["ie"], "debug": true}})),
            ArrayMode::Union,
        );
        assert_eq!(merged["env"]["targets"], json!(["chrome", "ie"]));
        assert_eq!(merged["env"]["debug"], json!(true));
    }

    #[test]
    fn null_overlay_leaves_base_untouched() {
        let merged = deep_merge(
            map(json!({"fix": true})),
            map(json!({"fix": null, "extra": null})),
            ArrayMode::Union,
        );
        assert_eq!(Value::Object(merged), json!({"fix": true}));
    }

    #[test]
    fn scalar_replaces_map_and_array_replaces_scalar() {
        let merged = deep_merge(
            map(json!({"env": {"a": 1}, "limit": 10})),
            map(json!({"env": "flat", "limit": [1, 2]})),
            ArrayMode::Union,
        );
        assert_eq!(merged["env"], json!("flat"));
        assert_eq!(merged["limit"], json!([1, 2]));
    }

    #[test]
    fn base_key_order_is_kept() {
        let merged = deep_merge(
            map(json!({"a": 1, "b": 2, "c": 3})),
            map(json!({"b": 20, "d": 4})),
            ArrayMode::Replace,
        );
        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn policy_selection() {
        assert_eq!(
            policy_for(&json!({}), &json!({}), ArrayMode::Replace),
            MergePolicy::Recurse
        );
        assert_eq!(
            policy_for(&json!([1]), &json!([2]), ArrayMode::Union),
            MergePolicy::Union
        );
        assert_eq!(
            policy_for(&json!([1]), &json!([2]), ArrayMode::Replace),
            MergePolicy::Override
        );
        assert_eq!(
            policy_for(&json!(true), &json!({}), ArrayMode::Union),
            MergePolicy::Override
        );
    }
}
