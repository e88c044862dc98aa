//! Convert dotted-key programmatic overrides into a nested JSON map.
//!
//! Each `("loaders.eslint", Value)` pair is expanded into the nested map
//! needed for deep-merge with the other config layers.

use confique::meta::Meta;
use serde_json::{Map, Value};

/// Convert dotted-key overrides into a nested map.
///
/// `("loaders.options.url.limit", 4096)` becomes
/// `{loaders = {options = {url = {limit = 4096}}}}`.
///
/// If multiple entries target the same key, the last one wins. An entry
/// that runs through a non-map value replaces that value with a map.
pub fn overrides_to_map(entries: &[(String, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (dotted_key, value) in entries {
        set_nested(&mut map, dotted_key, value.clone());
    }
    map
}

fn set_nested(map: &mut Map<String, Value>, dotted_key: &str, value: Value) {
    let mut segments = dotted_key.split('.');
    let Some(mut leaf) = segments.next() else {
        return;
    };
    let mut current = map;

    for segment in segments {
        let slot = current
            .entry(leaf)
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(inner) => inner,
            _ => return,
        };
        leaf = segment;
    }

    current.insert(leaf.to_string(), value);
}

/// Top-level field names of a confique `Meta` tree.
///
/// Dotted overrides are accepted when their first segment is one of these.
pub fn valid_roots(meta: &Meta) -> Vec<&'static str> {
    meta.fields.iter().map(|field| field.name).collect()
}

/// Whether `dotted_key` starts at a known top-level field.
pub fn is_valid_key(meta: &Meta, dotted_key: &str) -> bool {
    let root = dotted_key.split('.').next().unwrap_or(dotted_key);
    valid_roots(meta).contains(&root)
}
