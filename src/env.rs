use serde_json::{Map, Number, Value};

/// How many leading segments address config structure rather than options.
const FOLDED_SEGMENTS: usize = 3;

/// Build a JSON map from environment variables matching `{PREFIX}__*`.
///
/// Double underscore `__` separates nesting levels, so
/// `RULEFIG__LOADERS__ESLINT=false` becomes `{loaders: {eslint: false}}`.
/// Single `_` within a segment is literal.
///
/// The first [`FOLDED_SEGMENTS`] segments (config field, rule name, rule
/// field) are lowercased. Deeper segments are step option keys and keep their
/// case: `RULEFIG__LOADERS__OPTIONS__POSTCSS__sourceMap=false`.
///
/// Values are parsed heuristically: bool > integer > float > string.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn env_to_map(
    prefix: &str,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Map<String, Value> {
    let needle = format!("{prefix}__");
    let mut map = Map::new();

    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&needle) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }

        let segments: Vec<String> = rest
            .split("__")
            .enumerate()
            .map(|(depth, seg)| {
                if depth < FOLDED_SEGMENTS {
                    seg.to_lowercase()
                } else {
                    seg.to_string()
                }
            })
            .collect();
        insert_nested(&mut map, &segments, parse_env_value(&value));
    }

    map
}

fn insert_nested(map: &mut Map<String, Value>, segments: &[String], value: Value) {
    debug_assert!(!segments.is_empty());

    let key = segments[0].clone();

    if segments.len() == 1 {
        map.insert(key, value);
    } else {
        let sub = map
            .entry(key)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(sub_map) = sub {
            insert_nested(sub_map, &segments[1..], value);
        }
    }
}

/// Parse an env var value into a typed JSON value.
/// Tries: bool → integer → float → string.
fn parse_env_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Number(i.into());
    }
    // Only treat as float when there is a dot, so "NaN" / "inf" stay strings.
    if s.contains('.')
        && let Some(n) = s.parse::<f64>().ok().and_then(Number::from_f64)
    {
        return Value::Number(n);
    }
    Value::String(s.to_string())
}
