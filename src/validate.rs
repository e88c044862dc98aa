//! Strict-mode validation: detect unknown keys in config files.
//!
//! Uses `serde_ignored` to deserialize into `C::Layer` (all-optional fields)
//! and capture any keys that the layer doesn't consume. Only keys outside the
//! typed fields are reported; the `loaders` map accepts any rule name.

use std::path::Path;

use confique::Config;
use serde::Deserialize;

use crate::error::RulefigError;

/// Reject keys in a config file that `C` has no field for.
pub fn validate_unknown_keys<C: Config>(content: &str, path: &Path) -> Result<(), RulefigError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let mut ignored: Vec<String> = Vec::new();
    let _layer: C::Layer =
        serde_ignored::deserialize(toml::Deserializer::new(content), |p| ignored.push(p.to_string()))
            .map_err(|e| RulefigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;

    match ignored.len() {
        0 => Ok(()),
        _ => Err(RulefigError::UnknownKeys(
            ignored
                .into_iter()
                .map(|key| RulefigError::UnknownKey {
                    line: key_line(content, &key),
                    path: path.to_path_buf(),
                    key,
                })
                .collect(),
        )),
    }
}

/// 1-indexed line where `dotted_key` is introduced, or 0 when not found.
///
/// A key is introduced by a table header naming it (`[entry]`, `[entry.sub]`)
/// or by an assignment whose full dotted path starts with it, counting the
/// enclosing table (`entry.include = ...` at top level, `include = ...`
/// under `[entry]`). Quoted keys are not understood.
fn key_line(content: &str, dotted_key: &str) -> usize {
    let introduces = |full: &str| {
        full == dotted_key
            || full
                .strip_prefix(dotted_key)
                .is_some_and(|rest| rest.starts_with('.'))
    };

    let mut table = String::new();
    for (i, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(header) = line.strip_prefix('[') {
            let header = header.trim_start_matches('[');
            let header = header.split(']').next().unwrap_or_default();
            table = normalize_path(header);
            if introduces(&table) {
                return i + 1;
            }
            continue;
        }
        let Some((lhs, _)) = line.split_once('=') else {
            continue;
        };
        let lhs = normalize_path(lhs);
        let full = if table.is_empty() {
            lhs
        } else {
            format!("{table}.{lhs}")
        };
        if introduces(&full) {
            return i + 1;
        }
    }
    0
}

fn normalize_path(raw: &str) -> String {
    raw.split('.').map(str::trim).collect::<Vec<_>>().join(".")
}
