//! The caller's override map: per-rule patches plus the global per-step
//! option map under the reserved `options` key.
//!
//! Parsing here is lenient. A malformed entry becomes an empty patch and is
//! logged; it never fails configuration building.

use serde_json::{Map, Value};

use crate::rule::{self, Enforce, Matcher};
use crate::step::{Options, StepRef};

/// Reserved key in the loaders map holding the global per-step options.
pub const GLOBAL_OPTIONS_KEY: &str = "options";

/// What to do with one named rule.
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideEntry {
    /// Remove the rule from the output.
    Disable,
    /// Replace or augment parts of the rule. An empty patch keeps it as-is.
    Patch(RulePatch),
}

/// Sparse changes to a rule. Unset fields keep the catalogue's values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulePatch {
    pub test: Option<Matcher>,
    pub exclude: Option<Matcher>,
    pub enforce: Option<Enforce>,
    /// Full replacement of the step chain.
    pub steps: Option<Vec<StepRef>>,
    /// Options merged into the rule's primary step.
    pub options: Option<Options>,
}

impl RulePatch {
    pub fn is_empty(&self) -> bool {
        *self == RulePatch::default()
    }

    /// A patch that carries enough to stand alone as a new rule.
    pub fn is_complete(&self) -> bool {
        self.test.is_some() && self.steps.is_some()
    }

    pub fn replace_steps(steps: Vec<StepRef>) -> Self {
        Self {
            steps: Some(steps),
            ..Self::default()
        }
    }

    pub fn merge_options(options: Options) -> Self {
        Self {
            options: Some(options),
            ..Self::default()
        }
    }
}

impl OverrideEntry {
    /// Interpret one value from the loaders map.
    pub fn from_value(name: &str, value: &Value) -> Self {
        match value {
            Value::Bool(false) => OverrideEntry::Disable,
            Value::Object(obj) if obj.get("enable") == Some(&Value::Bool(false)) => {
                OverrideEntry::Disable
            }
            Value::Object(obj) => match patch_from_object(obj) {
                Ok(patch) => OverrideEntry::Patch(patch),
                Err(reason) => {
                    tracing::warn!(rule = name, %reason, "ignoring malformed loader override");
                    OverrideEntry::Patch(RulePatch::default())
                }
            },
            Value::Bool(true) => OverrideEntry::Patch(RulePatch::default()),
            other => {
                tracing::debug!(rule = name, value = %other, "ignoring unrecognized loader override");
                OverrideEntry::Patch(RulePatch::default())
            }
        }
    }
}

fn patch_from_object(obj: &Map<String, Value>) -> Result<RulePatch, String> {
    let mut patch = RulePatch {
        test: matcher_field(obj, "test")?,
        exclude: matcher_field(obj, "exclude")?,
        ..RulePatch::default()
    };
    if let Some(enforce) = obj.get("enforce") {
        patch.enforce = Some(
            enforce
                .as_str()
                .and_then(Enforce::parse)
                .ok_or_else(|| format!("unknown enforce {enforce}"))?,
        );
    }
    patch.steps = rule::parse_steps(obj)?;

    // With `loader`, `options` was folded into the single step.
    if !obj.contains_key("loader") {
        match obj.get("options") {
            None | Some(Value::Null) => {}
            Some(Value::Object(opts)) => patch.options = Some(opts.clone()),
            Some(other) => return Err(format!("`options` must be a map, got {other}")),
        }
    }
    Ok(patch)
}

fn matcher_field(obj: &Map<String, Value>, key: &str) -> Result<Option<Matcher>, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(pattern)) => Matcher::new(pattern).map(Some).map_err(|e| e.to_string()),
        Some(other) => Err(format!("`{key}` must be a pattern string, got {other}")),
    }
}

/// Unwrap a per-step option entry: `{options: {...}}` or a bare option map.
pub(crate) fn step_options(value: &Value) -> Option<Options> {
    let obj = value.as_object()?;
    match obj.get("options") {
        Some(Value::Object(inner)) => Some(inner.clone()),
        _ => Some(obj.clone()),
    }
}

/// The parsed loaders map, in the caller's key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoaderOverrides {
    entries: Vec<(String, OverrideEntry)>,
    global: Vec<(String, Options)>,
}

impl LoaderOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a loaders map. Never fails; see the module docs.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut overrides = Self::new();
        for (name, value) in map {
            if name == GLOBAL_OPTIONS_KEY {
                overrides.global = parse_global(value);
                continue;
            }
            overrides.set(name, OverrideEntry::from_value(name, value));
        }
        overrides
    }

    /// Set the entry for `name`, replacing any earlier one in place.
    pub fn set(&mut self, name: &str, entry: OverrideEntry) -> &mut Self {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = entry,
            None => self.entries.push((name.to_string(), entry)),
        }
        self
    }

    /// Set global options for every step matching `key`, replacing earlier ones.
    pub fn set_global(&mut self, key: &str, options: Options) -> &mut Self {
        match self.global.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = options,
            None => self.global.push((key.to_string(), options)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&OverrideEntry> {
        self.entries
            .iter()
            .find_map(|(n, entry)| (n == name).then_some(entry))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &OverrideEntry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    pub fn global_options(&self) -> &[(String, Options)] {
        &self.global
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.global.is_empty()
    }
}

fn parse_global(value: &Value) -> Vec<(String, Options)> {
    let Some(map) = value.as_object() else {
        tracing::warn!(value = %value, "ignoring non-map global loader options");
        return Vec::new();
    };
    map.iter()
        .filter_map(|(key, entry)| match step_options(entry) {
            Some(options) => Some((key.clone(), options)),
            None => {
                tracing::debug!(step = %key, "ignoring non-map global step options");
                None
            }
        })
        .collect()
}
