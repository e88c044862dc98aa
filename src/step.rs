//! Step references: one named transformation in a rule's chain.

use serde_json::{Map, Value};

use crate::merge::{self, ArrayMode};

/// Options attached to a step, passed through to the build tool untouched.
pub type Options = Map<String, Value>;

/// One transformation step, identified by name, with optional options.
///
/// Two steps are the same step when their names are equal; options do not
/// take part in matching.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRef {
    pub name: String,
    pub options: Option<Options>,
}

impl StepRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: None,
        }
    }

    pub fn with_options(name: impl Into<String>, options: Options) -> Self {
        Self {
            name: name.into(),
            options: Some(options),
        }
    }

    /// The short key option maps use for this step: `babel-loader` → `babel`.
    pub fn key(&self) -> &str {
        self.name.strip_suffix("-loader").unwrap_or(&self.name)
    }

    /// Whether an option-map key addresses this step.
    pub fn matches(&self, key: &str) -> bool {
        self.name == key || self.key() == key
    }

    /// Merge `overlay` into this step's options (arrays union, scalars override).
    pub fn merge_options(&mut self, overlay: &Options) {
        let base = self.options.take().unwrap_or_default();
        self.options = Some(merge::deep_merge(base, overlay.clone(), ArrayMode::Union));
    }

    /// Normalize one `use` entry: a bare name, or an object carrying `loader`
    /// (or `name`) and optional `options`.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(name) if !name.is_empty() => Ok(StepRef::new(name.as_str())),
            Value::Object(obj) => {
                let name = obj
                    .get("loader")
                    .or_else(|| obj.get("name"))
                    .and_then(Value::as_str)
                    .filter(|n| !n.is_empty())
                    .ok_or("step object needs a `loader` name")?;
                let options = match obj.get("options") {
                    None | Some(Value::Null) => None,
                    Some(Value::Object(opts)) => Some(opts.clone()),
                    Some(other) => return Err(format!("step `{name}` has non-map options: {other}")),
                };
                Ok(StepRef {
                    name: name.to_string(),
                    options,
                })
            }
            other => Err(format!("expected a step name or object, got {other}")),
        }
    }
}

/// Normalize a `use` value (a single entry or a list) into a step chain.
///
/// Repeated names collapse to their first occurrence. An empty chain is an error.
pub fn chain_from_value(value: &Value) -> Result<Vec<StepRef>, String> {
    let entries = match value {
        Value::Array(items) => items.iter().map(StepRef::from_value).collect::<Result<Vec<_>, _>>()?,
        single => vec![StepRef::from_value(single)?],
    };
    let mut chain: Vec<StepRef> = Vec::with_capacity(entries.len());
    for step in entries {
        if chain.iter().any(|s| s.name == step.name) {
            tracing::debug!(step = %step.name, "dropping repeated step in chain");
            continue;
        }
        chain.push(step);
    }
    if chain.is_empty() {
        return Err("step chain is empty".into());
    }
    Ok(chain)
}
