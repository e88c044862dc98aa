//! Rule descriptors: a file matcher plus an ordered step chain.

use std::fmt;

use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::RulefigError;
use crate::step::{self, Options, StepRef};

/// A file-path predicate, compared by its pattern source.
#[derive(Debug, Clone)]
pub struct Matcher(Regex);

impl Matcher {
    /// Compile a pattern.
    ///
    /// A `/body/flags` literal has its slashes stripped. Flags `i`, `m` and `s`
    /// become inline flags; `d`, `g`, `u`, `v` and `y` do not change what a
    /// path matches and are dropped. A tail after the last slash that is not a
    /// flag set leaves the pattern as a plain regex.
    pub fn new(pattern: &str) -> Result<Self, RulefigError> {
        let invalid = |source| RulefigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        };
        let source = match split_literal(pattern) {
            Some((body, flags)) => {
                let mut inline = String::new();
                for (i, flag) in flags.char_indices() {
                    if flags[..i].contains(flag) {
                        return Err(invalid(regex::Error::Syntax(format!(
                            "duplicate flag '{flag}'"
                        ))));
                    }
                    if matches!(flag, 'i' | 'm' | 's') {
                        inline.push(flag);
                    }
                }
                if inline.is_empty() {
                    body.to_string()
                } else {
                    format!("(?{inline}){body}")
                }
            }
            None => pattern.to_string(),
        };
        Regex::new(&source).map(Matcher).map_err(invalid)
    }

    pub(crate) fn builtin(pattern: &'static str) -> Self {
        Matcher(Regex::new(pattern).expect("rulefig: built-in pattern must compile"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.0.is_match(path)
    }
}

const LITERAL_FLAGS: &str = "dgimsuvy";

/// Split `/body/flags` into body and flags.
fn split_literal(pattern: &str) -> Option<(&str, &str)> {
    let rest = pattern.strip_prefix('/')?;
    let (body, flags) = rest.rsplit_once('/')?;
    (!body.is_empty() && flags.chars().all(|c| LITERAL_FLAGS.contains(c))).then_some((body, flags))
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Matcher {}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.as_str())
    }
}

impl Serialize for Matcher {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Ordering hint passed through to the build tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforce {
    Pre,
    Post,
}

impl Enforce {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pre" => Some(Enforce::Pre),
            "post" => Some(Enforce::Post),
            _ => None,
        }
    }
}

/// A matcher paired with an ordered chain of steps.
///
/// `name` is only used to find the rule again (overrides, replace-by-name on
/// add); it is not part of the emitted configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: Option<String>,
    pub test: Matcher,
    pub exclude: Option<Matcher>,
    pub enforce: Option<Enforce>,
    pub steps: Vec<StepRef>,
}

impl Rule {
    pub fn new(test: Matcher, steps: Vec<StepRef>) -> Self {
        Self {
            name: None,
            test,
            exclude: None,
            enforce: None,
            steps,
        }
    }

    pub fn named(name: impl Into<String>, test: Matcher, steps: Vec<StepRef>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(test, steps)
        }
    }

    pub fn exclude(mut self, exclude: Matcher) -> Self {
        self.exclude = Some(exclude);
        self
    }

    pub fn enforce(mut self, enforce: Enforce) -> Self {
        self.enforce = Some(enforce);
        self
    }

    pub fn step(&self, key: &str) -> Option<&StepRef> {
        self.steps.iter().find(|s| s.matches(key))
    }

    pub fn has_step(&self, key: &str) -> bool {
        self.step(key).is_some()
    }

    /// Index of the step that per-rule options apply to: the step named after
    /// the rule, or else the last step in the chain.
    pub fn primary_step_index(&self) -> Option<usize> {
        let by_name = self
            .name
            .as_deref()
            .and_then(|name| self.steps.iter().position(|s| s.matches(name)));
        by_name.or_else(|| self.steps.len().checked_sub(1))
    }

    /// Merge per-rule options into the primary step.
    pub fn merge_primary_options(&mut self, options: &Options) {
        if let Some(i) = self.primary_step_index() {
            self.steps[i].merge_options(options);
        }
    }

    /// Parse a full rule shape: `test` plus `loader` (with optional `options`)
    /// or `use`, and optional `exclude` / `enforce`.
    ///
    /// `target` names the input in error messages.
    pub fn from_value(
        name: Option<&str>,
        value: &Value,
        target: &str,
    ) -> Result<Self, RulefigError> {
        let obj = value
            .as_object()
            .ok_or_else(|| RulefigError::shape(target, format!("expected an object, got {value}")))?;

        let test = obj
            .get("test")
            .and_then(Value::as_str)
            .ok_or_else(|| RulefigError::shape(target, "missing string `test`"))?;
        let test = Matcher::new(test)?;

        let steps = parse_steps(obj)
            .map_err(|reason| RulefigError::shape(target, reason))?
            .ok_or_else(|| RulefigError::shape(target, "needs `loader` or `use`"))?;

        let mut rule = Rule {
            name: name.map(str::to_string),
            ..Rule::new(test, steps)
        };
        if let Some(exclude) = obj.get("exclude").and_then(Value::as_str) {
            rule.exclude = Some(Matcher::new(exclude)?);
        }
        if let Some(enforce) = obj.get("enforce").and_then(Value::as_str) {
            rule.enforce = Some(
                Enforce::parse(enforce)
                    .ok_or_else(|| RulefigError::shape(target, format!("unknown enforce `{enforce}`")))?,
            );
        }
        Ok(rule)
    }
}

/// Read the step chain out of a rule-shaped object.
///
/// `loader` wins over `use` and absorbs a sibling `options` map. Returns
/// `Ok(None)` when neither key is present.
pub(crate) fn parse_steps(obj: &Map<String, Value>) -> Result<Option<Vec<StepRef>>, String> {
    if let Some(loader) = obj.get("loader") {
        let name = loader
            .as_str()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| format!("`loader` must be a step name, got {loader}"))?;
        let step = match obj.get("options") {
            None | Some(Value::Null) => StepRef::new(name),
            Some(Value::Object(opts)) => StepRef::with_options(name, opts.clone()),
            Some(other) => return Err(format!("`options` must be a map, got {other}")),
        };
        return Ok(Some(vec![step]));
    }
    match obj.get("use") {
        Some(value) => step::chain_from_value(value).map(Some),
        None => Ok(None),
    }
}
