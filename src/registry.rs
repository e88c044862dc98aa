//! The live, per-builder working set of resolved rules.
//!
//! Created from the resolved catalogue, then adjusted with [`add_loader`]
//! and [`merge_loader`] before [`create`] projects it into the emitted
//! configuration.
//!
//! [`add_loader`]: RuleRegistry::add_loader
//! [`merge_loader`]: RuleRegistry::merge_loader
//! [`create`]: RuleRegistry::create

use serde_json::Value;

use crate::assemble::{self, ModuleConfig};
use crate::error::RulefigError;
use crate::patch;
use crate::rule::Rule;
use crate::step::Options;

/// Result of merging options for one step key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Options were merged into this many steps.
    Applied(usize),
    /// No rule has a step matching the key. Nothing changed.
    NoMatch,
    /// The value was not an option map. Nothing changed.
    InvalidShape,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
}

impl RuleRegistry {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name.as_deref() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Add one rule. A named rule replaces an existing rule of the same name
    /// in place; anything else is appended.
    pub fn add_rule(&mut self, rule: Rule) -> &mut Self {
        let existing = rule
            .name
            .as_deref()
            .and_then(|name| self.rules.iter().position(|r| r.name.as_deref() == Some(name)));
        match existing {
            Some(i) => {
                tracing::debug!(rule = ?rule.name, "replacing rule");
                self.rules[i] = rule;
            }
            None => self.rules.push(rule),
        }
        self
    }

    /// Add rules from a raw rule (`{test, loader|use, options?}`), a named map
    /// (`{name: {test, ...}}`), or a list of either.
    ///
    /// The whole input is validated before anything is added.
    pub fn add_loader(&mut self, input: &Value) -> Result<&mut Self, RulefigError> {
        let mut parsed = Vec::new();
        collect_rules(input, &mut parsed, true)?;
        for rule in parsed {
            self.add_rule(rule);
        }
        Ok(self)
    }

    /// Merge `options` into every step matching `key`, across all rules.
    ///
    /// When no step matches, `key` is tried as a rule name and the options go
    /// to that rule's primary step.
    pub fn merge_step_options(&mut self, key: &str, options: &Options) -> MergeOutcome {
        let mut applied = 0;
        for step in self
            .rules
            .iter_mut()
            .flat_map(|r| r.steps.iter_mut())
            .filter(|s| s.matches(key))
        {
            step.merge_options(options);
            applied += 1;
        }
        if applied > 0 {
            return MergeOutcome::Applied(applied);
        }

        match self.rules.iter_mut().find(|r| r.name.as_deref() == Some(key)) {
            Some(rule) if !rule.steps.is_empty() => {
                tracing::debug!(rule = key, "merging into primary step by rule name");
                rule.merge_primary_options(options);
                MergeOutcome::Applied(1)
            }
            _ => {
                tracing::debug!(step = key, "no step or rule matches; merge skipped");
                MergeOutcome::NoMatch
            }
        }
    }

    /// Merge one `{options: {...}}` (or bare option map) value into the steps
    /// matching `key`.
    pub fn merge_entry(&mut self, key: &str, value: &Value) -> MergeOutcome {
        match patch::step_options(value) {
            Some(options) => self.merge_step_options(key, &options),
            None => MergeOutcome::InvalidShape,
        }
    }

    /// Merge options into existing steps from a map keyed by step key.
    ///
    /// Never creates rules or steps. Keys with no matching step are skipped.
    /// Every value is checked before any step is touched.
    pub fn merge_loader(&mut self, input: &Value) -> Result<&mut Self, RulefigError> {
        let map = input.as_object().ok_or_else(|| {
            RulefigError::shape("merge input", format!("expected a map keyed by step, got {input}"))
        })?;
        if let Some((key, value)) = map.iter().find(|(_, v)| patch::step_options(v).is_none()) {
            return Err(RulefigError::shape(
                key.as_str(),
                format!("expected step options, got {value}"),
            ));
        }
        for (key, value) in map {
            self.merge_entry(key, value);
        }
        Ok(self)
    }

    /// Project the registry into the configuration the build tool consumes.
    pub fn create(self) -> ModuleConfig {
        assemble::assemble(&self.rules)
    }
}

fn collect_rules(input: &Value, out: &mut Vec<Rule>, allow_list: bool) -> Result<(), RulefigError> {
    match input {
        Value::Array(items) if allow_list => {
            for item in items {
                collect_rules(item, out, false)?;
            }
            Ok(())
        }
        Value::Object(obj) if obj.contains_key("test") => {
            out.push(Rule::from_value(None, input, "<rule>")?);
            Ok(())
        }
        Value::Object(obj) => {
            for (name, value) in obj {
                out.push(Rule::from_value(Some(name), value, name)?);
            }
            Ok(())
        }
        other => Err(RulefigError::shape(
            "add input",
            format!("expected a rule, a named rule map, or a list of them, got {other}"),
        )),
    }
}
