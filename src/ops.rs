//! Rules operations: listing, showing, emitting, template generation, and
//! result types.
//!
//! Provides the logic behind `rules list`, `rules show`, `rules emit` and
//! `rules gen`, and the `RulesResult` enum that callers use to display results.

use std::fmt;
use std::path::PathBuf;

use crate::assemble::{ModuleConfig, ModuleRule};
use crate::config::BuildConfig;
use crate::error::RulefigError;
use crate::registry::RuleRegistry;
use crate::rule::Rule;

/// Result of a rules operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum RulesResult {
    /// Every rule with its step chain, in emission order.
    Listing { entries: Vec<(String, String)> },
    /// One resolved rule as it will be emitted.
    Rule { name: String, rule: ModuleRule },
    /// The full emitted configuration.
    Emitted(ModuleConfig),
    /// A generated TOML template string.
    Template(String),
    /// Confirmation that a template was written to a file.
    TemplateWritten { path: PathBuf },
}

impl fmt::Display for RulesResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesResult::Listing { entries } => {
                for (i, (name, chain)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{name} = {chain}")?;
                }
                Ok(())
            }
            RulesResult::Rule { name, rule } => {
                writeln!(f, "# {name}")?;
                write!(f, "{}", to_pretty(rule)?)
            }
            RulesResult::Emitted(config) => write!(f, "{}", to_pretty(config)?),
            RulesResult::Template(t) => write!(f, "{t}"),
            RulesResult::TemplateWritten { path } => {
                write!(f, "Config template written to {}", path.display())
            }
        }
    }
}

fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String, fmt::Error> {
    serde_json::to_string_pretty(value).map_err(|_| fmt::Error)
}

/// Generate a commented TOML template from `BuildConfig`'s doc comments.
pub fn generate_template() -> String {
    confique::toml::template::<BuildConfig>(confique::toml::FormatOptions::default())
}

/// Display name of a rule: its name, or its matcher for anonymous rules.
pub fn display_name(rule: &Rule) -> String {
    match &rule.name {
        Some(name) => name.clone(),
        None => rule.test.to_string(),
    }
}

/// List every rule with its step chain, in emission order.
pub fn list_rules(registry: &RuleRegistry) -> RulesResult {
    let entries = registry
        .rules()
        .iter()
        .map(|rule| {
            let chain: Vec<&str> = rule.steps.iter().map(|s| s.name.as_str()).collect();
            (display_name(rule), chain.join(", "))
        })
        .collect();
    RulesResult::Listing { entries }
}

/// Show one named rule as it will be emitted.
pub fn show_rule(registry: &RuleRegistry, name: &str) -> Result<RulesResult, RulefigError> {
    let rule = registry
        .get(name)
        .ok_or_else(|| RulefigError::RuleNotFound(name.into()))?;
    Ok(RulesResult::Rule {
        name: name.into(),
        rule: ModuleRule::from(rule),
    })
}

/// Emit the full module configuration.
pub fn emit_rules(registry: RuleRegistry) -> RulesResult {
    RulesResult::Emitted(registry.create())
}
