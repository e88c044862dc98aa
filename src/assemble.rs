//! Project resolved rules into the shape the build tool consumes.

use serde::Serialize;

use crate::rule::{Enforce, Rule};
use crate::step::{Options, StepRef};

/// One entry of a rule's `use` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UseEntry {
    /// A step with no options, emitted as its bare name.
    Name(String),
    Loader { loader: String, options: Options },
}

impl UseEntry {
    pub fn loader(&self) -> &str {
        match self {
            UseEntry::Name(name) => name,
            UseEntry::Loader { loader, .. } => loader,
        }
    }

    pub fn options(&self) -> Option<&Options> {
        match self {
            UseEntry::Name(_) => None,
            UseEntry::Loader { options, .. } => Some(options),
        }
    }
}

impl From<&StepRef> for UseEntry {
    fn from(step: &StepRef) -> Self {
        match &step.options {
            Some(options) => UseEntry::Loader {
                loader: step.name.clone(),
                options: options.clone(),
            },
            None => UseEntry::Name(step.name.clone()),
        }
    }
}

/// One emitted module rule. Matchers are emitted as their pattern source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleRule {
    pub test: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enforce: Option<Enforce>,
    #[serde(rename = "use")]
    pub uses: Vec<UseEntry>,
}

impl ModuleRule {
    pub fn uses_loader(&self, loader: &str) -> bool {
        self.uses.iter().any(|u| u.loader() == loader)
    }

    pub fn entry(&self, loader: &str) -> Option<&UseEntry> {
        self.uses.iter().find(|u| u.loader() == loader)
    }
}

/// The emitted, ordered rule list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleConfig {
    pub rules: Vec<ModuleRule>,
}

impl ModuleConfig {
    /// The first rule whose chain includes `loader` (a full step name).
    pub fn rule_using(&self, loader: &str) -> Option<&ModuleRule> {
        self.rules.iter().find(|r| r.uses_loader(loader))
    }

    /// The first rule whose matcher source equals `source`.
    pub fn rule_with_test(&self, source: &str) -> Option<&ModuleRule> {
        self.rules.iter().find(|r| r.test == source)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&Rule> for ModuleRule {
    fn from(rule: &Rule) -> Self {
        ModuleRule {
            test: rule.test.as_str().to_string(),
            exclude: rule.exclude.as_ref().map(|m| m.as_str().to_string()),
            enforce: rule.enforce,
            uses: rule.steps.iter().map(UseEntry::from).collect(),
        }
    }
}

/// Emit `rules` in order. Pure projection; no merging happens here.
pub fn assemble(rules: &[Rule]) -> ModuleConfig {
    ModuleConfig {
        rules: rules.iter().map(ModuleRule::from).collect(),
    }
}
