//! Fold the caller's override map into the catalogue.
//!
//! A single pass over the catalogue in order. Each rule is kept, dropped, or
//! patched in place; overrides never reorder rules. Steps are then given
//! their global per-step options, and the primary step its per-rule options:
//!
//! ```text
//! step's own options  <  loaders.options.<step key>  <  loaders.<rule>.options
//! ```
//!
//! Override names the catalogue does not know are appended afterwards, in
//! override order, but only when the patch is a complete rule (`test` plus a
//! step chain). Anything else naming an unknown rule is ignored.

use crate::patch::{LoaderOverrides, OverrideEntry, RulePatch};
use crate::rule::Rule;
use crate::step::Options;

/// Apply `overrides` to `catalogue`, returning the resolved rules.
pub fn resolve(catalogue: Vec<Rule>, overrides: &LoaderOverrides) -> Vec<Rule> {
    let known: Vec<String> = catalogue.iter().filter_map(|r| r.name.clone()).collect();
    let global = overrides.global_options();

    let mut resolved = Vec::with_capacity(catalogue.len());
    for rule in catalogue {
        let entry = rule.name.as_deref().and_then(|name| overrides.get(name));
        match entry {
            Some(OverrideEntry::Disable) => {
                tracing::debug!(rule = ?rule.name, "rule disabled");
            }
            Some(OverrideEntry::Patch(patch)) => resolved.push(apply_patch(rule, patch, global)),
            None => resolved.push(apply_global(rule, global)),
        }
    }

    for (name, entry) in overrides.entries() {
        if known.iter().any(|k| k == name) {
            continue;
        }
        match entry {
            OverrideEntry::Patch(patch) if patch.is_complete() => {
                if let Some(rule) = rule_from_patch(name, patch) {
                    tracing::debug!(rule = name, "adding rule from overrides");
                    resolved.push(apply_global(rule, global));
                }
            }
            _ => tracing::debug!(rule = name, "override names no known rule; skipped"),
        }
    }

    resolved
}

fn apply_patch(mut rule: Rule, patch: &RulePatch, global: &[(String, Options)]) -> Rule {
    if let Some(test) = &patch.test {
        rule.test = test.clone();
    }
    if let Some(exclude) = &patch.exclude {
        rule.exclude = Some(exclude.clone());
    }
    if let Some(enforce) = patch.enforce {
        rule.enforce = Some(enforce);
    }
    if let Some(steps) = &patch.steps {
        rule.steps = steps.clone();
    }
    let mut rule = apply_global(rule, global);
    if let Some(options) = &patch.options {
        rule.merge_primary_options(options);
    }
    rule
}

fn apply_global(mut rule: Rule, global: &[(String, Options)]) -> Rule {
    for (key, options) in global {
        let mut matched = false;
        for step in rule.steps.iter_mut().filter(|s| s.matches(key)) {
            step.merge_options(options);
            matched = true;
        }
        if matched {
            tracing::trace!(rule = ?rule.name, step = %key, "applied global step options");
        }
    }
    rule
}

fn rule_from_patch(name: &str, patch: &RulePatch) -> Option<Rule> {
    let mut rule = Rule::named(name, patch.test.clone()?, patch.steps.clone()?);
    rule.exclude = patch.exclude.clone();
    rule.enforce = patch.enforce;
    if let Some(options) = &patch.options {
        rule.merge_primary_options(options);
    }
    Some(rule)
}
