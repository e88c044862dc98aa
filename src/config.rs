//! Build configuration and the layered pipeline that produces it.
//!
//! Operates on pre-loaded data (`ResolveInput`) with no I/O, so the whole
//! pipeline is testable with synthetic inputs. Steps:
//!
//! 1. Validate each file (if strict mode)
//! 2. Parse and deep-merge config files (later overrides earlier)
//! 3. Deep-merge env vars on top
//! 4. Deep-merge programmatic overrides on top (highest priority)
//! 5. Deserialize the merged map into `BuildConfig`'s layer
//! 6. Let confique fill defaults

use std::path::PathBuf;

use confique::Config;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalogue::CatalogueConfig;
use crate::env;
use crate::error::RulefigError;
use crate::merge::{ArrayMode, deep_merge};
use crate::overrides;
use crate::patch::LoaderOverrides;
use crate::types::Target;
use crate::validate;

/// Everything the rule engine reads from the build configuration.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Build target: "generic" or "client".
    #[config(default = "generic")]
    pub target: Target,

    /// Source-map mode of the build, e.g. "source-map" or "eval".
    /// Any mode containing "source-map" turns style-sheet source maps on.
    pub devtool: Option<String>,

    /// Per-rule overrides keyed by rule name. `false` disables a rule; a table
    /// patches it. The reserved `options` table holds option maps shared by
    /// every step with the same key.
    pub loaders: Option<Map<String, Value>>,
}

impl BuildConfig {
    pub fn catalogue_config(&self) -> CatalogueConfig {
        CatalogueConfig::new(self.target, self.devtool.as_deref())
    }

    /// Interpret the `loaders` map. Absent means no overrides.
    pub fn overrides(&self) -> LoaderOverrides {
        self.loaders
            .as_ref()
            .map(LoaderOverrides::from_map)
            .unwrap_or_default()
    }
}

/// All pre-loaded data needed to resolve a config. No I/O happens here.
pub struct ResolveInput {
    /// File contents in precedence order: first = lowest priority, last = highest.
    pub files: Vec<(PathBuf, String)>,
    /// Raw environment variable pairs.
    pub env_vars: Vec<(String, String)>,
    /// Env var prefix (e.g. `"RULEFIG"`). `None` means env disabled.
    pub env_prefix: Option<String>,
    /// Programmatic overrides as `(dotted_key, value)` pairs.
    pub overrides: Vec<(String, Value)>,
    /// Whether to reject unknown keys in config files.
    pub strict: bool,
}

/// Resolve a [`BuildConfig`] from pre-loaded inputs.
///
/// Layers are merged with [`ArrayMode::Replace`]: an array in a later layer
/// replaces the earlier one outright.
pub fn resolve_config(input: ResolveInput) -> Result<BuildConfig, RulefigError> {
    let mut merged = Map::new();
    for (path, content) in &input.files {
        if input.strict {
            validate::validate_unknown_keys::<BuildConfig>(content, path)?;
        }
        let table: toml::Table = toml::from_str(content).map_err(|e| RulefigError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        let layer = match serde_json::to_value(table) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                return Err(RulefigError::InvalidValue {
                    key: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };
        merged = deep_merge(merged, layer, ArrayMode::Replace);
    }

    if let Some(prefix) = &input.env_prefix {
        let env_map = env::env_to_map(prefix, input.env_vars);
        merged = deep_merge(merged, env_map, ArrayMode::Replace);
    }

    if !input.overrides.is_empty() {
        let override_map = overrides::overrides_to_map(&input.overrides);
        merged = deep_merge(merged, override_map, ArrayMode::Replace);
    }

    let layer: <BuildConfig as Config>::Layer = serde_json::from_value(Value::Object(merged))
        .map_err(|e| RulefigError::InvalidValue {
            key: "<merged>".into(),
            reason: e.to_string(),
        })?;

    BuildConfig::builder()
        .preloaded(layer)
        .load()
        .map_err(RulefigError::from)
}
