//! Built-in rules, before any caller overrides.
//!
//! The catalogue is a pure function of [`CatalogueConfig`]: the same snapshot
//! always yields the same rules, in the same order, with the same matchers.

use serde_json::{Value, json};

use crate::rule::{Enforce, Matcher, Rule};
use crate::step::{Options, StepRef};
use crate::types::Target;

/// The slice of build configuration the catalogue depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogueConfig {
    pub target: Target,
    /// Build-wide source-map flag, derived from `devtool`.
    pub source_map: bool,
}

impl CatalogueConfig {
    pub fn new(target: Target, devtool: Option<&str>) -> Self {
        Self {
            target,
            source_map: devtool_has_source_map(devtool),
        }
    }
}

/// Whether a `devtool` mode produces source maps (`source-map`,
/// `cheap-module-source-map`, `eval-source-map`, ...).
pub fn devtool_has_source_map(devtool: Option<&str>) -> bool {
    devtool.is_some_and(|d| d.contains("source-map"))
}

const SCRIPT: &str = r"\.jsx?$";
const NODE_MODULES: &str = "node_modules";
const IMAGE: &str = r"\.(png|jpe?g|gif|svg)(\?.*)?$";
const FONT: &str = r"\.(woff2?|eot|ttf|otf)(\?.*)?$";
const MEDIA: &str = r"\.(mp4|webm|ogg|mp3|wav|flac|aac)(\?.*)?$";
const URL_LIMIT: u64 = 1024;

/// Build the default rule list for `config`.
pub fn build(config: &CatalogueConfig) -> Vec<Rule> {
    let mut rules = vec![
        Rule::named("eslint", Matcher::builtin(SCRIPT), vec![StepRef::new("eslint-loader")])
            .exclude(Matcher::builtin(NODE_MODULES))
            .enforce(Enforce::Pre),
        Rule::named(
            "babel",
            Matcher::builtin(SCRIPT),
            vec![StepRef::with_options(
                "babel-loader",
                options(json!({"presets": ["es2015"], "comments": true})),
            )],
        )
        .exclude(Matcher::builtin(NODE_MODULES)),
        Rule::named(
            "css",
            Matcher::builtin(r"\.css$"),
            vec![
                StepRef::new("style-loader"),
                StepRef::new("css-loader"),
                postcss_step(config),
            ],
        ),
        url_rule("urlimage", IMAGE),
        url_rule("urlfont", FONT),
        url_rule("urlmedia", MEDIA),
    ];

    if config.target == Target::Client {
        rules.push(Rule::named(
            "nunjucks",
            Matcher::builtin(r"\.html$"),
            vec![
                StepRef::new("html-loader"),
                StepRef::with_options(
                    "nunjucks-html-loader",
                    options(json!({"searchPaths": ["src/widget", "src/component"]})),
                ),
            ],
        ));
    }

    rules
}

/// The names of the rules [`build`] produces, in order.
pub fn rule_names(config: &CatalogueConfig) -> Vec<String> {
    build(config).into_iter().filter_map(|r| r.name).collect()
}

// Only client builds track the source-map flag; generic builds leave the
// option unset so the step falls back to its own default.
fn postcss_step(config: &CatalogueConfig) -> StepRef {
    match config.target {
        Target::Client => StepRef::with_options(
            "postcss-loader",
            options(json!({"sourceMap": config.source_map})),
        ),
        Target::Generic => StepRef::new("postcss-loader"),
    }
}

fn url_rule(name: &str, pattern: &'static str) -> Rule {
    Rule::named(
        name,
        Matcher::builtin(pattern),
        vec![StepRef::with_options(
            "url-loader",
            options(json!({"limit": URL_LIMIT})),
        )],
    )
}

fn options(value: Value) -> Options {
    match value {
        Value::Object(map) => map,
        _ => Options::new(),
    }
}
