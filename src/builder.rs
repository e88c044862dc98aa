use std::path::PathBuf;

use serde_json::{Value, json};

use crate::assemble::ModuleConfig;
use crate::catalogue;
use crate::config::{self, BuildConfig, ResolveInput};
use crate::error::RulefigError;
use crate::file;
use crate::ops::{self, RulesResult};
use crate::overrides;
use crate::registry::RuleRegistry;
use crate::resolve;
use crate::types::{RulesAction, SearchMode, SearchPath, Target};

/// Entry point for building module rules.
pub struct Rulefig;

impl Rulefig {
    pub fn builder() -> RulefigBuilder {
        RulefigBuilder::new()
    }
}

/// A registry adjustment queued on the builder, applied in call order after
/// overrides are resolved.
#[derive(Debug, Clone, PartialEq)]
enum RegistryOp {
    Add(Value),
    Merge(Value),
}

/// Builder for loading the build configuration and producing module rules.
///
/// Three groups of settings:
///
/// - **Discovery**: [`search_paths()`](Self::search_paths),
///   [`search_mode()`](Self::search_mode), [`file_name()`](Self::file_name).
/// - **Configuration layers**: [`env_prefix()`](Self::env_prefix) and the
///   programmatic overrides ([`target()`](Self::target),
///   [`devtool()`](Self::devtool), [`loaders()`](Self::loaders),
///   [`set()`](Self::set)).
/// - **Registry adjustments**: [`add_loader()`](Self::add_loader) and
///   [`merge_loader()`](Self::merge_loader), applied after the loaders map.
pub struct RulefigBuilder {
    file_name: String,
    search_paths: Vec<SearchPath>,
    search_mode: SearchMode,
    config_files: Vec<PathBuf>,
    env_prefix: Option<String>,
    strict: bool,
    overrides: Vec<(String, Value)>,
    registry_ops: Vec<RegistryOp>,
}

impl RulefigBuilder {
    fn new() -> Self {
        Self {
            file_name: "rulefig.toml".into(),
            search_paths: Vec::new(),
            search_mode: SearchMode::default(),
            config_files: Vec::new(),
            env_prefix: None,
            strict: true,
            overrides: Vec::new(),
            registry_ops: Vec::new(),
        }
    }

    /// Override the config file name (default: `"rulefig.toml"`).
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = name.to_string();
        self
    }

    /// Replace the search paths entirely (default: none, so no files are read).
    ///
    /// Paths are listed in **priority-ascending** order: the last entry has the
    /// highest priority.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.search_paths.push(path);
        self
    }

    /// Set the search mode (default: [`SearchMode::Merge`]).
    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Add an explicit config file, layered above every discovered file.
    /// Unlike search paths, a missing file is an error.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_files.push(path.into());
        self
    }

    /// Read `{PREFIX}__*` environment variables. Env is off until this is set.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Disable environment variable loading.
    pub fn no_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Enable or disable strict mode (default: `true`).
    /// In strict mode, unknown keys in config files produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn target(self, target: Target) -> Self {
        self.push_override("target", json!(target))
    }

    pub fn devtool(self, devtool: &str) -> Self {
        self.push_override("devtool", json!(devtool))
    }

    /// Merge a whole loaders map, entry by entry, over the file and env layers.
    /// A non-map value is ignored.
    pub fn loaders(mut self, loaders: Value) -> Self {
        match loaders {
            Value::Object(map) => {
                for (name, entry) in map {
                    self.overrides.push((format!("loaders.{name}"), entry));
                }
            }
            other => tracing::warn!(value = %other, "ignoring non-map loaders override"),
        }
        self
    }

    /// Set the override entry for one rule (or `"options"` for global step options).
    pub fn loader(self, name: &str, entry: Value) -> Self {
        self.push_override(&format!("loaders.{name}"), entry)
    }

    /// Set any config value by dotted key. Keys outside the config's
    /// top-level fields are ignored.
    pub fn set(self, key: &str, value: Value) -> Self {
        if !overrides::is_valid_key(&<BuildConfig as confique::Config>::META, key) {
            tracing::warn!(key, "ignoring override for unknown config key");
            return self;
        }
        self.push_override(key, value)
    }

    fn push_override(mut self, key: &str, value: Value) -> Self {
        self.overrides.push((key.to_string(), value));
        self
    }

    /// Queue rules to add after overrides are resolved. See
    /// [`RuleRegistry::add_loader`] for the accepted shapes.
    pub fn add_loader(mut self, input: Value) -> Self {
        self.registry_ops.push(RegistryOp::Add(input));
        self
    }

    /// Queue step options to merge after overrides are resolved. See
    /// [`RuleRegistry::merge_loader`] for the accepted shapes.
    pub fn merge_loader(mut self, input: Value) -> Self {
        self.registry_ops.push(RegistryOp::Merge(input));
        self
    }

    fn build_input(&self) -> Result<ResolveInput, RulefigError> {
        let mut files =
            file::load_config_files(&self.search_paths, &self.file_name, self.search_mode)?;
        for path in &self.config_files {
            files.push(file::load_file(path)?);
        }
        let env_vars: Vec<(String, String)> = match self.env_prefix {
            Some(_) => std::env::vars().collect(),
            None => Vec::new(),
        };

        Ok(ResolveInput {
            files,
            env_vars,
            env_prefix: self.env_prefix.clone(),
            overrides: self.overrides.clone(),
            strict: self.strict,
        })
    }

    /// Load and resolve the build configuration through all layers.
    pub fn load_config(&self) -> Result<BuildConfig, RulefigError> {
        config::resolve_config(self.build_input()?)
    }

    /// Resolve the catalogue against the loaders map, then apply queued
    /// registry adjustments in order.
    pub fn build(self) -> Result<RuleRegistry, RulefigError> {
        let config = self.load_config()?;
        let rules = catalogue::build(&config.catalogue_config());
        let mut registry = RuleRegistry::new(resolve::resolve(rules, &config.overrides()));
        tracing::debug!(build_target = %config.target, rules = registry.len(), "rules resolved");

        for op in &self.registry_ops {
            match op {
                RegistryOp::Add(input) => registry.add_loader(input)?,
                RegistryOp::Merge(input) => registry.merge_loader(input)?,
            };
        }
        Ok(registry)
    }

    /// Build and emit the module configuration.
    pub fn create(self) -> Result<ModuleConfig, RulefigError> {
        Ok(self.build()?.create())
    }

    /// Handle a `RulesAction` and print the result to stdout.
    pub fn handle_and_print(self, action: &RulesAction) -> Result<(), RulefigError> {
        let result = self.handle(action)?;
        println!("{result}");
        Ok(())
    }

    /// Handle a `RulesAction` (list / show / emit / gen).
    pub fn handle(self, action: &RulesAction) -> Result<RulesResult, RulefigError> {
        match action {
            RulesAction::List => Ok(ops::list_rules(&self.build()?)),
            RulesAction::Show { name } => ops::show_rule(&self.build()?, name),
            RulesAction::Emit => Ok(ops::emit_rules(self.build()?)),
            RulesAction::Gen { output } => {
                let template = ops::generate_template();
                match output {
                    Some(path) => {
                        if let Some(parent) = path.parent() {
                            std::fs::create_dir_all(parent).map_err(|e| RulefigError::IoError {
                                path: parent.to_path_buf(),
                                source: e,
                            })?;
                        }
                        std::fs::write(path, &template).map_err(|e| RulefigError::IoError {
                            path: path.clone(),
                            source: e,
                        })?;
                        Ok(RulesResult::TemplateWritten { path: path.clone() })
                    }
                    None => Ok(RulesResult::Template(template)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{ModuleRule, UseEntry};
    use crate::types::Boundary;
    use std::fs;
    use tempfile::TempDir;

    const IMAGE: &str = r"\.(png|jpe?g|gif|svg)(\?.*)?$";
    const FONT: &str = r"\.(woff2?|eot|ttf|otf)(\?.*)?$";
    const MEDIA: &str = r"\.(mp4|webm|ogg|mp3|wav|flac|aac)(\?.*)?$";

    fn create(builder: RulefigBuilder) -> ModuleConfig {
        builder.create().unwrap()
    }

    fn options<'a>(rule: &'a ModuleRule, loader: &str) -> &'a serde_json::Map<String, Value> {
        rule.entry(loader)
            .and_then(UseEntry::options)
            .unwrap_or_else(|| panic!("{loader} has no options"))
    }

    fn assert_vuehtml(config: &ModuleConfig) {
        let rule = config.rule_using("vue-html-loader").unwrap();
        assert_eq!(rule.test, r"\.html$");
        assert_eq!(rule.uses[0].loader(), "vue-html-loader");
        assert_eq!(options(rule, "vue-html-loader")["test"], json!(true));
    }

    // --- Builder state ---

    #[test]
    fn defaults() {
        let builder = Rulefig::builder();
        assert_eq!(builder.file_name, "rulefig.toml");
        assert!(builder.search_paths.is_empty());
        assert_eq!(builder.search_mode, SearchMode::Merge);
        assert_eq!(builder.env_prefix, None);
        assert!(builder.strict);
    }

    #[test]
    fn env_prefix_and_no_env() {
        let builder = Rulefig::builder().env_prefix("RULEFIG");
        assert_eq!(builder.env_prefix.as_deref(), Some("RULEFIG"));
        assert_eq!(builder.no_env().env_prefix, None);
    }

    #[test]
    fn add_search_path_appends() {
        let builder = Rulefig::builder()
            .search_paths(vec![SearchPath::Cwd])
            .add_search_path(SearchPath::Ancestors(Boundary::Root));
        assert_eq!(
            builder.search_paths,
            vec![SearchPath::Cwd, SearchPath::Ancestors(Boundary::Root)]
        );
    }

    #[test]
    fn loaders_expand_per_entry() {
        let builder = Rulefig::builder().loaders(json!({"eslint": false, "babel": {"options": {}}}));
        let keys: Vec<&str> = builder.overrides.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["loaders.eslint", "loaders.babel"]);
    }

    #[test]
    fn set_skips_unknown_root() {
        let builder = Rulefig::builder()
            .set("output.path", json!("dist"))
            .set("devtool", json!("eval"));
        assert_eq!(builder.overrides, vec![("devtool".to_string(), json!("eval"))]);
    }

    // --- Default catalogue ---

    #[test]
    fn default_rules_are_complete() {
        let config = create(Rulefig::builder());
        for loader in ["eslint-loader", "babel-loader", "css-loader"] {
            assert!(config.rule_using(loader).is_some(), "missing {loader}");
        }
        for test in [IMAGE, FONT, MEDIA] {
            let rule = config.rule_with_test(test).unwrap();
            assert!(!rule.uses.is_empty());
        }
    }

    #[test]
    fn create_is_deterministic() {
        let make = || {
            Rulefig::builder()
                .target(Target::Client)
                .devtool("source-map")
                .loader("babel", json!({"options": {"comments": false}}))
        };
        assert_eq!(create(make()), create(make()));
    }

    // --- Loaders map ---

    #[test]
    fn disabled_rules_are_absent() {
        let config = create(Rulefig::builder().loaders(json!({
            "eslint": false,
            "babel": false,
            "urlfont": false
        })));
        assert!(config.rule_using("eslint-loader").is_none());
        assert!(config.rule_using("babel-loader").is_none());
        assert!(config.rule_with_test(FONT).is_none());
        assert!(config.rule_with_test(IMAGE).is_some());
    }

    #[test]
    fn per_rule_options_merge() {
        let config = create(Rulefig::builder().loaders(json!({
            "eslint": {"options": {"fix": true}},
            "babel": {"options": {
                "presets": ["es2015", "stage-2"],
                "plugins": ["add-module-exports"],
                "comments": false
            }}
        })));
        let eslint = config.rule_using("eslint-loader").unwrap();
        assert_eq!(options(eslint, "eslint-loader")["fix"], json!(true));

        let babel = options(config.rule_using("babel-loader").unwrap(), "babel-loader");
        assert_eq!(babel["presets"], json!(["es2015", "stage-2"]));
        assert_eq!(babel["plugins"], json!(["add-module-exports"]));
        assert_eq!(babel["comments"], json!(false));
    }

    #[test]
    fn use_override_with_global_options() {
        let config = create(Rulefig::builder().loaders(json!({
            "babel": {"use": ["babel-loader", "eslint-loader"]},
            "options": {
                "babel": {"options": {
                    "presets": ["es2015", "stage-2"],
                    "plugins": ["add-module-exports"],
                    "comments": false
                }},
                "eslint": {"options": {"fix": true}}
            }
        })));
        let rule = config
            .rules
            .iter()
            .find(|r| {
                r.uses.len() == 2
                    && r.uses[0].loader() == "babel-loader"
                    && r.uses[1].loader() == "eslint-loader"
            })
            .unwrap();
        let babel = options(rule, "babel-loader");
        assert!(babel.contains_key("presets") && babel.contains_key("plugins"));
        assert_eq!(options(rule, "eslint-loader")["fix"], json!(true));
    }

    #[test]
    fn unknown_complete_entry_adds_rule() {
        let config = create(Rulefig::builder().loader(
            "vuehtml",
            json!({"test": r"\.html$", "loader": "vue-html-loader", "options": {"test": true}}),
        ));
        assert_vuehtml(&config);
        assert_eq!(config.rules.last().unwrap().uses[0].loader(), "vue-html-loader");
    }

    // --- Add / Merge ---

    #[test]
    fn merge_nunjucks_search_paths() {
        let config = create(
            Rulefig::builder()
                .target(Target::Client)
                .merge_loader(json!({"nunjucks-html": {"options": {"searchPaths": ["./widget", "./test"]}}})),
        );
        let rule = config.rule_using("nunjucks-html-loader").unwrap();
        assert_eq!(rule.uses[1].loader(), "nunjucks-html-loader");
        assert_eq!(
            options(rule, "nunjucks-html-loader")["searchPaths"],
            json!(["src/widget", "src/component", "./widget", "./test"])
        );
    }

    #[test]
    fn merge_nunjucks_by_rule_name() {
        let config = create(
            Rulefig::builder()
                .target(Target::Client)
                .merge_loader(json!({"nunjucks": {"options": {"searchPaths": ["./widget", "./test"]}}})),
        );
        let rule = config.rule_using("nunjucks-html-loader").unwrap();
        assert_eq!(rule.uses[1].loader(), "nunjucks-html-loader");
        assert_eq!(
            options(rule, "nunjucks-html-loader")["searchPaths"],
            json!(["src/widget", "src/component", "./widget", "./test"])
        );
    }

    #[test]
    fn add_named_rule() {
        assert_vuehtml(&create(Rulefig::builder().add_loader(json!({
            "vuehtml": {"test": r"\.html$", "loader": "vue-html-loader", "options": {"test": true}}
        }))));
    }

    #[test]
    fn add_raw_rule() {
        assert_vuehtml(&create(Rulefig::builder().add_loader(json!({
            "test": r"\.html$", "loader": "vue-html-loader", "options": {"test": true}
        }))));
    }

    #[test]
    fn add_raw_rule_with_regex_literal() {
        assert_vuehtml(&create(Rulefig::builder().add_loader(json!({
            "test": r"/\.html$/", "loader": "vue-html-loader", "options": {"test": true}
        }))));
    }

    #[test]
    fn add_use_string_item() {
        let config = create(
            Rulefig::builder().add_loader(json!({"test": r"\.html$", "use": ["vue-html-loader"]})),
        );
        let rule = config.rule_using("vue-html-loader").unwrap();
        assert_eq!(rule.uses[0], UseEntry::Name("vue-html-loader".into()));
    }

    #[test]
    fn add_use_object_item() {
        assert_vuehtml(&create(Rulefig::builder().add_loader(json!({
            "test": r"\.html$",
            "use": [{"loader": "vue-html-loader", "options": {"test": true}}]
        }))));
    }

    #[test]
    fn add_array_of_raw_rules() {
        assert_vuehtml(&create(Rulefig::builder().add_loader(json!([{
            "test": r"\.html$",
            "use": [{"loader": "vue-html-loader", "options": {"test": true}}]
        }]))));
    }

    #[test]
    fn add_array_of_named_maps() {
        assert_vuehtml(&create(Rulefig::builder().add_loader(json!([{
            "vuehtml": {"test": r"\.html$", "loader": "vue-html-loader", "options": {"test": true}}
        }]))));
    }

    #[test]
    fn add_invalid_input_fails_build() {
        let result = Rulefig::builder().add_loader(json!("vue-html-loader")).create();
        assert!(matches!(result, Err(RulefigError::InvalidRuleShape { .. })));
    }

    #[test]
    fn add_bad_pattern_fails_build() {
        let result = Rulefig::builder()
            .add_loader(json!({"test": "(", "loader": "vue-html-loader"}))
            .create();
        assert!(matches!(result, Err(RulefigError::InvalidPattern { .. })));
    }

    // --- Environment-sensitive defaults ---

    #[test]
    fn postcss_default_has_no_source_map() {
        let config = create(Rulefig::builder());
        let css = config.rule_using("css-loader").unwrap();
        assert_eq!(
            css.entry("postcss-loader"),
            Some(&UseEntry::Name("postcss-loader".into()))
        );
    }

    #[test]
    fn postcss_follows_devtool_on_client() {
        let config = create(Rulefig::builder().target(Target::Client).devtool("source-map"));
        let css = config.rule_using("css-loader").unwrap();
        assert_eq!(options(css, "postcss-loader")["sourceMap"], json!(true));
    }

    #[test]
    fn postcss_global_option_beats_devtool() {
        let config = create(
            Rulefig::builder()
                .target(Target::Client)
                .devtool("source-map")
                .loader("options", json!({"postcss": {"sourceMap": false}})),
        );
        let css = config.rule_using("css-loader").unwrap();
        assert_eq!(options(css, "postcss-loader")["sourceMap"], json!(false));
    }

    // --- Load tests ---

    #[test]
    fn load_from_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("rulefig.toml"),
            "target = \"client\"\n\n[loaders]\neslint = false\n",
        )
        .unwrap();

        let config = create(
            Rulefig::builder().search_paths(vec![SearchPath::Path(dir.path().to_path_buf())]),
        );
        assert!(config.rule_using("eslint-loader").is_none());
        assert!(config.rule_using("nunjucks-html-loader").is_some());
    }

    #[test]
    fn override_beats_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rulefig.toml"), "[loaders]\neslint = false\n").unwrap();

        let config = create(
            Rulefig::builder()
                .search_paths(vec![SearchPath::Path(dir.path().to_path_buf())])
                .loader("eslint", json!(true)),
        );
        assert!(config.rule_using("eslint-loader").is_some());
    }

    #[test]
    fn custom_file_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rules.toml"), "devtool = \"source-map\"\n").unwrap();

        let config = Rulefig::builder()
            .file_name("rules.toml")
            .search_paths(vec![SearchPath::Path(dir.path().to_path_buf())])
            .load_config()
            .unwrap();
        assert_eq!(config.devtool.as_deref(), Some("source-map"));
    }

    #[test]
    fn explicit_file_layers_above_search_paths() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rulefig.toml"), "devtool = \"eval\"\n").unwrap();
        let explicit = dir.path().join("ci.toml");
        fs::write(&explicit, "devtool = \"source-map\"\n").unwrap();

        let config = Rulefig::builder()
            .search_paths(vec![SearchPath::Path(dir.path().to_path_buf())])
            .config_file(&explicit)
            .load_config()
            .unwrap();
        assert_eq!(config.devtool.as_deref(), Some("source-map"));
    }

    #[test]
    fn missing_explicit_file_errors() {
        let dir = TempDir::new().unwrap();
        let result = Rulefig::builder()
            .config_file(dir.path().join("absent.toml"))
            .load_config();
        assert!(matches!(result, Err(RulefigError::IoError { .. })));
    }

    #[test]
    fn strict_rejects_unknown_file_key() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rulefig.toml"), "output = \"dist\"\n").unwrap();

        let result = Rulefig::builder()
            .search_paths(vec![SearchPath::Path(dir.path().to_path_buf())])
            .create();
        assert!(matches!(result, Err(RulefigError::UnknownKeys(_))));
    }

    // --- Actions ---

    #[test]
    fn handle_show_and_missing() {
        let result = Rulefig::builder()
            .handle(&RulesAction::Show {
                name: "babel".into(),
            })
            .unwrap();
        assert!(matches!(result, RulesResult::Rule { ref name, .. } if name == "babel"));

        let err = Rulefig::builder()
            .handle(&RulesAction::Show {
                name: "nunjucks".into(),
            })
            .unwrap_err();
        assert!(matches!(err, RulefigError::RuleNotFound(_)));
    }

    #[test]
    fn handle_emit_matches_create() {
        let emitted = Rulefig::builder().handle(&RulesAction::Emit).unwrap();
        assert_eq!(emitted, RulesResult::Emitted(create(Rulefig::builder())));
    }

    #[test]
    fn handle_gen_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("rulefig.toml");
        let result = Rulefig::builder()
            .handle(&RulesAction::Gen {
                output: Some(path.clone()),
            })
            .unwrap();
        assert_eq!(result, RulesResult::TemplateWritten { path: path.clone() });
        assert!(fs::read_to_string(&path).unwrap().contains("devtool"));
    }
}
