//! Layered module-rule configuration for JavaScript bundler builds.
//!
//! Rulefig owns a catalogue of default module rules (lint, transpile, style,
//! and asset rules), folds a caller's override map into it, lets the caller
//! add or extend rules afterwards, and emits the ordered rule list the
//! bundler consumes.
//!
//! ```ignore
//! let module = Rulefig::builder()
//!     .target(Target::Client)
//!     .devtool("source-map")
//!     .loaders(json!({"eslint": false, "babel": {"options": {"comments": false}}}))
//!     .create()?;
//! println!("{}", module.to_json_pretty()?);
//! ```
//!
//! # Pipeline
//!
//! ```text
//! BuildConfig  ──► catalogue::build ──► resolve ──► RuleRegistry ──► create
//! (layers)          default rules       loaders map   add / merge       ModuleConfig
//! ```
//!
//! - The **catalogue** is a pure function of the build target and `devtool`.
//! - **Resolution** applies the `loaders` map: `false` drops a rule, a table
//!   patches its matcher, step chain, or options. Patches never reorder rules.
//! - The **registry** accepts [`add_loader`](RuleRegistry::add_loader) (new
//!   or replacement rules) and [`merge_loader`](RuleRegistry::merge_loader)
//!   (options for existing steps, by step key or by rule name).
//! - **Assembly** projects the rules into [`ModuleConfig`], serializable as
//!   the bundler's `module.rules` JSON.
//!
//! # Option precedence
//!
//! Option maps merge recursively. Scalars in the later map win; arrays are
//! concatenated with duplicates dropped.
//!
//! ```text
//! step's own options        catalogue defaults
//!        ↑ overridden by
//! loaders.options.<step>    every step with that key, in every rule
//!        ↑ overridden by
//! loaders.<rule>.options    the rule's primary step only
//! ```
//!
//! A step key is the step name without its `-loader` suffix: `babel` addresses
//! `babel-loader`.
//!
//! # Layer precedence
//!
//! The [`BuildConfig`] itself is layered, every layer sparse:
//!
//! ```text
//! Compiled defaults     #[config(default = ...)]
//!        ↑ overridden by
//! Config files          search paths in order, later paths win
//!        ↑ overridden by
//! Environment vars      PREFIX__KEY (only with .env_prefix())
//!        ↑ overridden by
//! Overrides             .target() / .devtool() / .loaders() / .set()
//! ```
//!
//! Arrays in a later layer replace earlier ones outright. In strict mode (the
//! default) an unknown top-level key in a config file is an error that names
//! the file and line.
//!
//! # CLI
//!
//! With the `clap` feature (on by default), [`RulesArgs`] gives an app
//! `rules list|show|emit|gen` subcommands. Without clap, construct
//! [`RulesAction`] values directly and pass them to
//! [`RulefigBuilder::handle`].
//!
//! # Logging
//!
//! Lenient skips (disabled rules, unknown override names, merges that match
//! no step) are reported through [`tracing`] at debug level; malformed
//! override entries at warn level. The library never installs a subscriber.

pub mod error;
pub mod types;

pub mod assemble;
pub mod catalogue;
pub mod patch;
pub mod registry;
pub mod rule;
pub mod step;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod config;
mod env;
mod file;
pub(crate) mod merge;
mod ops;
mod overrides;
mod resolve;
mod validate;

#[cfg(test)]
mod fixtures;

pub use assemble::{ModuleConfig, ModuleRule, UseEntry};
pub use builder::{Rulefig, RulefigBuilder};
pub use catalogue::CatalogueConfig;
#[cfg(feature = "clap")]
pub use cli::{RulesArgs, RulesSubcommand};
pub use config::BuildConfig;
pub use error::RulefigError;
pub use ops::RulesResult;
pub use patch::{LoaderOverrides, OverrideEntry, RulePatch};
pub use registry::{MergeOutcome, RuleRegistry};
pub use rule::{Enforce, Matcher, Rule};
pub use step::{Options, StepRef};
pub use types::{Boundary, RulesAction, SearchMode, SearchPath, Target};
