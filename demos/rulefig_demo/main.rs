//! # rulefig demo application
//!
//! A sample CLI that wires rulefig into a build tool's command line. It exists
//! to demonstrate and manually verify rulefig's features.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example rulefig_demo -- rules
//! cargo run --example rulefig_demo -- --target client rules emit
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                  | How to exercise it                                                     |
//! |--------------------------|------------------------------------------------------------------------|
//! | Default catalogue        | `cargo run --example rulefig_demo -- rules list`                       |
//! | Client target            | `cargo run --example rulefig_demo -- --target client rules list`       |
//! | Source-map propagation   | `... -- --target client --devtool source-map rules show css`           |
//! | Disable rules            | `cargo run --example rulefig_demo -- --disable eslint --disable urlfont rules` |
//! | Config file (ancestors)  | Create `rulefig.toml` in or above the cwd, then run `rules emit`       |
//! | Explicit config file     | `cargo run --example rulefig_demo -- --config ci.toml rules emit`      |
//! | Env var override         | `RULEFIG__LOADERS__BABEL=false cargo run --example rulefig_demo -- rules` |
//! | Env option key           | `RULEFIG__LOADERS__OPTIONS__POSTCSS__sourceMap=false ... -- --target client --devtool source-map rules show css` |
//! | `rules gen`              | `cargo run --example rulefig_demo -- rules gen -o rulefig.toml`        |
//! | Match a file             | `cargo run --example rulefig_demo -- check src/app.css`                |
//! | Logging                  | `RUST_LOG=rulefig=debug cargo run --example rulefig_demo -- rules`     |

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use rulefig::{Boundary, Rulefig, RulefigBuilder, RulesArgs, SearchMode, SearchPath, Target};

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// rulefig demo: inspect the module rules a build would use.
#[derive(Parser, Debug)]
#[command(name = "rulefig-demo")]
struct Cli {
    /// Build target.
    #[arg(long, global = true, value_enum)]
    target: Option<Target>,

    /// Source-map mode, e.g. "source-map" or "eval".
    #[arg(long, global = true)]
    devtool: Option<String>,

    /// Disable a rule by name. Repeatable.
    #[arg(long, global = true)]
    disable: Vec<String>,

    /// Read this config file on top of any discovered ones.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect the resolved rules (list, show, emit, gen).
    Rules(RulesArgs),
    /// Print which rules a file path would go through.
    Check {
        /// A source path, e.g. "src/app.css".
        path: String,
    },
}

// ---------------------------------------------------------------------------
// Builder helper
// ---------------------------------------------------------------------------

/// Search paths: every directory from the project root (the nearest
/// `package.json`) down to the cwd. Env prefix: `RULEFIG`.
fn make_builder(cli: &Cli) -> RulefigBuilder {
    let mut builder = Rulefig::builder()
        .search_paths(vec![SearchPath::Ancestors(Boundary::Marker("package.json"))])
        .search_mode(SearchMode::Merge)
        .env_prefix("RULEFIG");

    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    if let Some(target) = cli.target {
        builder = builder.target(target);
    }
    if let Some(devtool) = &cli.devtool {
        builder = builder.devtool(devtool);
    }
    for name in &cli.disable {
        builder = builder.loader(name, json!(false));
    }
    builder
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn check(builder: RulefigBuilder, path: &str) -> Result<(), rulefig::RulefigError> {
    let registry = builder.build()?;
    let matching: Vec<_> = registry
        .rules()
        .iter()
        .filter(|rule| rule.test.is_match(path))
        .filter(|rule| !rule.exclude.as_ref().is_some_and(|ex| ex.is_match(path)))
        .collect();

    if matching.is_empty() {
        println!("{path}: no rule matches");
        return Ok(());
    }
    for rule in matching {
        let name = rule.name.as_deref().unwrap_or("<anonymous>");
        let chain: Vec<&str> = rule.steps.iter().map(|s| s.name.as_str()).collect();
        println!("{path}: {name} ({})", chain.join(" <- "));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let builder = make_builder(&cli);

    let result = match cli.command {
        Commands::Rules(args) => builder.handle_and_print(&args.into_action()),
        Commands::Check { path } => check(builder, &path),
    };
    if let Err(e) = result {
        eprintln!("rulefig error:\n{e}");
        std::process::exit(1);
    }
}
