//! Small shared types: build targets, config discovery, and actions.
//!
//! # Common discovery patterns
//!
//! Project-local config, nearest file wins:
//!
//! ```ignore
//! Rulefig::builder()
//!     .search_paths(vec![SearchPath::Ancestors(Boundary::Marker("package.json"))])
//!     .search_mode(SearchMode::FirstMatch)
//! ```
//!
//! Shared defaults plus per-project tweaks:
//!
//! ```ignore
//! Rulefig::builder()
//!     .search_paths(vec![SearchPath::Path("/etc/rulefig".into()), SearchPath::Cwd])
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What the emitted rules are built for.
///
/// `Client` builds run in a browser and carry the environment-sensitive steps
/// (style-sheet source maps, template loaders).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Generic,
    Client,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Generic => write!(f, "generic"),
            Target::Client => write!(f, "client"),
        }
    }
}

/// Where to stop when walking up from the working directory.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    /// Walk all the way to the filesystem root.
    Root,
    /// Stop (inclusive) at the first directory containing this file or directory.
    Marker(&'static str),
}

/// Where to search for config files.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Current working directory.
    Cwd,
    /// An explicit directory.
    Path(PathBuf),
    /// Every directory from the boundary down to the working directory,
    /// shallowest first.
    Ancestors(Boundary),
}

/// What to do when more than one config file is found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Deep-merge every file found; later files win key-by-key.
    #[default]
    Merge,
    /// Use only the highest-priority file found.
    FirstMatch,
}

/// A rules operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum RulesAction {
    List,
    Show { name: String },
    Emit,
    Gen { output: Option<PathBuf> },
}
