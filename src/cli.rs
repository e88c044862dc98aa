//! Clap adapter for rulefig.
//!
//! Compiled only when the `clap` Cargo feature is enabled (on by default).
//!
//! [`RulesArgs`] and [`RulesSubcommand`] embed into an application's clap
//! `#[derive(Parser)]` struct to get `rules list|show|emit|gen` subcommands.
//! The only bridge to the core is [`RulesArgs::into_action()`]; everything
//! after that flows through the clap-free
//! [`RulefigBuilder::handle()`](crate::RulefigBuilder::handle).

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::types::RulesAction;

/// Clap-derived args for the `rules` subcommand group.
///
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(subcommand)]
///     command: Commands,
/// }
///
/// #[derive(Subcommand)]
/// enum Commands {
///     Rules(RulesArgs),
/// }
/// ```
#[derive(Debug, Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub action: Option<RulesSubcommand>,
}

/// Available rules subcommands.
#[derive(Debug, Subcommand)]
pub enum RulesSubcommand {
    /// List every resolved rule with its step chain.
    List,
    /// Show one resolved rule as it will be emitted.
    Show {
        /// Rule name (e.g. "babel").
        name: String,
    },
    /// Print the full module configuration as JSON.
    Emit,
    /// Generate a commented sample configuration file.
    Gen {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl RulesArgs {
    /// Convert clap-parsed args into a framework-agnostic `RulesAction`.
    ///
    /// Bare `rules` (no subcommand) and explicit `rules list` both map to
    /// `RulesAction::List`.
    pub fn into_action(self) -> RulesAction {
        match self.action {
            None | Some(RulesSubcommand::List) => RulesAction::List,
            Some(RulesSubcommand::Show { name }) => RulesAction::Show { name },
            Some(RulesSubcommand::Emit) => RulesAction::Emit,
            Some(RulesSubcommand::Gen { output }) => RulesAction::Gen { output },
        }
    }
}
