//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::domain::{CrossGroupPolicy, MissingOrder};

/// Compose flat parent-pointer records into grouped, ordered, nested forests
#[derive(Parser, Debug)]
#[command(name = "flatree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Explicit config file (TOML)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Parents from another group: promote|reject
    #[arg(long, global = true)]
    pub cross_group: Option<CrossGroupPolicy>,

    /// Siblings without order value: first|last
    #[arg(long, global = true)]
    pub missing_order: Option<MissingOrder>,

    /// Compose groups in parallel
    #[arg(long, global = true)]
    pub parallel: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print composed forests as JSON
    Compose {
        /// JSON records file (default: stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        /// Only these group keys (repeatable)
        #[arg(short, long = "group")]
        groups: Vec<String>,
        /// Use the bounded-depth shortcut; deeper data is an error
        #[arg(long)]
        max_depth: Option<usize>,
        /// Pretty-print JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Show forests as ASCII trees
    Tree {
        /// JSON records file (default: stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        /// Only these group keys (repeatable)
        #[arg(short, long = "group")]
        groups: Vec<String>,
    },

    /// Show per-group statistics
    Stats {
        /// JSON records file (default: stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
    },

    /// Validate records and report promoted orphans
    Check {
        /// JSON records file (default: stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
    },

    /// Show effective settings
    Config,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
