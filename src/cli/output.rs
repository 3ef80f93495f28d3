//! Terminal output for composed forests
//!
//! Status lines go to stderr so stdout stays machine-readable; `colored`
//! honours NO_COLOR and CLICOLOR_FORCE.

use std::fmt::Display;

use colored::Colorize;

use crate::domain::ForestStats;

pub fn error(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "warning".yellow().bold(), msg);
}

/// Final verdict of `check`
pub fn success(msg: &(impl Display + ?Sized)) {
    eprintln!("{} {}", "ok".green().bold(), msg);
}

/// One stats block: group key as header, counters indented below
pub fn group_stats(group: &str, stats: &ForestStats) {
    println!("{}", group.cyan().bold());
    println!(
        "  roots: {}, nodes: {}, depth: {}, orphans: {}",
        stats.roots, stats.nodes, stats.max_depth, stats.orphans
    );
}

/// Uncolored payload: JSON, rendered trees, TOML
pub fn data(text: &str) {
    println!("{text}");
}
