//! Command dispatch: each command loads one record set, composes it and prints the result

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::{render_forest, ApplicationError};
use crate::cli::args::{Cli, Commands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::Settings;
use crate::domain::{select_groups, ForestMap, ForestStats, TreeComposer};
use crate::infrastructure::{source_for, Record};

/// Composed forests as the CLI handles them.
pub type RecordForests = ForestMap<i64, String, Value>;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = effective_settings(cli)?;
    debug!(?settings, "effective settings");

    match &cli.command {
        Some(Commands::Compose {
            input,
            groups,
            max_depth,
            pretty,
        }) => {
            let records = load(input.as_deref())?;
            output::data(&compose_json(&records, &settings, groups, *max_depth, *pretty)?);
            Ok(())
        }
        Some(Commands::Tree { input, groups }) => {
            let records = load(input.as_deref())?;
            output::data(&tree_text(&records, &settings, groups)?);
            Ok(())
        }
        Some(Commands::Stats { input }) => {
            let records = load(input.as_deref())?;
            for (group, stats) in group_stats(&records, &settings)? {
                output::group_stats(&group, &stats);
            }
            Ok(())
        }
        Some(Commands::Check { input }) => {
            let records = load(input.as_deref())?;
            let report = check_records(&records, &settings)?;
            for (group, id) in &report.orphans {
                output::warning(&format!("node {id} in group '{group}' has no parent in its group, promoted to root"));
            }
            output::success(&format!(
                "{} records in {} groups compose cleanly",
                report.records, report.groups
            ));
            Ok(())
        }
        Some(Commands::Config) => {
            output::data(&settings.to_toml()?);
            Ok(())
        }
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage("no command given, see --help".to_string())),
    }
}

/// Layered settings with command-line flags applied last.
pub fn effective_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(policy) = cli.cross_group {
        settings.cross_group = policy;
    }
    if let Some(missing) = cli.missing_order {
        settings.missing_order = missing;
    }
    if cli.parallel {
        settings.parallel = true;
    }
    Ok(settings)
}

fn load(input: Option<&Path>) -> CliResult<Vec<Record>> {
    Ok(source_for(input).load()?)
}

/// Compose `records`, optionally restricted to `groups` and bounded in depth.
#[instrument(level = "debug", skip(records, settings), fields(records = records.len()))]
pub fn compose_records(
    records: &[Record],
    settings: &Settings,
    groups: &[String],
    max_depth: Option<usize>,
) -> CliResult<RecordForests> {
    let composer = TreeComposer::new(settings.compose_options());
    let composed = match (groups.is_empty(), max_depth) {
        (true, None) => composer.compose(records),
        (false, None) => composer.compose_groups(records, groups),
        (true, Some(depth)) => composer.compose_bounded(records, depth),
        (false, Some(depth)) => composer
            .compose_bounded(records, depth)
            .and_then(|all| select_groups(all, groups)),
    };
    Ok(composed.map_err(ApplicationError::from)?)
}

pub fn compose_json(
    records: &[Record],
    settings: &Settings,
    groups: &[String],
    max_depth: Option<usize>,
    pretty: bool,
) -> CliResult<String> {
    let forests = compose_records(records, settings, groups, max_depth)?;
    let json = if pretty {
        serde_json::to_string_pretty(&forests)
    } else {
        serde_json::to_string(&forests)
    };
    Ok(json.map_err(ApplicationError::from)?)
}

pub fn tree_text(records: &[Record], settings: &Settings, groups: &[String]) -> CliResult<String> {
    let forests = compose_records(records, settings, groups, None)?;
    Ok(forests
        .iter()
        .map(|(group, forest)| render_forest(group, forest, &label))
        .join("\n"))
}

pub fn group_stats(records: &[Record], settings: &Settings) -> CliResult<BTreeMap<String, ForestStats>> {
    let reports = TreeComposer::new(settings.compose_options())
        .compose_report(records)
        .map_err(ApplicationError::from)?;
    Ok(reports
        .iter()
        .map(|(group, report)| (group.clone(), ForestStats::from_report(report)))
        .collect())
}

/// Outcome of a successful `check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub records: usize,
    pub groups: usize,
    /// `(group, id)` of every promoted orphan
    pub orphans: Vec<(String, i64)>,
}

pub fn check_records(records: &[Record], settings: &Settings) -> CliResult<CheckReport> {
    let reports = TreeComposer::new(settings.compose_options())
        .compose_report(records)
        .map_err(ApplicationError::from)?;
    let orphans = reports
        .iter()
        .flat_map(|(group, report)| report.orphans.iter().map(move |id| (group.clone(), *id)))
        .collect();
    Ok(CheckReport {
        records: records.len(),
        groups: reports.len(),
        orphans,
    })
}

/// Tree label: id, a display name from the payload if there is one, and the order value.
pub fn label(node: &Record) -> String {
    let name = ["name", "title", "label"]
        .iter()
        .find_map(|key| node.payload.get(key).and_then(Value::as_str))
        .or_else(|| node.payload.as_str());
    match (name, node.order) {
        (Some(name), Some(order)) => format!("{} {} [{}]", node.id, name, order),
        (Some(name), None) => format!("{} {}", node.id, name),
        (None, Some(order)) => format!("{} [{}]", node.id, order),
        (None, None) => node.id.to_string(),
    }
}
