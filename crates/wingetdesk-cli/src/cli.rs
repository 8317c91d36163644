use std::hash::Hash;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wingetdesk_core::adapters::DispatchedAction;
use wingetdesk_core::models::{Column, CoreError, CoreResult, PackageAction};
use wingetdesk_core::{AppSession, CatalogRow, CatalogState, Config};

#[derive(Parser)]
#[clap(name = "wingetdesk")]
#[clap(about = "List, search, install, update and uninstall winget packages")]
pub struct Cli {
    /// JSON config file
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Log filter, e.g. `debug` or `wingetdesk_core=trace`
    #[clap(long)]
    pub log_level: Option<String>,
    /// Do not pass --force to winget
    #[clap(long)]
    pub no_force: bool,
    /// Do not pass --accept-package-agreements to winget
    #[clap(long)]
    pub no_accept_agreements: bool,
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show packages with available updates
    List {
        /// Show every installed package instead
        #[clap(long)]
        all: bool,
        /// Only rows containing this text
        #[clap(long)]
        filter: Option<String>,
        /// Column to sort by
        #[clap(long)]
        sort: Option<String>,
        /// Sort descending
        #[clap(long, requires = "sort")]
        desc: bool,
    },
    /// Search the winget catalog
    Search {
        /// Search query
        term: String,
    },
    /// Show the versions available for a package
    Versions {
        /// Package identifier
        id: String,
    },
    /// Install a package
    Install {
        /// Package identifier
        id: String,
        /// Install this version instead of the latest
        #[clap(long)]
        version: Option<String>,
    },
    /// Upgrade one package or all of them
    Upgrade {
        /// Package identifier
        id: Option<String>,
        /// Upgrade every package with an update
        #[clap(long, conflicts_with = "id")]
        all: bool,
    },
    /// Uninstall a package
    Uninstall {
        /// Package identifier
        id: String,
    },
}

impl Cli {
    /// Loads the config file (or defaults) and applies command-line overrides.
    pub fn config(&self) -> CoreResult<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config.force &= !self.no_force;
        config.accept_agreements &= !self.no_accept_agreements;
        Ok(config)
    }

    pub fn run(&self, session: &mut AppSession) -> CoreResult<()> {
        match &self.command {
            Commands::List {
                all,
                filter,
                sort,
                desc,
            } => {
                let summary = session.refresh(*all);
                if let Some(filter) = filter {
                    session.search(filter);
                }
                if let Some(sort) = sort {
                    session.sort_by(sort.parse::<Column>()?, *desc)?;
                }
                print!("{}", render_table(session.catalog()));
                if let Some(count) = summary.updates_count {
                    println!("Available Updates: {count}");
                }
            }
            Commands::Search { term } => {
                session.search_packages(term)?;
                print!("{}", render_table(session.search_results()));
            }
            Commands::Versions { id } => {
                let choices = session.show_versions(id)?;
                if choices.versions.is_empty() {
                    println!("No available versions found for {id}");
                }
                for version in &choices.versions {
                    println!("{version}");
                }
            }
            Commands::Install { id, version } => {
                let dispatched = match version {
                    Some(version) => session.install_specific_version(id, version)?,
                    None => session.install_from_search(id)?,
                };
                report(&dispatched);
            }
            Commands::Upgrade { id, all } => {
                let dispatched = match (id, all) {
                    (_, true) => session.update_all(),
                    (Some(id), false) => session.update(id)?,
                    (None, false) => {
                        return Err(CoreError::validation(
                            PackageAction::Upgrade,
                            "pass a package id or --all",
                        ));
                    }
                };
                report(&dispatched);
            }
            Commands::Uninstall { id } => {
                let dispatched = session.uninstall(id)?;
                report(&dispatched);
            }
        }

        let log = session.log_text();
        if !log.is_empty() {
            println!();
            print!("{log}");
        }
        Ok(())
    }
}

fn report(dispatched: &DispatchedAction) {
    if !dispatched.outcome.success() {
        eprintln!(
            "{} exited with code {}",
            dispatched.outcome.command_line, dispatched.outcome.exit_code
        );
    }
}

/// Left-aligned text table of the visible rows, columns padded to their
/// widest cell.
pub fn render_table<R>(catalog: &CatalogState<R>) -> String
where
    R: CatalogRow + Clone + Eq + Hash,
{
    let columns = catalog.columns();
    let rows: Vec<Vec<&str>> = catalog
        .visible()
        .map(|row| {
            columns
                .iter()
                .map(|&column| row.value(column).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            rows.iter()
                .map(|row| row[index].chars().count())
                .chain(std::iter::once(column.label().chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut out = String::new();
    let header: Vec<&str> = columns.iter().map(|column| column.label()).collect();
    push_line(&mut out, &header, &widths);
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    out.push('\n');
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[&str], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
