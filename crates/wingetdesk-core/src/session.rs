use std::sync::Arc;

use serde::Serialize;

use crate::adapters::{
    ActionDispatcher, DispatchedAction, Listing, ProcessWingetSource, WingetAdapter,
};
use crate::catalog::CatalogState;
use crate::config::Config;
use crate::execution::{CommandLog, CommandRunner, ProcessExecutor, TokioProcessExecutor};
use crate::models::{
    ActionFlags, Column, CommandLogEntry, CoreError, CoreErrorKind, CoreResult, PackageAction,
    PackageRecord, RowAction, SEARCH_COLUMNS, SearchResultRecord, SortDirection, ViewMode,
};

/// What a refresh produced, for the status line above the table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub view_mode: ViewMode,
    pub exit_code: i32,
    pub rows: usize,
    pub skipped_lines: usize,
    pub duplicates_dropped: usize,
    /// Present for the updates view only.
    pub updates_count: Option<usize>,
}

/// Versions offered for one package.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct VersionChoices {
    pub id: String,
    pub versions: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionReport {
    Dispatched(DispatchedAction),
    Versions(VersionChoices),
}

/// Everything one front end window needs: both tables, the command log and
/// the action flags.
///
/// Every external command the session runs is recorded in the log before
/// the call returns. Calls that run winget block the calling thread, so they
/// belong on a plain thread; from async code they come back with exit code
/// -1 without running anything.
pub struct AppSession {
    runner: Arc<CommandRunner>,
    winget: WingetAdapter<ProcessWingetSource>,
    dispatcher: ActionDispatcher,
    catalog: CatalogState<PackageRecord>,
    search_results: CatalogState<SearchResultRecord>,
    view_mode: ViewMode,
    log: CommandLog,
    log_visible: bool,
}

impl AppSession {
    pub fn new(config: &Config) -> CoreResult<Self> {
        Self::with_executor(config, Arc::new(TokioProcessExecutor))
    }

    pub fn with_executor(config: &Config, executor: Arc<dyn ProcessExecutor>) -> CoreResult<Self> {
        config.validate()?;

        let runner = Arc::new(CommandRunner::new(executor)?);
        let command = config.winget_command();
        let winget = WingetAdapter::new(ProcessWingetSource::new(runner.clone(), command.clone()))
            .with_rules(config.listing_rules(), config.version_summary_prefixes.clone());
        let dispatcher = ActionDispatcher::new(runner.clone(), command, config.flags());
        let view_mode = ViewMode::default();

        Ok(Self {
            runner,
            winget,
            dispatcher,
            catalog: CatalogState::new(view_mode.columns()),
            search_results: CatalogState::new(SEARCH_COLUMNS),
            view_mode,
            log: CommandLog::with_capacity(config.log_capacity),
            log_visible: true,
        })
    }

    /// Reloads the main table from `winget upgrade`, or from `winget list`
    /// when `show_all` is set. The filter is kept; sort order is not.
    pub fn refresh(&mut self, show_all: bool) -> RefreshSummary {
        let view_mode = ViewMode::from_show_all(show_all);
        let (description, listing) = match view_mode {
            ViewMode::Updates => ("Checking for available updates...", self.winget.list_upgrades()),
            ViewMode::AllInstalled => ("Listing installed packages...", self.winget.list_installed()),
        };
        let Listing {
            outcome,
            records,
            skipped_lines,
        } = listing;
        self.log.record(description, &outcome);

        let filter = self.catalog.filter().to_string();
        self.view_mode = view_mode;
        self.catalog = CatalogState::new(view_mode.columns());
        self.catalog.set_filter(&filter);
        let duplicates_dropped = self.catalog.load(records);

        let summary = RefreshSummary {
            view_mode,
            exit_code: outcome.exit_code,
            rows: self.catalog.len(),
            skipped_lines,
            duplicates_dropped,
            updates_count: self.updates_count(),
        };
        tracing::info!(
            ?view_mode,
            rows = summary.rows,
            skipped = skipped_lines,
            "refreshed package table"
        );
        summary
    }

    /// Filters the main table.
    pub fn search(&mut self, term: &str) {
        self.catalog.set_filter(term);
    }

    pub fn sort_clicked(&mut self, column: Column) -> CoreResult<SortDirection> {
        ensure_column(self.catalog.columns(), column)?;
        Ok(self.catalog.sort_clicked(column))
    }

    pub fn sort_by(&mut self, column: Column, descending: bool) -> CoreResult<()> {
        ensure_column(self.catalog.columns(), column)?;
        self.catalog.sort_by(column, descending);
        Ok(())
    }

    pub fn catalog(&self) -> &CatalogState<PackageRecord> {
        &self.catalog
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn updates_count(&self) -> Option<usize> {
        match self.view_mode {
            ViewMode::Updates => Some(self.catalog.len()),
            ViewMode::AllInstalled => None,
        }
    }

    /// Context menu entries for a row of the main table. Empty when `id` is
    /// not in the table.
    pub fn right_click_actions(&self, id: &str) -> Vec<RowAction> {
        if self.catalog.find(id).is_none() {
            return Vec::new();
        }
        vec![RowAction::Update, RowAction::Uninstall, RowAction::ShowVersions]
    }

    pub fn perform(&mut self, action: RowAction, id: &str) -> CoreResult<ActionReport> {
        match action {
            RowAction::Update => self.update(id).map(ActionReport::Dispatched),
            RowAction::Uninstall => self.uninstall(id).map(ActionReport::Dispatched),
            RowAction::Install => self.install_from_search(id).map(ActionReport::Dispatched),
            RowAction::ShowVersions => self.show_versions(id).map(ActionReport::Versions),
        }
    }

    pub fn update(&mut self, id: &str) -> CoreResult<DispatchedAction> {
        let result = self.dispatcher.update(id);
        self.record(result)
    }

    pub fn uninstall(&mut self, id: &str) -> CoreResult<DispatchedAction> {
        let result = self.dispatcher.uninstall(id);
        self.record(result)
    }

    pub fn update_all(&mut self) -> DispatchedAction {
        let dispatched = self.dispatcher.update_all();
        self.log.record(&dispatched.description, &dispatched.outcome);
        dispatched
    }

    /// Runs `winget search` and loads the install window's table.
    pub fn search_packages(&mut self, term: &str) -> CoreResult<usize> {
        let term = term.trim();
        if term.is_empty() {
            return Err(CoreError::validation(
                PackageAction::Search,
                "search term must not be empty",
            ));
        }

        let listing = self.winget.search(term);
        self.log.record(&format!("Searching for {term}..."), &listing.outcome);
        if !listing.outcome.success() {
            return Err(CoreError::new(
                CoreErrorKind::NonZeroExit,
                "Failed to search for packages",
            )
            .with_action(PackageAction::Search));
        }

        self.search_results.load(listing.records);
        Ok(self.search_results.len())
    }

    pub fn search_results(&self) -> &CatalogState<SearchResultRecord> {
        &self.search_results
    }

    pub fn sort_search_results(&mut self, column: Column) -> CoreResult<SortDirection> {
        ensure_column(self.search_results.columns(), column)?;
        Ok(self.search_results.sort_clicked(column))
    }

    pub fn filter_search_results(&mut self, term: &str) {
        self.search_results.set_filter(term);
    }

    pub fn install_from_search(&mut self, id: &str) -> CoreResult<DispatchedAction> {
        let result = self.dispatcher.install_latest(id);
        self.record(result)
    }

    pub fn show_versions(&mut self, id: &str) -> CoreResult<VersionChoices> {
        let id = id.trim();
        if id.is_empty() {
            return Err(CoreError::validation(
                PackageAction::ShowVersions,
                "package id must not be empty",
            ));
        }

        let (outcome, versions) = self.winget.show_versions(id);
        self.log.record(&format!("Retrieving versions of {id}..."), &outcome);
        if versions.is_empty() {
            tracing::info!(id, "no available versions found");
        }
        Ok(VersionChoices {
            id: id.to_string(),
            versions,
        })
    }

    pub fn install_specific_version(
        &mut self,
        id: &str,
        version: &str,
    ) -> CoreResult<DispatchedAction> {
        let result = self.dispatcher.install_version(id, version);
        self.record(result)
    }

    pub fn flags(&self) -> ActionFlags {
        self.dispatcher.flags()
    }

    pub fn set_flags(&mut self, flags: ActionFlags) {
        tracing::debug!(force = flags.force, accept = flags.accept_agreements, "flags changed");
        self.dispatcher.set_flags(flags);
    }

    /// Flips log visibility and returns the new state.
    pub fn toggle_log_visible(&mut self) -> bool {
        self.log_visible = !self.log_visible;
        self.log_visible
    }

    pub fn log_visible(&self) -> bool {
        self.log_visible
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    pub fn log_entries(&self) -> Vec<CommandLogEntry> {
        self.log.entries().cloned().collect()
    }

    pub fn log_text(&self) -> String {
        self.log.render()
    }

    pub fn is_busy(&self) -> bool {
        self.runner.is_busy()
    }

    fn record(&mut self, result: CoreResult<DispatchedAction>) -> CoreResult<DispatchedAction> {
        let dispatched = result?;
        self.log.record(&dispatched.description, &dispatched.outcome);
        Ok(dispatched)
    }
}

fn ensure_column(columns: &[Column], column: Column) -> CoreResult<()> {
    if columns.contains(&column) {
        return Ok(());
    }
    Err(CoreError::new(
        CoreErrorKind::ValidationFailure,
        format!("column '{}' is not shown in this table", column.label()),
    ))
}
