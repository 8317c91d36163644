use std::path::PathBuf;
use std::time::Duration;

use crate::execution::{CommandOutcome, CommandSpec, ProcessSpawnRequest};
use crate::models::{ActionFlags, PackageAction, PackageRecord, SearchResultRecord};
use crate::parsing::{
    DEFAULT_SUMMARY_PREFIXES, INSTALLED_LISTING, ListingRules, ParsedListing, SEARCH_LISTING,
    TableShape, UPGRADE_LISTING, parse_table, parse_versions_with,
};

pub const WINGET_COMMAND: &str = "winget";

const FORCE_FLAG: &str = "--force";
const ACCEPT_AGREEMENTS_FLAG: &str = "--accept-package-agreements";

/// The read-only winget listings.
///
/// Implementations never fail: whatever happened is in the outcome.
pub trait WingetSource: Send + Sync {
    fn list_upgrades(&self) -> CommandOutcome;
    fn list_installed(&self) -> CommandOutcome;
    fn search(&self, term: &str) -> CommandOutcome;
    fn show_versions(&self, id: &str) -> CommandOutcome;
}

/// Program path and timeout applied to every winget request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WingetCommand {
    pub program: PathBuf,
    pub timeout: Option<Duration>,
}

impl Default for WingetCommand {
    fn default() -> Self {
        Self {
            program: PathBuf::from(WINGET_COMMAND),
            timeout: None,
        }
    }
}

impl WingetCommand {
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn configure(&self, mut request: ProcessSpawnRequest) -> ProcessSpawnRequest {
        request.command.program = self.program.clone();
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        request
    }
}

/// Records parsed from one listing together with the invocation that
/// produced them.
#[derive(Clone, Debug)]
pub struct Listing<R> {
    pub outcome: CommandOutcome,
    pub records: Vec<R>,
    pub skipped_lines: usize,
}

/// Runs winget listings through a [`WingetSource`] and parses what comes back.
pub struct WingetAdapter<S: WingetSource> {
    source: S,
    rules: ListingRules,
    summary_prefixes: Vec<String>,
}

impl<S: WingetSource> WingetAdapter<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            rules: ListingRules::default(),
            summary_prefixes: DEFAULT_SUMMARY_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn with_rules(mut self, rules: ListingRules, summary_prefixes: Vec<String>) -> Self {
        self.rules = rules;
        self.summary_prefixes = summary_prefixes;
        self
    }

    pub fn list_upgrades(&self) -> Listing<PackageRecord> {
        let outcome = self.source.list_upgrades();
        self.parse_listing(outcome, UPGRADE_LISTING, PackageRecord::from_upgrade_fields)
    }

    pub fn list_installed(&self) -> Listing<PackageRecord> {
        let outcome = self.source.list_installed();
        self.parse_listing(
            outcome,
            INSTALLED_LISTING,
            PackageRecord::from_installed_fields,
        )
    }

    pub fn search(&self, term: &str) -> Listing<SearchResultRecord> {
        let outcome = self.source.search(term);
        self.parse_listing(outcome, SEARCH_LISTING, SearchResultRecord::from_fields)
    }

    /// Available versions newest first, plus the invocation. A failed
    /// command yields no versions.
    pub fn show_versions(&self, id: &str) -> (CommandOutcome, Vec<String>) {
        let outcome = self.source.show_versions(id);
        let versions = if outcome.success() {
            parse_versions_with(&outcome.raw_stdout, &self.summary_prefixes)
        } else {
            Vec::new()
        };
        (outcome, versions)
    }

    fn parse_listing<R>(
        &self,
        outcome: CommandOutcome,
        shape: TableShape,
        into_record: fn(Vec<String>) -> Option<R>,
    ) -> Listing<R> {
        if !outcome.success() {
            tracing::warn!(
                command = %outcome.command_line,
                exit_code = outcome.exit_code,
                "listing command failed; treating as empty"
            );
            return Listing {
                outcome,
                records: Vec::new(),
                skipped_lines: 0,
            };
        }

        let ParsedListing {
            rows,
            skipped_lines,
        } = parse_table(&outcome.raw_stdout, shape, &self.rules);
        let records = rows.into_iter().filter_map(into_record).collect();

        Listing {
            outcome,
            records,
            skipped_lines,
        }
    }
}

pub fn winget_list_upgrades_request() -> ProcessSpawnRequest {
    winget_request(PackageAction::ListUpgrades, ["upgrade"])
}

pub fn winget_list_installed_request() -> ProcessSpawnRequest {
    winget_request(PackageAction::ListInstalled, ["list"])
}

pub fn winget_search_request(term: &str) -> ProcessSpawnRequest {
    winget_request(PackageAction::Search, ["search", term])
}

pub fn winget_show_versions_request(id: &str) -> ProcessSpawnRequest {
    winget_request(
        PackageAction::ShowVersions,
        ["show", "--id", id, "--versions"],
    )
}

pub fn winget_uninstall_request(id: &str, flags: ActionFlags) -> ProcessSpawnRequest {
    let mut request = winget_request(PackageAction::Uninstall, ["uninstall", "--id", id]);
    if flags.force {
        request.command = request.command.arg(FORCE_FLAG);
    }
    request
}

pub fn winget_upgrade_request(id: &str, flags: ActionFlags) -> ProcessSpawnRequest {
    let request = winget_request(PackageAction::Upgrade, ["upgrade", "--id", id]);
    with_upgrade_flags(request, flags)
}

pub fn winget_upgrade_all_request(flags: ActionFlags) -> ProcessSpawnRequest {
    let request = winget_request(PackageAction::UpgradeAll, ["upgrade", "--all"]);
    with_upgrade_flags(request, flags)
}

pub fn winget_install_version_request(
    id: &str,
    version: &str,
    flags: ActionFlags,
) -> ProcessSpawnRequest {
    let request = winget_request(
        PackageAction::InstallVersion,
        ["install", "--id", id, "--version", version],
    );
    with_accept_agreements(request, flags)
}

/// `install <id>` without `--id`, which lets winget resolve the argument as
/// a query the way the search window expects.
pub fn winget_install_request(id: &str, flags: ActionFlags) -> ProcessSpawnRequest {
    let request = winget_request(PackageAction::Install, ["install", id]);
    with_accept_agreements(request, flags)
}

fn with_upgrade_flags(mut request: ProcessSpawnRequest, flags: ActionFlags) -> ProcessSpawnRequest {
    if flags.force {
        request.command = request.command.arg(FORCE_FLAG);
    }
    with_accept_agreements(request, flags)
}

fn with_accept_agreements(
    mut request: ProcessSpawnRequest,
    flags: ActionFlags,
) -> ProcessSpawnRequest {
    if flags.accept_agreements {
        request.command = request.command.arg(ACCEPT_AGREEMENTS_FLAG);
    }
    request
}

fn winget_request<'a>(
    action: PackageAction,
    args: impl IntoIterator<Item = &'a str>,
) -> ProcessSpawnRequest {
    ProcessSpawnRequest::new(action, CommandSpec::new(WINGET_COMMAND).args(args))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{
        WingetAdapter, WingetCommand, WingetSource, winget_install_request,
        winget_install_version_request, winget_list_upgrades_request, winget_show_versions_request,
        winget_uninstall_request, winget_upgrade_all_request, winget_upgrade_request,
    };
    use crate::execution::CommandOutcome;
    use crate::models::{ActionFlags, PackageAction};

    const UPGRADE_FIXTURE: &str = include_str!("../../tests/fixtures/winget/upgrade.txt");
    const LIST_FIXTURE: &str = include_str!("../../tests/fixtures/winget/list.txt");
    const VERSIONS_FIXTURE: &str = include_str!("../../tests/fixtures/winget/show_versions.txt");

    struct FixtureSource {
        exit_code: i32,
    }

    fn outcome(command_line: &str, exit_code: i32, stdout: &str) -> CommandOutcome {
        CommandOutcome {
            command_line: command_line.to_string(),
            exit_code,
            stdout: stdout.to_string(),
            stderr: String::new(),
            raw_stdout: stdout.to_string(),
        }
    }

    impl WingetSource for FixtureSource {
        fn list_upgrades(&self) -> CommandOutcome {
            outcome("winget upgrade", self.exit_code, UPGRADE_FIXTURE)
        }

        fn list_installed(&self) -> CommandOutcome {
            outcome("winget list", self.exit_code, LIST_FIXTURE)
        }

        fn search(&self, term: &str) -> CommandOutcome {
            outcome(&format!("winget search {term}"), self.exit_code, "")
        }

        fn show_versions(&self, id: &str) -> CommandOutcome {
            outcome(
                &format!("winget show --id {id} --versions"),
                self.exit_code,
                VERSIONS_FIXTURE,
            )
        }
    }

    fn no_flags() -> ActionFlags {
        ActionFlags {
            force: false,
            accept_agreements: false,
        }
    }

    #[test]
    fn builds_listing_requests() {
        assert_eq!(winget_list_upgrades_request().command.args, vec!["upgrade"]);
        let request = winget_show_versions_request("Git.Git");
        assert_eq!(request.action, PackageAction::ShowVersions);
        assert_eq!(
            request.command.command_line(),
            "winget show --id Git.Git --versions"
        );
    }

    #[test]
    fn mutating_requests_honor_flags() {
        let all = ActionFlags::default();
        assert_eq!(
            winget_uninstall_request("Git.Git", all).command.command_line(),
            "winget uninstall --id Git.Git --force"
        );
        assert_eq!(
            winget_uninstall_request("Git.Git", no_flags()).command.command_line(),
            "winget uninstall --id Git.Git"
        );
        assert_eq!(
            winget_upgrade_request("Git.Git", all).command.command_line(),
            "winget upgrade --id Git.Git --force --accept-package-agreements"
        );
        assert_eq!(
            winget_upgrade_all_request(ActionFlags {
                force: false,
                accept_agreements: true,
            })
            .command
            .command_line(),
            "winget upgrade --all --accept-package-agreements"
        );
        assert_eq!(
            winget_install_version_request("Git.Git", "2.45.1", all)
                .command
                .command_line(),
            "winget install --id Git.Git --version 2.45.1 --accept-package-agreements"
        );
        assert_eq!(
            winget_install_request("Git.Git", no_flags()).command.command_line(),
            "winget install Git.Git"
        );
    }

    #[test]
    fn configured_command_replaces_program_and_sets_timeout() {
        let command = WingetCommand::new(r"C:\tools\winget.exe", Some(Duration::from_secs(30)));
        let request = command.configure(winget_list_upgrades_request());
        assert_eq!(request.command.program.to_string_lossy(), r"C:\tools\winget.exe");
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn parses_upgrade_fixture_into_records() {
        let adapter = WingetAdapter::new(FixtureSource { exit_code: 0 });
        let listing = adapter.list_upgrades();
        let ids: Vec<&str> = listing.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["Git.Git", "Microsoft.PowerToys", "Mozilla.Firefox"]
        );
        assert_eq!(
            listing.records[0].available_version.as_deref(),
            Some("2.46.0")
        );
        assert_eq!(listing.skipped_lines, 1);
    }

    #[test]
    fn parses_installed_fixture_with_spaced_names() {
        let adapter = WingetAdapter::new(FixtureSource { exit_code: 0 });
        let listing = adapter.list_installed();
        let vscode = listing
            .records
            .iter()
            .find(|r| r.id == "Microsoft.VisualStudioCode")
            .unwrap();
        assert_eq!(vscode.name, "Visual Studio Code");
        assert_eq!(vscode.available_version, None);
    }

    #[test]
    fn failed_listing_is_empty() {
        let adapter = WingetAdapter::new(FixtureSource { exit_code: 1 });
        let listing = adapter.list_upgrades();
        assert!(listing.records.is_empty());
        assert_eq!(listing.outcome.exit_code, 1);

        let (_, versions) = adapter.show_versions("Git.Git");
        assert!(versions.is_empty());
    }

    #[test]
    fn parses_version_fixture() {
        let adapter = WingetAdapter::new(FixtureSource { exit_code: 0 });
        let (outcome, versions) = adapter.show_versions("Git.Git");
        assert_eq!(outcome.command_line, "winget show --id Git.Git --versions");
        assert_eq!(versions, vec!["2.46.0", "2.45.2", "2.45.1", "2.44.0"]);
    }
}
