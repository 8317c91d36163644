use std::sync::Arc;

use crate::adapters::winget::{
    WingetCommand, WingetSource, winget_list_installed_request, winget_list_upgrades_request,
    winget_search_request, winget_show_versions_request,
};
use crate::execution::{CommandOutcome, CommandRunner};

pub struct ProcessWingetSource {
    runner: Arc<CommandRunner>,
    command: WingetCommand,
}

impl ProcessWingetSource {
    pub fn new(runner: Arc<CommandRunner>, command: WingetCommand) -> Self {
        Self { runner, command }
    }
}

impl WingetSource for ProcessWingetSource {
    fn list_upgrades(&self) -> CommandOutcome {
        let request = self.command.configure(winget_list_upgrades_request());
        self.runner.run(request)
    }

    fn list_installed(&self) -> CommandOutcome {
        let request = self.command.configure(winget_list_installed_request());
        self.runner.run(request)
    }

    fn search(&self, term: &str) -> CommandOutcome {
        let request = self.command.configure(winget_search_request(term));
        self.runner.run(request)
    }

    fn show_versions(&self, id: &str) -> CommandOutcome {
        let request = self.command.configure(winget_show_versions_request(id));
        self.runner.run(request)
    }
}
