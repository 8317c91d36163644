use std::sync::Arc;

use serde::Serialize;

use crate::adapters::winget::{
    WingetCommand, winget_install_request, winget_install_version_request,
    winget_uninstall_request, winget_upgrade_all_request, winget_upgrade_request,
};
use crate::execution::{CommandOutcome, CommandRunner, ProcessSpawnRequest};
use crate::models::{ActionFlags, ActionSafety, CoreError, CoreResult, PackageAction};

/// A mutating command that was run, with the line shown above it in the log.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DispatchedAction {
    pub action: PackageAction,
    pub description: String,
    pub outcome: CommandOutcome,
}

/// Issues install, upgrade and uninstall commands.
///
/// A request that fails validation is returned as an error and never spawns
/// a process. Once spawned, the command's exit code is reported in the
/// outcome rather than as an error.
pub struct ActionDispatcher {
    runner: Arc<CommandRunner>,
    command: WingetCommand,
    flags: ActionFlags,
}

impl ActionDispatcher {
    pub fn new(runner: Arc<CommandRunner>, command: WingetCommand, flags: ActionFlags) -> Self {
        Self {
            runner,
            command,
            flags,
        }
    }

    pub fn flags(&self) -> ActionFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: ActionFlags) {
        self.flags = flags;
    }

    pub fn uninstall(&self, id: &str) -> CoreResult<DispatchedAction> {
        let id = require_id(PackageAction::Uninstall, id)?;
        Ok(self.dispatch(
            format!("Uninstalling {id}..."),
            winget_uninstall_request(id, self.flags),
        ))
    }

    pub fn update(&self, id: &str) -> CoreResult<DispatchedAction> {
        let id = require_id(PackageAction::Upgrade, id)?;
        Ok(self.dispatch(
            format!("Updating {id}..."),
            winget_upgrade_request(id, self.flags),
        ))
    }

    pub fn update_all(&self) -> DispatchedAction {
        self.dispatch(
            "Updating all packages...".to_string(),
            winget_upgrade_all_request(self.flags),
        )
    }

    pub fn install_version(&self, id: &str, version: &str) -> CoreResult<DispatchedAction> {
        let id = require_id(PackageAction::InstallVersion, id)?;
        let version = version.trim();
        if version.is_empty() {
            return Err(CoreError::validation(
                PackageAction::InstallVersion,
                format!("no version selected for {id}"),
            ));
        }

        Ok(self.dispatch(
            format!("Installing {id} Version {version}..."),
            winget_install_version_request(id, version, self.flags),
        ))
    }

    pub fn install_latest(&self, id: &str) -> CoreResult<DispatchedAction> {
        let id = require_id(PackageAction::Install, id)?;
        Ok(self.dispatch(
            format!("Installing {id}..."),
            winget_install_request(id, self.flags),
        ))
    }

    fn dispatch(&self, description: String, request: ProcessSpawnRequest) -> DispatchedAction {
        let action = request.action;
        debug_assert_eq!(action.safety(), ActionSafety::Mutating);
        tracing::info!(?action, "{description}");
        let outcome = self.runner.run(self.command.configure(request));
        DispatchedAction {
            action,
            description,
            outcome,
        }
    }
}

fn require_id(action: PackageAction, id: &str) -> CoreResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(CoreError::validation(action, "package id must not be empty"));
    }
    Ok(id)
}
