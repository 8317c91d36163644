use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{CoreError, CoreErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageAction {
    ListUpgrades,
    ListInstalled,
    Search,
    ShowVersions,
    Install,
    InstallVersion,
    Upgrade,
    UpgradeAll,
    Uninstall,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ActionSafety {
    ReadOnly,
    Mutating,
}

impl PackageAction {
    pub fn safety(self) -> ActionSafety {
        match self {
            Self::ListUpgrades | Self::ListInstalled | Self::Search | Self::ShowVersions => {
                ActionSafety::ReadOnly
            }
            Self::Install
            | Self::InstallVersion
            | Self::Upgrade
            | Self::UpgradeAll
            | Self::Uninstall => ActionSafety::Mutating,
        }
    }
}

/// User-chosen toggles applied to mutating commands.
///
/// Read by the dispatcher at invocation time, so a change takes effect on the
/// next command without any restart.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActionFlags {
    pub force: bool,
    pub accept_agreements: bool,
}

impl Default for ActionFlags {
    fn default() -> Self {
        Self {
            force: true,
            accept_agreements: true,
        }
    }
}

/// Entries of a row's context menu.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Update,
    Uninstall,
    ShowVersions,
    Install,
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Update => "Update",
            Self::Uninstall => "Uninstall",
            Self::ShowVersions => "Show Available Versions",
            Self::Install => "Install",
        }
    }
}

impl FromStr for RowAction {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "update" | "upgrade" => Ok(Self::Update),
            "uninstall" => Ok(Self::Uninstall),
            "show_versions" | "versions" => Ok(Self::ShowVersions),
            "install" => Ok(Self::Install),
            other => Err(CoreError::new(
                CoreErrorKind::ValidationFailure,
                format!("unknown row action '{other}'"),
            )),
        }
    }
}
