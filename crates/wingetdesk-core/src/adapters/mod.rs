pub mod dispatcher;
pub mod winget;
pub mod winget_process;

pub use dispatcher::{ActionDispatcher, DispatchedAction};
pub use winget::{
    Listing, WINGET_COMMAND, WingetAdapter, WingetCommand, WingetSource,
    winget_install_request, winget_install_version_request, winget_list_installed_request,
    winget_list_upgrades_request, winget_search_request, winget_show_versions_request,
    winget_uninstall_request, winget_upgrade_all_request, winget_upgrade_request,
};
pub use winget_process::ProcessWingetSource;
