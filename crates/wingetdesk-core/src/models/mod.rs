pub mod action;
pub mod column;
pub mod command_log;
pub mod error;
pub mod package;

pub use action::{ActionFlags, ActionSafety, PackageAction, RowAction};
pub use column::{
    Column, INSTALLED_COLUMNS, SEARCH_COLUMNS, SortDirection, UPDATE_COLUMNS, ViewMode,
};
pub use command_log::CommandLogEntry;
pub use error::{CoreError, CoreErrorKind, CoreResult};
pub use package::{PackageRecord, SearchResultRecord};
