pub mod adapters;
pub mod catalog;
pub mod config;
pub mod execution;
pub mod models;
pub mod parsing;
pub mod session;

pub use catalog::{CatalogRow, CatalogState};
pub use config::Config;
pub use session::{ActionReport, AppSession, RefreshSummary, VersionChoices};
