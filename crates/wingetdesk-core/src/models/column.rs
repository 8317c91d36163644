use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{CoreError, CoreErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Name,
    Id,
    Version,
    AvailableVersion,
    Match,
    Source,
}

pub const UPDATE_COLUMNS: &[Column] = &[
    Column::Name,
    Column::Id,
    Column::Version,
    Column::AvailableVersion,
    Column::Source,
];

pub const INSTALLED_COLUMNS: &[Column] =
    &[Column::Name, Column::Id, Column::Version, Column::Source];

pub const SEARCH_COLUMNS: &[Column] = &[
    Column::Name,
    Column::Id,
    Column::Version,
    Column::Match,
    Column::Source,
];

impl Column {
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Id => "ID",
            Self::Version => "Version",
            Self::AvailableVersion => "Available Version",
            Self::Match => "Match",
            Self::Source => "Source",
        }
    }
}

impl FromStr for Column {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "name" => Ok(Self::Name),
            "id" => Ok(Self::Id),
            "version" => Ok(Self::Version),
            "available" | "availableversion" => Ok(Self::AvailableVersion),
            "match" => Ok(Self::Match),
            "source" => Ok(Self::Source),
            _ => Err(CoreError::new(
                CoreErrorKind::ValidationFailure,
                format!("unknown column '{value}'"),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn is_descending(self) -> bool {
        self == Self::Descending
    }
}

/// Which listing backs the main table.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Updates,
    AllInstalled,
}

impl ViewMode {
    pub fn from_show_all(show_all: bool) -> Self {
        if show_all {
            Self::AllInstalled
        } else {
            Self::Updates
        }
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            Self::Updates => UPDATE_COLUMNS,
            Self::AllInstalled => INSTALLED_COLUMNS,
        }
    }
}
