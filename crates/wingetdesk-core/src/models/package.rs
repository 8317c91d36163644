use serde::{Deserialize, Serialize};

/// One row of an upgrade or installed-package listing.
///
/// `id` is what every follow-up action targets; `name` and `source` are only
/// shown to the user. `available_version` is present only in upgrade listings.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub id: String,
    pub installed_version: String,
    pub available_version: Option<String>,
    pub source: String,
}

impl PackageRecord {
    /// Builds a record from the five upgrade-listing fields:
    /// name, id, installed version, available version, source.
    pub fn from_upgrade_fields(fields: Vec<String>) -> Option<Self> {
        let [name, id, installed_version, available_version, source]: [String; 5] =
            fields.try_into().ok()?;
        Some(Self {
            name,
            id,
            installed_version,
            available_version: Some(available_version),
            source,
        })
    }

    /// Builds a record from the four full-listing fields: name, id, version, source.
    pub fn from_installed_fields(fields: Vec<String>) -> Option<Self> {
        let [name, id, installed_version, source]: [String; 4] = fields.try_into().ok()?;
        Some(Self {
            name,
            id,
            installed_version,
            available_version: None,
            source,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SearchResultRecord {
    pub name: String,
    pub id: String,
    pub version: String,
    pub match_info: String,
    pub source: String,
}

impl SearchResultRecord {
    pub fn from_fields(fields: Vec<String>) -> Option<Self> {
        let [name, id, version, match_info, source]: [String; 5] = fields.try_into().ok()?;
        Some(Self {
            name,
            id,
            version,
            match_info,
            source,
        })
    }
}
