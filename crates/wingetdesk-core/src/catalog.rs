use std::collections::HashSet;
use std::hash::Hash;

use crate::models::{Column, PackageRecord, SearchResultRecord, SortDirection};

/// A record that can be shown as a table row.
pub trait CatalogRow {
    fn id(&self) -> &str;

    /// Display value for `column`, `None` when the record has no such column.
    fn value(&self, column: Column) -> Option<&str>;

    /// Every field, in the order the filter examines them.
    fn fields(&self) -> Vec<&str>;
}

impl CatalogRow for PackageRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, column: Column) -> Option<&str> {
        match column {
            Column::Name => Some(self.name.as_str()),
            Column::Id => Some(self.id.as_str()),
            Column::Version => Some(self.installed_version.as_str()),
            Column::AvailableVersion => self.available_version.as_deref(),
            Column::Source => Some(self.source.as_str()),
            Column::Match => None,
        }
    }

    fn fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.name.as_str(),
            self.id.as_str(),
            self.installed_version.as_str(),
        ];
        if let Some(available) = &self.available_version {
            fields.push(available);
        }
        fields.push(self.source.as_str());
        fields
    }
}

impl CatalogRow for SearchResultRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, column: Column) -> Option<&str> {
        match column {
            Column::Name => Some(self.name.as_str()),
            Column::Id => Some(self.id.as_str()),
            Column::Version => Some(self.version.as_str()),
            Column::Match => Some(self.match_info.as_str()),
            Column::Source => Some(self.source.as_str()),
            Column::AvailableVersion => None,
        }
    }

    fn fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.id.as_str(),
            self.version.as_str(),
            self.match_info.as_str(),
            self.source.as_str(),
        ]
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ActiveSort {
    pub column: Column,
    pub direction: SortDirection,
}

/// The record set behind one table plus its filter and sort.
///
/// The visible rows are always the filtered view of the authoritative
/// sequence. Sorting reorders the authoritative sequence itself, so clearing
/// the filter afterwards keeps the sort order.
#[derive(Clone, Debug)]
pub struct CatalogState<R> {
    columns: &'static [Column],
    records: Vec<R>,
    visible: Vec<usize>,
    filter: String,
    sort: Option<ActiveSort>,
}

impl<R> CatalogState<R>
where
    R: CatalogRow + Clone + Eq + Hash,
{
    pub fn new(columns: &'static [Column]) -> Self {
        Self {
            columns,
            records: Vec::new(),
            visible: Vec::new(),
            filter: String::new(),
            sort: None,
        }
    }

    /// Replaces the record set, dropping exact duplicates after their first
    /// occurrence. Returns how many were dropped.
    ///
    /// Sort memory is cleared; the filter is kept and re-applied.
    pub fn load(&mut self, records: Vec<R>) -> usize {
        let total = records.len();
        let mut seen = HashSet::with_capacity(total);
        self.records = records
            .into_iter()
            .filter(|record| seen.insert(record.clone()))
            .collect();
        self.sort = None;
        self.apply_filter();

        let dropped = total - self.records.len();
        if dropped > 0 {
            tracing::warn!(dropped, "dropped duplicate catalog rows");
        }
        tracing::info!(
            rows = self.records.len(),
            visible = self.visible.len(),
            "catalog reloaded"
        );
        dropped
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.to_string();
        self.apply_filter();
    }

    /// Orders the record set by the case-insensitive text of `column`.
    ///
    /// Stable for equal keys. Rows without the column sort as empty text.
    pub fn sort_by(&mut self, column: Column, descending: bool) {
        self.records.sort_by(|left, right| {
            let ordering = sort_key(left, column).cmp(&sort_key(right, column));
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        self.sort = Some(ActiveSort {
            column,
            direction: if descending {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            },
        });
        self.apply_filter();
    }

    /// Sorts as a header click would: a repeated click on the active column
    /// flips the direction, any other column starts ascending.
    pub fn sort_clicked(&mut self, column: Column) -> SortDirection {
        let descending = matches!(
            self.sort,
            Some(ActiveSort {
                column: active,
                direction: SortDirection::Ascending,
            }) if active == column
        );
        self.sort_by(column, descending);
        if descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    pub fn visible(&self) -> impl Iterator<Item = &R> {
        self.visible.iter().map(|&index| &self.records[index])
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn columns(&self) -> &'static [Column] {
        self.columns
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn active_sort(&self) -> Option<ActiveSort> {
        self.sort
    }

    pub fn find(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|record| record.id() == id)
    }

    fn apply_filter(&mut self) {
        let needle = self.filter.to_lowercase();
        self.visible = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                needle.is_empty()
                    || record
                        .fields()
                        .iter()
                        .any(|field| field.to_lowercase().contains(&needle))
            })
            .map(|(index, _)| index)
            .collect();
    }
}

fn sort_key<R: CatalogRow>(record: &R, column: Column) -> String {
    record.value(column).unwrap_or_default().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{CatalogRow, CatalogState};
    use crate::models::{Column, PackageRecord, SortDirection, UPDATE_COLUMNS};

    fn record(name: &str, id: &str, source: &str) -> PackageRecord {
        PackageRecord {
            name: name.to_string(),
            id: id.to_string(),
            installed_version: "1.0".to_string(),
            available_version: Some("2.0".to_string()),
            source: source.to_string(),
        }
    }

    fn catalog() -> CatalogState<PackageRecord> {
        let mut catalog = CatalogState::new(UPDATE_COLUMNS);
        catalog.load(vec![
            record("Git", "Git.Git", "winget"),
            record("7-Zip", "7zip.7zip", "winget"),
            record("Spotify", "Spotify.Spotify", "msstore"),
            record("curl", "cURL.cURL", "winget"),
        ]);
        catalog
    }

    fn visible_ids(catalog: &CatalogState<PackageRecord>) -> Vec<String> {
        catalog.visible().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn descending_sort_reverses_ascending_order() {
        let mut catalog = catalog();
        catalog.sort_by(Column::Id, false);
        let ascending = visible_ids(&catalog);
        assert_eq!(
            ascending,
            vec!["7zip.7zip", "cURL.cURL", "Git.Git", "Spotify.Spotify"]
        );

        catalog.sort_by(Column::Id, true);
        let mut descending = visible_ids(&catalog);
        descending.reverse();
        assert_eq!(descending, ascending);
    }

    #[test]
    fn empty_filter_returns_every_record_in_order() {
        let mut catalog = catalog();
        catalog.set_filter("");
        assert_eq!(catalog.visible_len(), catalog.len());
        let all: Vec<String> = catalog.records().iter().map(|r| r.id.clone()).collect();
        assert_eq!(visible_ids(&catalog), all);
    }

    #[test]
    fn source_only_match_yields_one_record() {
        let mut catalog = catalog();
        catalog.set_filter("MSSTORE");
        assert_eq!(visible_ids(&catalog), vec!["Spotify.Spotify"]);
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn filter_survives_reload() {
        let mut catalog = catalog();
        catalog.set_filter("git");
        catalog.load(vec![
            record("Git", "Git.Git", "winget"),
            record("GitHub CLI", "GitHub.cli", "winget"),
            record("Zoom", "Zoom.Zoom", "winget"),
        ]);
        assert_eq!(visible_ids(&catalog), vec!["Git.Git", "GitHub.cli"]);
        assert_eq!(catalog.filter(), "git");
    }

    #[test]
    fn exact_duplicates_collapse_to_first_occurrence() {
        let mut catalog = CatalogState::new(UPDATE_COLUMNS);
        let dropped = catalog.load(vec![
            record("Git", "Git.Git", "winget"),
            record("Zoom", "Zoom.Zoom", "winget"),
            record("Git", "Git.Git", "winget"),
            record("Git", "Git.Git", "msstore"),
        ]);
        assert_eq!(dropped, 1);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn header_clicks_toggle_direction_per_column() {
        let mut catalog = catalog();
        assert_eq!(catalog.sort_clicked(Column::Name), SortDirection::Ascending);
        assert_eq!(catalog.sort_clicked(Column::Name), SortDirection::Descending);
        assert_eq!(catalog.sort_clicked(Column::Name), SortDirection::Ascending);
        assert_eq!(catalog.sort_clicked(Column::Source), SortDirection::Ascending);

        catalog.load(vec![record("Git", "Git.Git", "winget")]);
        assert_eq!(catalog.active_sort(), None);
        assert_eq!(catalog.sort_clicked(Column::Source), SortDirection::Ascending);
    }

    #[test]
    fn sort_keeps_filtered_projection_consistent() {
        let mut catalog = catalog();
        catalog.set_filter("winget");
        catalog.sort_by(Column::Name, true);
        assert_eq!(
            visible_ids(&catalog),
            vec!["Git.Git", "cURL.cURL", "7zip.7zip"]
        );

        catalog.set_filter("");
        assert_eq!(
            visible_ids(&catalog),
            vec!["Spotify.Spotify", "Git.Git", "cURL.cURL", "7zip.7zip"]
        );
    }

    #[test]
    fn equal_keys_keep_their_relative_order() {
        let mut catalog = catalog();
        catalog.sort_by(Column::Source, false);
        assert_eq!(
            visible_ids(&catalog),
            vec!["Spotify.Spotify", "Git.Git", "7zip.7zip", "cURL.cURL"]
        );
    }

    #[test]
    fn find_looks_up_by_identifier() {
        let catalog = catalog();
        assert_eq!(catalog.find("Git.Git").map(|r| r.name.as_str()), Some("Git"));
        assert!(catalog.find("git.git").is_none());
    }
}
