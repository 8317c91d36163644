//! Column-aligned listing tables printed by `winget upgrade`, `list` and `search`.
//!
//! A listing looks like this (spinner frames and progress bars may precede
//! the header, and a summary usually follows the body):
//!
//! ```text
//! Name               Id                 Version  Available Source
//! ---------------------------------------------------------------
//! Git                Git.Git            2.45.1   2.46.0    winget
//! 1 upgrades available.
//! ```

use std::sync::OnceLock;

use regex::Regex;

use crate::execution::sanitize::normalize_listing_line;

pub const DEFAULT_HEADER_TOKENS: &[&str] = &["Name", "ID", "Version"];

pub const DEFAULT_FOOTER_FRAGMENTS: &[&str] = &[
    "Mindestens ein Paket",
    "verfügt über eine Versionsnummer",
    "Aktualisierungen verfügbar",
    "upgrades available",
    "upgrade available",
    "package(s) have version numbers that cannot be determined",
    "require explicit targeting",
];

const INSTALLED_FIELDS: usize = 4;

/// How a data line is cut into fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SplitStrategy {
    /// Any run of whitespace separates fields. Lines yielding at least the
    /// expected count are truncated to it.
    WhitespaceRuns,
    /// Two or more consecutive spaces separate fields, so single spaces can
    /// appear inside a name. Lines must yield exactly the expected count.
    ColumnGaps,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TableShape {
    pub fields: usize,
    pub split: SplitStrategy,
}

pub const UPGRADE_LISTING: TableShape = TableShape {
    fields: 5,
    split: SplitStrategy::WhitespaceRuns,
};

pub const INSTALLED_LISTING: TableShape = TableShape {
    fields: INSTALLED_FIELDS,
    split: SplitStrategy::ColumnGaps,
};

pub const SEARCH_LISTING: TableShape = TableShape {
    fields: 5,
    split: SplitStrategy::WhitespaceRuns,
};

/// Field tuples recovered from a listing plus the count of lines dropped
/// after the header (footers and lines of the wrong shape).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParsedListing {
    pub rows: Vec<Vec<String>>,
    pub skipped_lines: usize,
}

/// Locale-dependent text used to find where a table starts and which
/// trailing lines are summaries rather than data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListingRules {
    pub header_tokens: Vec<String>,
    pub footer_fragments: Vec<String>,
}

impl Default for ListingRules {
    fn default() -> Self {
        Self {
            header_tokens: DEFAULT_HEADER_TOKENS.iter().map(|s| s.to_string()).collect(),
            footer_fragments: DEFAULT_FOOTER_FRAGMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ListingRules {
    /// A header names every header token as a whitespace-separated word,
    /// compared case-insensitively so both `Id` and `ID` match.
    pub fn is_header(&self, line: &str) -> bool {
        if self.header_tokens.is_empty() {
            return false;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        self.header_tokens.iter().all(|token| {
            words
                .iter()
                .any(|word| word.eq_ignore_ascii_case(token.as_str()))
        })
    }

    pub fn is_footer(&self, line: &str) -> bool {
        self.footer_fragments
            .iter()
            .any(|fragment| line.contains(fragment.as_str()))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TableState {
    SeekingHeader,
    /// Inside the table; `saw_row` is set once a data row was kept.
    Body { saw_row: bool },
    /// A blank line followed at least one data row. A second table may start
    /// here, so header lines are recognized again.
    AfterGap,
}

impl TableState {
    fn accepts_header(self) -> bool {
        matches!(self, Self::SeekingHeader | Self::AfterGap)
    }
}

/// Parses a listing whose fields are separated by whitespace runs, keeping
/// lines with at least `expected_min_fields` fields truncated to that count.
pub fn parse_listing(raw_stdout: &str, expected_min_fields: usize) -> ParsedListing {
    parse_table(
        raw_stdout,
        TableShape {
            fields: expected_min_fields,
            split: SplitStrategy::WhitespaceRuns,
        },
        &ListingRules::default(),
    )
}

pub fn parse_table(raw_stdout: &str, shape: TableShape, rules: &ListingRules) -> ParsedListing {
    let mut listing = ParsedListing::default();
    let mut state = TableState::SeekingHeader;

    for raw_line in raw_stdout.lines() {
        let line = normalize_listing_line(raw_line);
        let trimmed = line.trim();

        if state.accepts_header() && rules.is_header(trimmed) {
            state = TableState::Body { saw_row: false };
            continue;
        }

        match state {
            TableState::SeekingHeader => {}
            TableState::Body { .. } | TableState::AfterGap => {
                if trimmed.is_empty() {
                    if matches!(state, TableState::Body { saw_row: true }) {
                        state = TableState::AfterGap;
                    }
                    continue;
                }

                if is_separator(trimmed) {
                    continue;
                }

                if rules.is_footer(trimmed) {
                    listing.skipped_lines += 1;
                    continue;
                }

                match split_fields(&line, shape) {
                    Some(fields) => {
                        listing.rows.push(fields);
                        state = TableState::Body { saw_row: true };
                    }
                    None => listing.skipped_lines += 1,
                }
            }
        }
    }

    tracing::debug!(
        rows = listing.rows.len(),
        skipped = listing.skipped_lines,
        "parsed listing table"
    );
    listing
}

fn is_separator(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c == '-')
}

fn split_fields(line: &str, shape: TableShape) -> Option<Vec<String>> {
    if shape.fields == 0 {
        return None;
    }

    match shape.split {
        SplitStrategy::WhitespaceRuns => {
            let fields: Vec<String> = line
                .split_whitespace()
                .take(shape.fields)
                .map(str::to_owned)
                .collect();
            (fields.len() == shape.fields).then_some(fields)
        }
        SplitStrategy::ColumnGaps => {
            let captures = column_gap_pattern(shape.fields)?.captures(line.trim_end())?;
            captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().trim().to_owned()))
                .collect()
        }
    }
}

fn column_gap_pattern(fields: usize) -> Option<&'static Regex> {
    static INSTALLED: OnceLock<Option<Regex>> = OnceLock::new();

    if fields != INSTALLED_FIELDS {
        return None;
    }
    INSTALLED
        .get_or_init(|| Regex::new(&column_gap_source(INSTALLED_FIELDS)).ok())
        .as_ref()
}

/// `^(.+?)\s{2,}(.+?)\s{2,}...(.+)$`: lazy groups separated by gaps of two or
/// more whitespace characters, the last group taking the rest of the line.
fn column_gap_source(fields: usize) -> String {
    let mut pattern = String::from("^");
    for index in 0..fields {
        if index > 0 {
            pattern.push_str(r"\s{2,}");
        }
        if index + 1 == fields {
            pattern.push_str("(.+)");
        } else {
            pattern.push_str("(.+?)");
        }
    }
    pattern.push('$');
    pattern
}

#[cfg(test)]
mod tests {
    use super::{
        INSTALLED_LISTING, ListingRules, SEARCH_LISTING, UPGRADE_LISTING, column_gap_source,
        parse_listing, parse_table,
    };

    fn rows(values: &[&[&str]]) -> Vec<Vec<String>> {
        values
            .iter()
            .map(|row| row.iter().map(|value| value.to_string()).collect())
            .collect()
    }

    #[test]
    fn header_with_no_rows_yields_empty_listing() {
        let raw = "Name   ID   Version   Available   Source\n-----------------------------------\n";
        let listing = parse_listing(raw, 5);
        assert!(listing.rows.is_empty());
        assert_eq!(listing.skipped_lines, 0);
    }

    #[test]
    fn single_space_upgrade_line_yields_its_five_tokens() {
        let raw = "Name ID Version Available Source\n---\nGit Git.Git 2.45.1 2.46.0 winget\n";
        let listing = parse_table(raw, UPGRADE_LISTING, &ListingRules::default());
        assert_eq!(
            listing.rows,
            rows(&[&["Git", "Git.Git", "2.45.1", "2.46.0", "winget"]])
        );
    }

    #[test]
    fn lines_before_header_are_ignored() {
        let raw = "   - \r   \\ \r\nNo header yet here\nName  Id  Version  Available  Source\n\
                   a b c d e\n";
        let listing = parse_listing(raw, 5);
        assert_eq!(listing.rows, rows(&[&["a", "b", "c", "d", "e"]]));
    }

    #[test]
    fn extra_fields_are_truncated_and_short_lines_counted() {
        let raw = "Name ID Version Available Source\n\
                   Tool Vendor.Tool 1.0 1.1 winget extra\n\
                   short line only\n";
        let listing = parse_table(raw, UPGRADE_LISTING, &ListingRules::default());
        assert_eq!(
            listing.rows,
            rows(&[&["Tool", "Vendor.Tool", "1.0", "1.1", "winget"]])
        );
        assert_eq!(listing.skipped_lines, 1);
    }

    #[test]
    fn full_listing_splits_on_column_gaps() {
        let raw = "Name                Id                          Version  Source\n\
                   ---------------------------------------------------------------\n\
                   Visual Studio Code  Microsoft.VisualStudioCode  1.92.0  winget\n";
        let listing = parse_table(raw, INSTALLED_LISTING, &ListingRules::default());
        assert_eq!(
            listing.rows,
            rows(&[&[
                "Visual Studio Code",
                "Microsoft.VisualStudioCode",
                "1.92.0",
                "winget"
            ]])
        );
    }

    #[test]
    fn full_listing_drops_lines_without_four_groups() {
        let raw = "Name  Id  Version  Source\n\
                   Windows Driver Package  Intel Display  31.0\n";
        let listing = parse_table(raw, INSTALLED_LISTING, &ListingRules::default());
        assert!(listing.rows.is_empty());
        assert_eq!(listing.skipped_lines, 1);
    }

    #[test]
    fn localized_footer_is_skipped() {
        let raw = "Name ID Version Verfügbar Quelle\n\
                   Git Git.Git 2.45.1 2.46.0 winget\n\
                   Mindestens ein Paket verfügt über eine Versionsnummer, die nicht ermittelt werden kann.\n";
        let listing = parse_table(raw, UPGRADE_LISTING, &ListingRules::default());
        assert_eq!(listing.rows.len(), 1);
        assert_eq!(listing.skipped_lines, 1);
    }

    #[test]
    fn rows_after_a_blank_line_are_kept() {
        let raw = "Name Id Version Available Source\n---\n\
                   Git Git.Git 2.45.1 2.46.0 winget\n\
                   \n\
                   Zoom Zoom.Zoom 5.17 6.0 winget\n";
        let listing = parse_table(raw, UPGRADE_LISTING, &ListingRules::default());
        assert_eq!(
            listing.rows,
            rows(&[
                &["Git", "Git.Git", "2.45.1", "2.46.0", "winget"],
                &["Zoom", "Zoom.Zoom", "5.17", "6.0", "winget"],
            ])
        );
        assert_eq!(listing.skipped_lines, 0);
    }

    #[test]
    fn full_listing_row_after_a_blank_line_is_kept() {
        let raw = "Name                Id                          Version  Source\n\
                   ---------------------------------------------------------------\n\
                   Git                 Git.Git                     2.45.1   winget\n\
                   \n\
                   Visual Studio Code  Microsoft.VisualStudioCode  1.92.0  winget\n\
                   short note\n";
        let listing = parse_table(raw, INSTALLED_LISTING, &ListingRules::default());
        assert_eq!(listing.rows.len(), 2);
        assert_eq!(listing.rows[1][1], "Microsoft.VisualStudioCode");
        assert_eq!(listing.skipped_lines, 1);
    }

    #[test]
    fn data_row_naming_header_words_is_not_a_header() {
        let raw = "Name Id Version Available Source\n\
                   ---------------------------------\n\
                   Name Id Version Tool Vendor.Tool\n\
                   Git Git.Git 2.45.1 2.46.0 winget\n";
        let listing = parse_table(raw, UPGRADE_LISTING, &ListingRules::default());
        assert_eq!(
            listing.rows,
            rows(&[
                &["Name", "Id", "Version", "Tool", "Vendor.Tool"],
                &["Git", "Git.Git", "2.45.1", "2.46.0", "winget"],
            ])
        );
        assert_eq!(listing.skipped_lines, 0);
    }

    #[test]
    fn repeated_header_reopens_body_without_becoming_a_row() {
        let raw = "Name Id Version Available Source\n\
                   Git Git.Git 2.45.1 2.46.0 winget\n\
                   \n\
                   The following packages have an upgrade available, but require explicit targeting for upgrade:\n\
                   Name Id Version Available Source\n\
                   ---------------------------------\n\
                   Zoom Zoom.Zoom 5.17 6.0 winget\n";
        let listing = parse_table(raw, UPGRADE_LISTING, &ListingRules::default());
        assert_eq!(
            listing.rows,
            rows(&[
                &["Git", "Git.Git", "2.45.1", "2.46.0", "winget"],
                &["Zoom", "Zoom.Zoom", "5.17", "6.0", "winget"],
            ])
        );
        assert_eq!(listing.skipped_lines, 1);
    }

    #[test]
    fn search_listing_keeps_match_column() {
        let raw = "Name Id Version Match Source\n\
                   --------------------------------\n\
                   PowerToys Microsoft.PowerToys 0.83.0 Tag:toys winget\n";
        let listing = parse_table(raw, SEARCH_LISTING, &ListingRules::default());
        assert_eq!(
            listing.rows,
            rows(&[&[
                "PowerToys",
                "Microsoft.PowerToys",
                "0.83.0",
                "Tag:toys",
                "winget"
            ]])
        );
    }

    #[test]
    fn output_without_header_yields_nothing() {
        let listing = parse_listing("No installed package found matching input criteria.\n", 5);
        assert_eq!(listing.rows.len(), 0);
    }

    #[test]
    fn header_requires_every_token_as_a_word() {
        let rules = ListingRules::default();
        assert!(rules.is_header("Name   Id   Version   Available   Source"));
        assert!(rules.is_header("Name ID Version Verfügbar Quelle"));
        assert!(!rules.is_header("Android Studio  Google.AndroidStudio  Version 2023"));
    }

    #[test]
    fn column_gap_source_has_one_group_per_field() {
        assert_eq!(
            column_gap_source(4),
            r"^(.+?)\s{2,}(.+?)\s{2,}(.+?)\s{2,}(.+)$"
        );
    }
}
