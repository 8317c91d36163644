mod table;
mod versions;

pub use table::{
    DEFAULT_FOOTER_FRAGMENTS, DEFAULT_HEADER_TOKENS, INSTALLED_LISTING, ListingRules,
    ParsedListing, SEARCH_LISTING, SplitStrategy, TableShape, UPGRADE_LISTING, parse_listing,
    parse_table,
};
pub use versions::{DEFAULT_SUMMARY_PREFIXES, parse_versions, parse_versions_with};
