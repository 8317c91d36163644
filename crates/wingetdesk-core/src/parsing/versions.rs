use crate::execution::sanitize::normalize_listing_line;

pub const DEFAULT_SUMMARY_PREFIXES: &[&str] = &["Gefunden", "Found"];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VersionState {
    Init,
    HeaderSeen,
    Collecting,
    Done,
}

/// Reads the output of `winget show --id <id> --versions`, newest first as
/// printed.
///
/// ```text
/// Gefunden Git [Git.Git]
/// Version
/// -------
/// 2.46.0
/// 2.45.2
/// ```
pub fn parse_versions(raw_stdout: &str) -> Vec<String> {
    parse_versions_with(raw_stdout, DEFAULT_SUMMARY_PREFIXES)
}

/// Like [`parse_versions`] with the given localized summary prefixes. A line
/// starting with one of them, or containing a colon, ends the listing.
pub fn parse_versions_with<S: AsRef<str>>(raw_stdout: &str, summary_prefixes: &[S]) -> Vec<String> {
    let mut versions = Vec::new();
    let mut state = VersionState::Init;

    for raw_line in raw_stdout.lines() {
        let normalized = normalize_listing_line(raw_line);
        let line = normalized.trim();
        if line.is_empty() {
            continue;
        }

        state = match state {
            VersionState::Init if line == "Version" => VersionState::HeaderSeen,
            VersionState::Init => VersionState::Init,
            VersionState::HeaderSeen if line.chars().all(|c| c == '-') => VersionState::Collecting,
            VersionState::HeaderSeen => VersionState::HeaderSeen,
            VersionState::Collecting if ends_listing(line, summary_prefixes) => VersionState::Done,
            VersionState::Collecting => {
                versions.push(line.to_string());
                VersionState::Collecting
            }
            VersionState::Done => break,
        };

        if state == VersionState::Done {
            break;
        }
    }

    tracing::debug!(versions = versions.len(), "parsed version listing");
    versions
}

fn ends_listing<S: AsRef<str>>(line: &str, summary_prefixes: &[S]) -> bool {
    line.contains(':')
        || summary_prefixes
            .iter()
            .any(|prefix| line.starts_with(prefix.as_ref()))
}
