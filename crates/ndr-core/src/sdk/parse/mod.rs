//! Pure parsers for the three package-list grammars. They take tool stdout
//! and return packages; no process execution happens here.

mod legacy;
mod tabular;
mod verbose;

pub use legacy::{parse_legacy_list, INSTALLED_SENTINEL};
pub use tabular::parse_tabular_list;
pub use verbose::parse_verbose_list;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Section {
    Unknown,
    Installed,
    Available,
    Updates,
}

/// Recognize a section header (case-insensitive, may be followed by progress output).
pub(crate) fn section_header(line: &str) -> Option<Section> {
    let lower = line.trim().to_ascii_lowercase();
    if lower.starts_with("installed packages:") {
        Some(Section::Installed)
    } else if lower.starts_with("available packages:") {
        Some(Section::Available)
    } else if lower.starts_with("available updates:") {
        Some(Section::Updates)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers() {
        assert_eq!(section_header("Installed packages:"), Some(Section::Installed));
        assert_eq!(section_header("  available Packages:"), Some(Section::Available));
        assert_eq!(section_header("Available Updates:"), Some(Section::Updates));
        assert_eq!(section_header("Installed"), None);
    }
}
