//! The fetch tool's stdout report.
//!
//! ```text
//! Copied artifacts:
//! com.example.widget-1.0.aar
//!
//! Missing artifacts:
//! com.example:gadget:2.0
//!
//! Modified artifacts:
//! com.android.support:support-v4:27.1.0
//! ```
//!
//! Each section runs until a blank line or the end of output. An absent
//! header means no entries.

use std::path::{Path, PathBuf};

const COPIED_HEADER: &str = "Copied artifacts:";
const MISSING_HEADER: &str = "Missing artifacts:";
const MODIFIED_HEADER: &str = "Modified artifacts:";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Copied files, joined to the destination directory.
    pub copied: Vec<PathBuf>,
    /// `group:artifact:version[:classifier]` specs that could not be fetched.
    pub missing: Vec<String>,
    /// Specs rewritten by the compatibility pass.
    pub modified: Vec<String>,
}

#[derive(Clone, Copy)]
enum Section {
    None,
    Copied,
    Missing,
    Modified,
}

pub fn parse_fetch_report(stdout: &str, destination: &Path) -> FetchReport {
    let mut report = FetchReport::default();
    let mut section = Section::None;

    for line in stdout.lines() {
        let line = line.trim();
        match line {
            COPIED_HEADER => section = Section::Copied,
            MISSING_HEADER => section = Section::Missing,
            MODIFIED_HEADER => section = Section::Modified,
            "" => section = Section::None,
            entry => match section {
                Section::Copied => report.copied.push(destination.join(entry)),
                Section::Missing => report.missing.push(entry.to_string()),
                Section::Modified => report.modified.push(entry.to_string()),
                Section::None => {}
            },
        }
    }
    report
}
