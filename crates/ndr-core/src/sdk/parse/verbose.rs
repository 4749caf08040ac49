//! Parse `sdkmanager --verbose --list` output: one unindented package path per
//! block followed by indented `Field: value` lines.
//!
//! ```text
//! Installed packages:
//! --------------------------------------
//! build-tools;25.0.3
//!     Description:        Android SDK Build-Tools 25.0.3
//!     Version:            25.0.3
//!     Installed Location: /opt/android-sdk/build-tools/25.0.3
//! ```

use super::{section_header, Section};
use crate::sdk::package::PlatformPackage;

#[derive(Default)]
struct Entry {
    name: String,
    description: String,
    version: Option<String>,
    location: Option<String>,
}

fn flush(entry: &mut Option<Entry>, section: Section, out: &mut Vec<PlatformPackage>) {
    let Some(e) = entry.take() else {
        return;
    };
    let Some(version) = e.version else {
        tracing::warn!("package {} listed without a version, skipped", e.name);
        return;
    };
    let mut package = PlatformPackage::new(&e.name, &version)
        .with_description(&e.description)
        .installed(section == Section::Installed);
    if let Some(loc) = &e.location {
        package = package.with_location(loc);
    }
    out.push(package);
}

pub fn parse_verbose_list(output: &str) -> Vec<PlatformPackage> {
    let mut packages = Vec::new();
    let mut section = Section::Unknown;
    let mut entry: Option<Entry> = None;

    for raw in output.lines() {
        let trimmed = raw.trim();
        if let Some(next) = section_header(trimmed) {
            flush(&mut entry, section, &mut packages);
            section = next;
            continue;
        }
        if trimmed.is_empty() || trimmed.starts_with("---") {
            flush(&mut entry, section, &mut packages);
            continue;
        }
        if section == Section::Unknown {
            continue;
        }

        let indented = raw.starts_with(' ') || raw.starts_with('\t');
        if !indented {
            flush(&mut entry, section, &mut packages);
            // Package paths never contain whitespace or ':'; progress bars and
            // "Info:" lines do.
            if !trimmed.contains(char::is_whitespace) && !trimmed.contains(':') {
                entry = Some(Entry {
                    name: trimmed.to_string(),
                    ..Entry::default()
                });
            }
            continue;
        }

        let Some(e) = entry.as_mut() else {
            continue;
        };
        let Some((field, value)) = trimmed.split_once(':') else {
            // Nested values such as dependency lists.
            continue;
        };
        let value = value.trim();
        match field.trim().to_ascii_lowercase().as_str() {
            "description" => e.description = value.to_string(),
            "version" => e.version = Some(value.to_string()),
            "installed location" => e.location = Some(value.to_string()),
            // Updates list the version already present and the one on offer.
            "remote version" => e.version = Some(value.to_string()),
            _ => {}
        }
    }
    flush(&mut entry, section, &mut packages);
    packages
}
