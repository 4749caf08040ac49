//! Parse the pipe-delimited `sdkmanager --list` output.
//!
//! ```text
//! Installed packages:
//!   Path               | Version | Description             | Location
//!   -------            | ------- | -------                 | -------
//!   build-tools;28.0.3 | 28.0.3  | Android SDK Build-Tools | build-tools/28.0.3/
//!
//! Available Updates:
//!   ID       | Installed | Available
//!   -------  | -------   | -------
//!   emulator | 29.0.11   | 30.0.5
//! ```

use super::{section_header, Section};
use crate::sdk::package::PlatformPackage;

pub fn parse_tabular_list(output: &str) -> Vec<PlatformPackage> {
    let mut packages = Vec::new();
    let mut section = Section::Unknown;
    let mut in_rows = false;

    for raw in output.lines() {
        let line = raw.trim();
        if let Some(next) = section_header(line) {
            section = next;
            in_rows = false;
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if line.starts_with("---") {
            in_rows = true;
            continue;
        }
        if !in_rows || section == Section::Unknown {
            continue;
        }

        let columns: Vec<&str> = line.split('|').map(str::trim).collect();
        if columns.len() < 2 || columns[0].is_empty() {
            tracing::warn!("skipping malformed package row: {line}");
            continue;
        }
        let name = columns[0];
        match section {
            Section::Installed => {
                let mut package = PlatformPackage::new(name, columns[1])
                    .with_description(columns.get(2).copied().unwrap_or_default())
                    .installed(true);
                if let Some(loc) = columns.get(3).filter(|l| !l.is_empty()) {
                    package = package.with_location(loc);
                }
                packages.push(package);
            }
            Section::Available => {
                packages.push(
                    PlatformPackage::new(name, columns[1])
                        .with_description(columns.get(2).copied().unwrap_or_default()),
                );
            }
            Section::Updates => {
                // name | installed version | available version
                if let Some(available) = columns.get(2).filter(|v| !v.is_empty()) {
                    packages.push(PlatformPackage::new(name, available));
                }
            }
            Section::Unknown => {}
        }
    }
    packages
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Installed packages:=====================] 100% Computing updates...
  Path                        | Version | Description                    | Location
  -------                     | ------- | -------                        | -------
  build-tools;28.0.3          | 28.0.3  | Android SDK Build-Tools 28.0.3 | build-tools/28.0.3/
  extras;google;m2repository  | 58      | Google Repository              | extras/google/m2repository/

Available Packages:
  Path                        | Version | Description
  -------                     | ------- | -------
  extras;google;m2repository  | 58      | Google Repository
  platforms;android-29        | 4       | Android SDK Platform 29

Available Updates:
  ID                          | Installed | Available
  -------                     | -------   | -------
  emulator                    | 29.0.11   | 30.0.5
";

    #[test]
    fn parses_all_sections() {
        let packages = parse_tabular_list(SAMPLE);
        assert_eq!(packages.len(), 5);

        assert_eq!(packages[0].name, "build-tools;28.0.3");
        assert!(packages[0].installed);
        assert_eq!(packages[0].location.as_deref(), Some("build-tools/28.0.3/"));

        assert_eq!(packages[2].name, "extras;google;m2repository");
        assert!(!packages[2].installed);
        assert_eq!(packages[3].description, "Android SDK Platform 29");

        assert_eq!(packages[4].name, "emulator");
        assert_eq!(packages[4].version, "30.0.5");
        assert!(!packages[4].installed);
    }

    #[test]
    fn rows_before_separator_are_headers() {
        let out = "available packages:\n  Path | Version\n  ---- | ----\n  tools | 26.1.1\n";
        let packages = parse_tabular_list(out);
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "tools");
    }
}
