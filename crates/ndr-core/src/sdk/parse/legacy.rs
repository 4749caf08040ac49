//! Parse the legacy `android list sdk` output.
//!
//! ```text
//! ----------
//! id: 3 or "extra-google-m2repository"
//!      Type: Extra
//!      Desc: Google Repository, revision 58
//!      Install path: extras/google/m2repository
//! ```
//!
//! Blocks are separated by lines starting with `---`. A package is installed
//! when it reports an install path and that directory holds the sentinel
//! metadata file.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::sdk::package::{PackageNameVersion, PlatformPackage};

/// Metadata file present in every installed package directory.
pub const INSTALLED_SENTINEL: &str = "source.properties";

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^id:\s*(\d+)\s+or\s+"([^"]+)""#).expect("valid regex"))
}

fn revision_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)revision:?\s+([0-9]+(?:\.[0-9]+)*)").expect("valid regex"))
}

#[derive(Default)]
struct Block {
    name: Option<String>,
    description: Option<String>,
    version: Option<String>,
    location: Option<String>,
}

impl Block {
    fn finish(self, sdk_root: &Path, out: &mut Vec<PlatformPackage>) {
        let Some(legacy_name) = self.name else {
            return;
        };
        let name = PackageNameVersion::from_legacy_name(&legacy_name).name;
        let version = self.version.unwrap_or_default();
        let installed = self
            .location
            .as_deref()
            .map(|loc| sdk_root.join(loc).join(INSTALLED_SENTINEL).is_file())
            .unwrap_or(false);
        let mut package = PlatformPackage::new(&name, &version)
            .with_description(self.description.as_deref().unwrap_or_default())
            .installed(installed);
        if let Some(loc) = &self.location {
            package = package.with_location(loc);
        }
        out.push(package);
    }
}

/// Parse legacy list output. Unknown lines are ignored.
pub fn parse_legacy_list(output: &str, sdk_root: &Path) -> Vec<PlatformPackage> {
    let mut packages = Vec::new();
    let mut block = Block::default();

    for raw in output.lines() {
        let line = raw.trim();
        if line.starts_with("---") {
            std::mem::take(&mut block).finish(sdk_root, &mut packages);
            continue;
        }
        if let Some(caps) = id_pattern().captures(line) {
            // A new id inside an unterminated block starts a new package.
            std::mem::take(&mut block).finish(sdk_root, &mut packages);
            block.name = Some(caps[2].to_string());
            continue;
        }
        if block.name.is_none() {
            continue;
        }
        if let Some(desc) = line.strip_prefix("Desc:") {
            let desc = desc.trim();
            block.description = Some(desc.to_string());
            if block.version.is_none() {
                block.version = revision_pattern().captures(desc).map(|c| c[1].to_string());
            }
        } else if let Some(loc) = line
            .strip_prefix("Install path:")
            .or_else(|| line.strip_prefix("Install location:"))
        {
            block.location = Some(loc.trim().to_string());
        } else if let Some(caps) = revision_pattern().captures(line) {
            if line.to_ascii_lowercase().starts_with("revision") {
                block.version = Some(caps[1].to_string());
            }
        }
    }
    block.finish(sdk_root, &mut packages);
    packages
}
