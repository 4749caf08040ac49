//! Platform package names and versions.

use std::fmt;

/// Multiplier between adjacent version components when encoding a version as an integer.
const COMPONENT_BASE: u64 = 1_000_000;

/// Encode a dotted version as an integer: the last component has weight 1,
/// the one before it 10^6, and so on. Empty or malformed strings encode as 0.
pub fn encode_version(version: &str) -> u64 {
    let version = version.trim();
    if version.is_empty() {
        return 0;
    }
    let mut value: u64 = 0;
    let mut multiplier: u64 = 1;
    for component in version.split('.').rev() {
        let Ok(n) = component.trim().parse::<u64>() else {
            tracing::warn!("unable to parse version component '{component}' of '{version}'");
            return 0;
        };
        value = value.saturating_add(n.saturating_mul(multiplier));
        multiplier = multiplier.saturating_mul(COMPONENT_BASE);
    }
    value
}

/// A package name with an optional version, as requested for installation.
///
/// Names use the modern `;`-separated form (`extras;google;m2repository`).
/// The legacy tool uses `-`-separated names with an `extra` prefix
/// (`extra-google-m2repository`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageNameVersion {
    pub name: String,
    pub version: Option<String>,
}

impl PackageNameVersion {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Build from a legacy-format name.
    pub fn from_legacy_name(legacy: &str) -> Self {
        let mut components: Vec<&str> = legacy.split('-').collect();
        if components.first() == Some(&"extra") {
            components[0] = "extras";
        }
        Self::new(&components.join(";"))
    }

    /// Accept either naming form; anything without `;` is treated as legacy.
    pub fn parse_any(name: &str) -> Self {
        let name = name.trim();
        if name.contains(';') {
            Self::new(name)
        } else {
            Self::from_legacy_name(name)
        }
    }

    /// Name in the legacy tool's format.
    pub fn legacy_name(&self) -> String {
        let mut components: Vec<&str> = self.name.split(';').collect();
        if components.first() == Some(&"extras") {
            components[0] = "extra";
        }
        components.join("-")
    }

    pub fn version_number(&self) -> u64 {
        self.version.as_deref().map(encode_version).unwrap_or(0)
    }
}

impl fmt::Display for PackageNameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{} ({})", self.name, v),
            None => f.write_str(&self.name),
        }
    }
}

/// One discovered version of a platform package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPackage {
    pub name: String,
    pub version: String,
    pub version_number: u64,
    pub description: String,
    pub installed: bool,
    /// Install location reported by the tool, if any.
    pub location: Option<String>,
}

impl PlatformPackage {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            version_number: encode_version(version),
            description: String::new(),
            installed: false,
            location: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn installed(mut self, installed: bool) -> Self {
        self.installed = installed;
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn name_version(&self) -> PackageNameVersion {
        PackageNameVersion::new(&self.name).with_version(&self.version)
    }
}
