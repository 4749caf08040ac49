//! Declared library dependencies (`group:artifact:version[:classifier]`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version spec meaning "newest available".
pub const LATEST: &str = "LATEST";

/// Wildcard version understood by the fetch tool.
pub const WILDCARD: &str = "+";

/// Provenance used for dependencies rebuilt from a fetch report.
pub const REPORT_PROVENANCE: &str = "fetch report";

/// A requested library. Immutable once constructed; several dependencies may
/// name the same package at different versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub group: String,
    pub artifact: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    /// Candidate repositories in priority order.
    #[serde(default)]
    pub repositories: Vec<String>,
    /// Platform SDK packages that must be installed for this library to be fetchable.
    #[serde(default)]
    pub platform_packages: Vec<String>,
    /// Where this dependency was declared.
    #[serde(default)]
    pub provenance: String,
}

impl Dependency {
    pub fn new(group: &str, artifact: &str, version: &str) -> Self {
        Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.to_string(),
            classifier: None,
            repositories: Vec::new(),
            platform_packages: Vec::new(),
            provenance: String::new(),
        }
    }

    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = Some(classifier.to_string());
        self
    }

    pub fn with_repositories<I, S>(mut self, repositories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repositories = repositories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_platform_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platform_packages = packages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_provenance(mut self, provenance: &str) -> Self {
        self.provenance = provenance.to_string();
        self
    }

    /// `group:artifact`, the identity used for conflict detection.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    /// `group:artifact:version[:classifier]`.
    pub fn key(&self) -> String {
        self.key_with_version(&self.version)
    }

    /// Spec passed to the fetch tool: like `key()` but `LATEST` becomes `+`.
    pub fn fetch_spec(&self) -> String {
        if self.version == LATEST {
            self.key_with_version(WILDCARD)
        } else {
            self.key()
        }
    }

    fn key_with_version(&self, version: &str) -> String {
        match &self.classifier {
            Some(c) => format!("{}:{}:{}:{}", self.group, self.artifact, version, c),
            None => format!("{}:{}:{}", self.group, self.artifact, version),
        }
    }

    /// Best-effort reconstruction from a bare spec string. Needs at least
    /// `group:artifact`; a missing version becomes `LATEST`.
    pub fn from_spec(spec: &str, provenance: &str) -> Option<Self> {
        let parts: Vec<&str> = spec.trim().split(':').collect();
        if parts.len() < 2 || parts.iter().take(2).any(|p| p.is_empty()) {
            return None;
        }
        let version = parts.get(2).copied().filter(|v| !v.is_empty()).unwrap_or(LATEST);
        let mut dep = Dependency::new(parts[0], parts[1], version).with_provenance(provenance);
        if let Some(classifier) = parts.get(3).filter(|c| !c.is_empty()) {
            dep = dep.with_classifier(classifier);
        }
        Some(dep)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_and_identity() {
        let dep = Dependency::new("com.example", "widget", "1.2.3");
        assert_eq!(dep.identity(), "com.example:widget");
        assert_eq!(dep.key(), "com.example:widget:1.2.3");
        let dep = dep.with_classifier("sources");
        assert_eq!(dep.key(), "com.example:widget:1.2.3:sources");
        assert_eq!(dep.identity(), "com.example:widget");
    }

    #[test]
    fn latest_becomes_wildcard_in_fetch_spec() {
        let dep = Dependency::new("a.b", "c", LATEST);
        assert_eq!(dep.key(), "a.b:c:LATEST");
        assert_eq!(dep.fetch_spec(), "a.b:c:+");
        let pinned = Dependency::new("a.b", "c", "16.0.+");
        assert_eq!(pinned.fetch_spec(), "a.b:c:16.0.+");
    }

    #[test]
    fn from_spec_tolerates_partial_keys() {
        let full = Dependency::from_spec("g:a:1.0:aar", "x").unwrap();
        assert_eq!(full.version, "1.0");
        assert_eq!(full.classifier.as_deref(), Some("aar"));
        assert_eq!(full.provenance, "x");

        let bare = Dependency::from_spec("g:a", "x").unwrap();
        assert_eq!(bare.version, LATEST);

        assert!(Dependency::from_spec("lonely", "x").is_none());
        assert!(Dependency::from_spec(":a:1.0", "x").is_none());
    }
}
