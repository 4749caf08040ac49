//! In-memory index of platform packages, rebuilt on every query.

use std::collections::BTreeMap;

use super::package::{PackageNameVersion, PlatformPackage};

/// Packages keyed by name; a name can have several versions (installed and available).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageCatalog {
    packages: BTreeMap<String, Vec<PlatformPackage>>,
}

impl PackageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: PlatformPackage) {
        let versions = self.packages.entry(package.name.clone()).or_default();
        // Same version reported twice (e.g. installed and in an update list): merge.
        if let Some(existing) = versions
            .iter_mut()
            .find(|p| p.version_number == package.version_number && p.version == package.version)
        {
            existing.installed |= package.installed;
            if existing.description.is_empty() {
                existing.description = package.description;
            }
            if existing.location.is_none() {
                existing.location = package.location;
            }
            return;
        }
        versions.push(package);
    }

    pub fn versions(&self, name: &str) -> &[PlatformPackage] {
        self.packages.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Highest known version of `name`, installed or not.
    pub fn most_recent(&self, name: &str) -> Option<&PlatformPackage> {
        self.versions(name).iter().max_by_key(|p| (p.version_number, p.installed))
    }

    /// Highest installed version of `name`.
    pub fn installed(&self, name: &str) -> Option<&PlatformPackage> {
        self.versions(name)
            .iter()
            .filter(|p| p.installed)
            .max_by_key(|p| p.version_number)
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.installed(name).is_some()
    }

    /// Requested packages with no installed version, resolved to the most
    /// recent available version. Unknown names are returned unversioned.
    pub fn to_install(&self, requested: &[PackageNameVersion]) -> Vec<PackageNameVersion> {
        requested
            .iter()
            .filter(|p| !self.is_installed(&p.name))
            .map(|p| match self.most_recent(&p.name) {
                Some(latest) => latest.name_version(),
                None => p.clone(),
            })
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlatformPackage> {
        self.packages.values().flatten()
    }
}

impl FromIterator<PlatformPackage> for PackageCatalog {
    fn from_iter<T: IntoIterator<Item = PlatformPackage>>(iter: T) -> Self {
        let mut catalog = PackageCatalog::new();
        for package in iter {
            catalog.insert(package);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PackageCatalog {
        [
            PlatformPackage::new("extras;google;m2repository", "57").installed(true),
            PlatformPackage::new("extras;google;m2repository", "58"),
            PlatformPackage::new("build-tools;28.0.3", "28.0.3"),
            PlatformPackage::new("build-tools;28.0.3", "28.0.3").with_description("Build tools"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn derived_queries() {
        let catalog = sample();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.versions("build-tools;28.0.3").len(), 1);
        assert_eq!(
            catalog.versions("build-tools;28.0.3")[0].description,
            "Build tools"
        );
        let m2 = "extras;google;m2repository";
        assert_eq!(catalog.most_recent(m2).unwrap().version, "58");
        assert_eq!(catalog.installed(m2).unwrap().version, "57");
        assert!(catalog.is_installed(m2));
        assert!(!catalog.is_installed("build-tools;28.0.3"));
        assert!(catalog.most_recent("nope").is_none());
    }

    #[test]
    fn to_install_skips_installed_and_picks_latest() {
        let catalog = sample();
        let requested = vec![
            PackageNameVersion::new("extras;google;m2repository"),
            PackageNameVersion::new("build-tools;28.0.3"),
            PackageNameVersion::new("unknown;pkg"),
        ];
        let out = catalog.to_install(&requested);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "build-tools;28.0.3");
        assert_eq!(out[0].version.as_deref(), Some("28.0.3"));
        assert_eq!(out[1], PackageNameVersion::new("unknown;pkg"));
    }

    #[test]
    fn merging_same_version_keeps_installed_flag() {
        let mut catalog = PackageCatalog::new();
        catalog.insert(PlatformPackage::new("tools", "26.1.1"));
        catalog.insert(PlatformPackage::new("tools", "26.1.1").installed(true).with_location("tools"));
        let v = catalog.versions("tools");
        assert_eq!(v.len(), 1);
        assert!(v[0].installed);
        assert_eq!(v[0].location.as_deref(), Some("tools"));
    }
}
