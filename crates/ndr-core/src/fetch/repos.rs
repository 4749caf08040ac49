//! Repository list assembly for the fetch tool.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

use crate::dependency::Dependency;

/// Global repositories first, then the dependencies' lists interleaved by
/// position (every first entry, then every second entry, ...). Duplicates keep
/// their first position.
pub fn ordered_repositories(global: &[String], dependencies: &[Dependency]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    let mut push = |repo: &str| {
        let repo = repo.trim();
        if !repo.is_empty() && seen.insert(repo.to_string()) {
            ordered.push(repo.to_string());
        }
    };

    for repo in global {
        push(repo);
    }
    let longest = dependencies
        .iter()
        .map(|d| d.repositories.len())
        .max()
        .unwrap_or(0);
    for column in 0..longest {
        for dep in dependencies {
            if let Some(repo) = dep.repositories.get(column) {
                push(repo);
            }
        }
    }
    ordered
}

/// Turns repository entries into URIs the fetch tool understands.
#[derive(Debug, Clone)]
pub struct RepoPathResolver {
    /// Directories relative paths are tried against, in order.
    roots: Vec<PathBuf>,
}

impl RepoPathResolver {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// URLs pass through; existing local directories become `file://` URLs;
    /// anything else is kept as written.
    pub fn resolve(&self, repo: &str) -> String {
        if Url::parse(repo).map(|u| u.scheme().len() > 1).unwrap_or(false) {
            return repo.to_string();
        }
        let path = Path::new(repo);
        let candidates: Vec<PathBuf> = if path.is_absolute() {
            vec![path.to_path_buf()]
        } else {
            self.roots.iter().map(|root| root.join(path)).collect()
        };
        for candidate in candidates {
            if !candidate.is_dir() {
                continue;
            }
            let absolute = std::fs::canonicalize(&candidate).unwrap_or(candidate);
            if let Ok(url) = Url::from_directory_path(&absolute) {
                return url.to_string();
            }
        }
        tracing::warn!("repository '{repo}' is neither a URL nor an existing directory, passing it through");
        repo.to_string()
    }

    /// Resolve every entry, dropping entries that resolve to a URI already
    /// listed (e.g. a relative and an absolute path to the same directory).
    pub fn resolve_all(&self, repos: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        repos
            .iter()
            .map(|r| self.resolve(r))
            .filter(|uri| seen.insert(uri.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(repos: &[&str]) -> Dependency {
        Dependency::new("g", "a", "1").with_repositories(repos.iter().copied())
    }

    #[test]
    fn round_robin_after_globals() {
        let global = vec!["G".to_string()];
        let deps = vec![dep(&["A1", "A2", "A3"]), dep(&["B1"]), dep(&["C1", "C2"])];
        assert_eq!(
            ordered_repositories(&global, &deps),
            vec!["G", "A1", "B1", "C1", "A2", "C2", "A3"]
        );
    }

    #[test]
    fn duplicates_keep_first_position() {
        let global = vec!["https://maven.google.com".to_string()];
        let deps = vec![
            dep(&["local", "https://maven.google.com"]),
            dep(&["local"]),
        ];
        assert_eq!(
            ordered_repositories(&global, &deps),
            vec!["https://maven.google.com", "local"]
        );
    }

    #[test]
    fn resolver_handles_urls_dirs_and_unknowns() {
        let packages = tempfile::tempdir().unwrap();
        let assets = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(assets.path().join("m2repo")).unwrap();
        let resolver =
            RepoPathResolver::new(vec![packages.path().to_path_buf(), assets.path().to_path_buf()]);

        assert_eq!(
            resolver.resolve("https://maven.google.com"),
            "https://maven.google.com"
        );
        let local = resolver.resolve("m2repo");
        assert!(local.starts_with("file://"));
        assert!(local.ends_with("m2repo/"));
        assert_eq!(resolver.resolve("does/not/exist"), "does/not/exist");
    }

    #[test]
    fn package_root_wins_over_assets_root() {
        let packages = tempfile::tempdir().unwrap();
        let assets = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(packages.path().join("repo")).unwrap();
        std::fs::create_dir_all(assets.path().join("repo")).unwrap();
        let resolver =
            RepoPathResolver::new(vec![packages.path().to_path_buf(), assets.path().to_path_buf()]);
        let pkg_url = Url::from_directory_path(
            std::fs::canonicalize(packages.path().join("repo")).unwrap(),
        )
        .unwrap();
        assert_eq!(resolver.resolve("repo"), pkg_url.to_string());
    }

    #[test]
    fn spellings_of_one_directory_collapse_after_resolving() {
        let root = tempfile::tempdir().unwrap();
        let repo = root.path().join("m2repo");
        std::fs::create_dir_all(&repo).unwrap();
        let resolver = RepoPathResolver::new(vec![root.path().to_path_buf()]);
        let entries = vec![
            "m2repo".to_string(),
            "https://maven.google.com".to_string(),
            repo.display().to_string(),
            "./m2repo".to_string(),
        ];
        let url = Url::from_directory_path(std::fs::canonicalize(&repo).unwrap()).unwrap();
        assert_eq!(
            resolver.resolve_all(&entries),
            vec![url.to_string(), "https://maven.google.com".to_string()]
        );
    }
}
