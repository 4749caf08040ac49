//! Dependency declarations: `*Dependencies.toml` files under `Assets/`.
//!
//! ```toml
//! repositories = ["https://maven.google.com"]
//!
//! [[dependency]]
//! group = "com.google.android.gms"
//! artifact = "play-services-base"
//! version = "15.0.1"
//! platform_packages = ["extras;google;m2repository"]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
#[cfg(any(test, feature = "test-util"))]
use std::sync::RwLock;
use walkdir::WalkDir;

use crate::dependency::{Dependency, LATEST};
use crate::layout::ProjectLayout;

pub const DECLARATION_SUFFIX: &str = "Dependencies.toml";

#[derive(Debug, Deserialize)]
struct DeclarationFile {
    #[serde(default)]
    repositories: Vec<String>,
    #[serde(default, rename = "dependency")]
    dependencies: Vec<DeclaredDependency>,
}

#[derive(Debug, Deserialize)]
struct DeclaredDependency {
    group: String,
    artifact: String,
    #[serde(default = "latest")]
    version: String,
    #[serde(default)]
    classifier: Option<String>,
    #[serde(default)]
    repositories: Vec<String>,
    #[serde(default)]
    platform_packages: Vec<String>,
}

fn latest() -> String {
    LATEST.to_string()
}

/// Parse one declaration file. File-level repositories follow each
/// dependency's own.
pub fn parse_declarations(text: &str, provenance: &str) -> Result<Vec<Dependency>> {
    let file: DeclarationFile = toml::from_str(text).context("parse declarations")?;
    Ok(file
        .dependencies
        .into_iter()
        .map(|d| {
            let mut repositories = d.repositories;
            for repo in &file.repositories {
                if !repositories.contains(repo) {
                    repositories.push(repo.clone());
                }
            }
            let mut dep = Dependency::new(&d.group, &d.artifact, &d.version)
                .with_repositories(repositories)
                .with_platform_packages(d.platform_packages)
                .with_provenance(provenance);
            if let Some(classifier) = d.classifier.filter(|c| !c.is_empty()) {
                dep = dep.with_classifier(&classifier);
            }
            dep
        })
        .collect())
}

/// Declaration files under `root`, sorted by path.
pub fn discover_declaration_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(DECLARATION_SUFFIX))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Supplies the current dependency set to a resolution pass.
pub trait DependencySource: Send + Sync {
    fn dependencies(&self) -> Vec<Dependency>;
}

/// Reads declarations from the project on every call.
#[derive(Debug, Clone)]
pub struct DeclarationRegistry {
    layout: ProjectLayout,
}

impl DeclarationRegistry {
    pub fn new(layout: &ProjectLayout) -> Self {
        Self {
            layout: layout.clone(),
        }
    }
}

impl DependencySource for DeclarationRegistry {
    fn dependencies(&self) -> Vec<Dependency> {
        let mut all = Vec::new();
        for path in discover_declaration_files(&self.layout.assets_dir()) {
            let provenance = self.layout.relative(&path);
            let parsed = std::fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))
                .and_then(|text| parse_declarations(&text, &provenance));
            match parsed {
                Ok(deps) => all.extend(deps),
                Err(e) => tracing::warn!("skipping {}: {e:#}", path.display()),
            }
        }
        all
    }
}

/// A fixed, replaceable dependency set.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct StaticDependencies {
    dependencies: RwLock<Vec<Dependency>>,
}

#[cfg(any(test, feature = "test-util"))]
impl StaticDependencies {
    pub fn new(dependencies: Vec<Dependency>) -> Self {
        Self {
            dependencies: RwLock::new(dependencies),
        }
    }

    pub fn set(&self, dependencies: Vec<Dependency>) {
        match self.dependencies.write() {
            Ok(mut d) => *d = dependencies,
            Err(p) => *p.into_inner() = dependencies,
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl DependencySource for StaticDependencies {
    fn dependencies(&self) -> Vec<Dependency> {
        match self.dependencies.read() {
            Ok(d) => d.clone(),
            Err(p) => p.into_inner().clone(),
        }
    }
}
