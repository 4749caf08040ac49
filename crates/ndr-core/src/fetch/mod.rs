//! Artifact fetching through the external build tool.
//!
//! One invocation copies every requested library into the destination
//! directory. The tool's stdout report is authoritative: exit 0 only means
//! the report can be trusted, not that everything was found.

pub mod repos;
pub mod report;

pub use repos::{ordered_repositories, RepoPathResolver};
pub use report::{parse_fetch_report, FetchReport};

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dependency::{Dependency, REPORT_PROVENANCE};
use crate::error::ResolveError;
use crate::tool::{CommandRunner, ToolCommand};

/// Gradle task that copies the requested packages.
pub const COPY_TASK: &str = "copyPackages";

/// A copied file and the dependency it most likely satisfies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub path: PathBuf,
    pub dependency: Option<Dependency>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    pub copied: Vec<ResolvedArtifact>,
    pub missing: Vec<Dependency>,
    /// Dependencies the compatibility rewrite touched.
    pub modified: Vec<Dependency>,
}

impl FetchResult {
    pub fn copied_paths(&self) -> Vec<PathBuf> {
        self.copied.iter().map(|a| a.path.clone()).collect()
    }
}

pub struct ArtifactFetcher {
    runner: Arc<dyn CommandRunner>,
    build_tool: PathBuf,
    script: Option<PathBuf>,
    global_repositories: Vec<String>,
    resolver: RepoPathResolver,
}

impl ArtifactFetcher {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        build_tool: &Path,
        global_repositories: Vec<String>,
        resolver: RepoPathResolver,
    ) -> Self {
        Self {
            runner,
            build_tool: build_tool.to_path_buf(),
            script: None,
            global_repositories,
            resolver,
        }
    }

    pub fn with_script(mut self, script: Option<PathBuf>) -> Self {
        self.script = script;
        self
    }

    /// The build-tool command for one fetch pass.
    pub fn command(
        &self,
        dependencies: &[Dependency],
        destination: &Path,
        jetifier: bool,
    ) -> ToolCommand {
        let repos = self
            .resolver
            .resolve_all(&ordered_repositories(&self.global_repositories, dependencies));
        let mut seen = HashSet::new();
        let specs: Vec<String> = dependencies
            .iter()
            .map(Dependency::fetch_spec)
            .filter(|s| seen.insert(s.clone()))
            .collect();

        let mut cmd = ToolCommand::new(&self.build_tool);
        if let Some(script) = &self.script {
            cmd = cmd.arg("-b").arg(script.display().to_string());
        }
        cmd.arg("--no-daemon")
            .arg(format!("-PTARGET_DIR={}", destination.display()))
            .arg(format!("-PMAVEN_REPOS={}", repos.join(";")))
            .arg(format!("-PPACKAGES_TO_COPY={}", specs.join(";")))
            .arg(format!("-PUSE_JETIFIER={}", if jetifier { 1 } else { 0 }))
            .arg(COPY_TASK)
    }

    pub async fn fetch(
        &self,
        dependencies: &[Dependency],
        destination: &Path,
        jetifier: bool,
    ) -> Result<FetchResult, ResolveError> {
        if dependencies.is_empty() {
            return Ok(FetchResult::default());
        }
        tokio::fs::create_dir_all(destination).await.map_err(|e| {
            ResolveError::Environment(format!(
                "cannot create {}: {e}",
                destination.display()
            ))
        })?;

        let command = self.command(dependencies, destination, jetifier);
        tracing::info!("fetching {} dependencies: {command}", dependencies.len());
        let output = self
            .runner
            .run(&command, None)
            .await
            .map_err(|e| ResolveError::ToolInvocation {
                command: command.to_string(),
                detail: e.to_string(),
            })?;
        if !output.success() {
            return Err(ResolveError::ToolInvocation {
                command: command.to_string(),
                detail: output.failure_summary(),
            });
        }

        let report = parse_fetch_report(&output.stdout, destination);
        let mut copied = Vec::with_capacity(report.copied.len());
        for path in report.copied {
            let path = normalize_source_archive(path).await;
            let dependency = match_dependency(&path, dependencies);
            copied.push(ResolvedArtifact { path, dependency });
        }
        Ok(FetchResult {
            copied,
            missing: map_specs(&report.missing, dependencies),
            modified: map_specs(&report.modified, dependencies),
        })
    }
}

/// `.srcaar` files are plain archives under another name; give them the
/// extension the build expects.
async fn normalize_source_archive(path: PathBuf) -> PathBuf {
    if path.extension().and_then(|e| e.to_str()) != Some("srcaar") {
        return path;
    }
    let target = path.with_extension("aar");
    match tokio::fs::rename(&path, &target).await {
        Ok(()) => target,
        Err(e) => {
            tracing::warn!("failed to rename {} to .aar: {e}", path.display());
            path
        }
    }
}

/// Copied files are named `group.artifact-version.ext`.
fn match_dependency(path: &Path, dependencies: &[Dependency]) -> Option<Dependency> {
    let name = path.file_name()?.to_str()?;
    dependencies
        .iter()
        .filter(|d| name.starts_with(&format!("{}.{}-", d.group, d.artifact)))
        .max_by_key(|d| d.group.len() + d.artifact.len())
        .cloned()
}

/// Map reported specs back to the requested dependencies, synthesizing one
/// when the tool reports a spec that was never requested verbatim.
fn map_specs(specs: &[String], dependencies: &[Dependency]) -> Vec<Dependency> {
    let mut by_spec: HashMap<String, &Dependency> = HashMap::new();
    for dep in dependencies {
        by_spec.entry(dep.fetch_spec()).or_insert(dep);
        by_spec.entry(dep.key()).or_insert(dep);
    }
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for spec in specs {
        let dep = match by_spec.get(spec.as_str()) {
            Some(dep) => (*dep).clone(),
            None => match Dependency::from_spec(spec, REPORT_PROVENANCE) {
                Some(dep) => dep,
                None => {
                    tracing::warn!("dropping unparseable artifact spec '{spec}'");
                    continue;
                }
            },
        };
        if seen.insert(dep.key()) {
            out.push(dep);
        }
    }
    out
}
