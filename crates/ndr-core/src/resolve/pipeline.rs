//! The resolution pipeline: fetch, install platform packages, Jetifier retry,
//! label, post-process, resolve conflicts, clean up, snapshot.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::ResolutionOutcome;
use crate::config::{NdrConfig, ResolutionSettings};
use crate::conflict::{
    find_conflicts, resolve_conflicts, scan_project_archives, Conflict, ConflictResolution,
};
use crate::declarations::DependencySource;
use crate::dependency::Dependency;
use crate::error::ResolveError;
use crate::fetch::{ArtifactFetcher, FetchResult, RepoPathResolver};
use crate::jetifier::{self, JetifierDecision};
use crate::labels::{DeletionReport, LabelLedger};
use crate::layout::ProjectLayout;
use crate::process::{ArchiveTool, ArtifactProcessor, JarTool, ProcessOutcome};
use crate::prompt::Prompter;
use crate::scheduler::ResolutionPass;
use crate::sdk::{self, locate_sdk_root, PackageNameVersion};
use crate::state::ResolutionState;
use crate::tool::CommandRunner;

pub struct Resolver {
    layout: ProjectLayout,
    sdk_root: Option<PathBuf>,
    settings: Mutex<ResolutionSettings>,
    source: Arc<dyn DependencySource>,
    runner: Arc<dyn CommandRunner>,
    prompter: Arc<dyn Prompter>,
    fetcher: ArtifactFetcher,
    archive_tool: Arc<dyn ArchiveTool>,
}

impl Resolver {
    pub fn new(
        config: &NdrConfig,
        layout: ProjectLayout,
        runner: Arc<dyn CommandRunner>,
        prompter: Arc<dyn Prompter>,
        source: Arc<dyn DependencySource>,
    ) -> Self {
        let fetcher = ArtifactFetcher::new(
            runner.clone(),
            &config.build_tool,
            config.global_repositories.clone(),
            RepoPathResolver::new(layout.repository_roots()),
        )
        .with_script(config.fetch_script.clone());
        let archive_tool = Arc::new(JarTool::new(runner.clone(), &config.archive_tool));
        Self {
            layout,
            sdk_root: config.sdk_root(),
            settings: Mutex::new(config.resolution.clone()),
            source,
            runner,
            prompter,
            fetcher,
            archive_tool,
        }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    fn lock_settings(&self) -> MutexGuard<'_, ResolutionSettings> {
        self.settings.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Current settings, including changes made during earlier passes.
    pub fn settings(&self) -> ResolutionSettings {
        self.lock_settings().clone()
    }

    fn snapshot(
        &self,
        requested: &[Dependency],
        ledger: &LabelLedger,
        settings: &ResolutionSettings,
    ) -> ResolutionState {
        ResolutionState::new(
            requested.iter().map(Dependency::key),
            ledger.existing_paths().iter().map(|p| self.layout.relative(p)),
            settings.as_map(),
        )
    }

    /// Run one full pass. Never fails; every failure ends up in the outcome.
    pub async fn resolve(&self, force: bool) -> ResolutionOutcome {
        let mut settings = self.settings();
        let dependencies = self.source.dependencies();

        let sdk_root = match locate_sdk_root(self.sdk_root.as_deref()) {
            Ok(root) => root,
            Err(e) => {
                let err = ResolveError::Environment(e.to_string());
                tracing::error!("{err}");
                return ResolutionOutcome::failed(err, dependencies);
            }
        };
        let mut ledger = match LabelLedger::load(&self.layout) {
            Ok(ledger) => ledger,
            Err(e) => {
                let err = ResolveError::Environment(format!("{e:#}"));
                tracing::error!("{err}");
                return ResolutionOutcome::failed(err, dependencies);
            }
        };

        let state_path = self.layout.state_path();
        let previous = ResolutionState::load(&state_path).unwrap_or_else(|e| {
            tracing::warn!("ignoring unreadable resolution state: {e:#}");
            None
        });
        if !force && previous.as_ref() == Some(&self.snapshot(&dependencies, &ledger, &settings)) {
            tracing::info!("dependencies unchanged since last resolution, nothing to do");
            return ResolutionOutcome::up_to_date();
        }

        let destination = self.layout.destination();
        let mut settings_changed = false;
        let mut cleanup = Cleanup::default();
        let mut retried = false;
        let mut install_error = None;
        let fetched = loop {
            let result = match self
                .fetch_with_packages(&dependencies, &destination, settings.jetifier, &sdk_root)
                .await
            {
                Ok((result, err)) => {
                    install_error = err;
                    result
                }
                Err(err) => {
                    tracing::error!("{err}");
                    log_missing(&dependencies);
                    return ResolutionOutcome::failed(err, dependencies);
                }
            };
            for artifact in &result.copied {
                ledger.label(&artifact.path);
            }

            match jetifier::decide(&result.copied_paths(), settings.jetifier, retried) {
                JetifierDecision::NotNeeded => break result,
                JetifierDecision::AlreadyRetried => {
                    tracing::warn!("legacy support libraries remain after enabling Jetifier");
                    break result;
                }
                JetifierDecision::Prompt(legacy) => {
                    if self.prompter.confirm(&jetifier::question(&legacy)) {
                        tracing::info!("enabling Jetifier and fetching again");
                        settings.jetifier = true;
                        self.lock_settings().jetifier = true;
                        settings_changed = true;
                        retried = true;
                        // The retry copies the same names back, so only failures are kept.
                        cleanup.absorb(ledger.delete_all().into_error());
                        continue;
                    }
                    tracing::warn!("Jetifier declined; removing fetched libraries");
                    cleanup.record(ledger.delete_all());
                    save_ledger(&ledger);
                    log_missing(&dependencies);
                    let (deleted, cleanup_error) = cleanup.finish();
                    return ResolutionOutcome {
                        success: false,
                        missing: dependencies,
                        deleted,
                        cleanup_error,
                        ..ResolutionOutcome::default()
                    };
                }
            }
        };

        let copied = self.process_artifacts(&fetched, &settings, &mut ledger).await;
        let resolution = self.resolve_conflicts(&ledger);
        cleanup.deleted.extend(resolution.deleted);
        cleanup.absorb(resolution.error);
        let conflicts = resolution.remaining;

        let current: HashSet<PathBuf> = copied.iter().cloned().collect();
        cleanup.record(ledger.delete_where(|p| current.contains(p)));
        save_ledger(&ledger);

        let missing_keys: BTreeSet<String> = fetched.missing.iter().map(Dependency::key).collect();
        let resolved: Vec<Dependency> = dependencies
            .iter()
            .filter(|d| !missing_keys.contains(&d.key()))
            .cloned()
            .collect();
        if let Err(e) = self.snapshot(&resolved, &ledger, &settings).save(&state_path) {
            tracing::warn!("failed to save resolution state: {e:#}");
        }

        let success = fetched.missing.is_empty();
        if !success {
            log_missing(&fetched.missing);
        }
        tracing::info!(
            "resolution finished: {} copied, {} missing, {} conflicts",
            copied.len(),
            fetched.missing.len(),
            conflicts.len()
        );
        let (deleted, cleanup_error) = cleanup.finish();
        ResolutionOutcome {
            success,
            up_to_date: false,
            copied,
            missing: fetched.missing,
            modified: fetched.modified,
            conflicts,
            settings_changed,
            error: if success { None } else { install_error },
            deleted,
            cleanup_error,
        }
    }

    /// Fetch; if missing dependencies need platform packages, install them
    /// and fetch again. Install failures do not fail the pass.
    async fn fetch_with_packages(
        &self,
        dependencies: &[Dependency],
        destination: &Path,
        jetifier: bool,
        sdk_root: &Path,
    ) -> Result<(FetchResult, Option<ResolveError>), ResolveError> {
        let result = self.fetcher.fetch(dependencies, destination, jetifier).await?;

        let mut packages: Vec<PackageNameVersion> = Vec::new();
        for dep in &result.missing {
            for name in &dep.platform_packages {
                let package = PackageNameVersion::parse_any(name);
                if !packages.contains(&package) {
                    packages.push(package);
                }
            }
        }
        if packages.is_empty() {
            return Ok((result, None));
        }

        match self.install_packages(&packages, sdk_root).await {
            Ok(true) => {
                tracing::info!("platform packages installed, fetching again");
                let refetched = self.fetcher.fetch(dependencies, destination, jetifier).await?;
                Ok((refetched, None))
            }
            Ok(false) => Ok((result, None)),
            Err(failed) => {
                let dependents = result
                    .missing
                    .iter()
                    .filter(|d| {
                        d.platform_packages
                            .iter()
                            .any(|p| failed.contains(&PackageNameVersion::parse_any(p).name))
                    })
                    .map(Dependency::key)
                    .collect();
                let err = ResolveError::Install {
                    packages: failed,
                    dependents,
                };
                tracing::error!("{err}");
                Ok((result, Some(err)))
            }
        }
    }

    /// True if something was installed; the failed package names otherwise.
    async fn install_packages(
        &self,
        packages: &[PackageNameVersion],
        sdk_root: &Path,
    ) -> Result<bool, Vec<String>> {
        let names = || packages.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
        let manager = match sdk::discover(self.runner.clone(), sdk_root).await {
            Ok(manager) => manager,
            Err(e) => {
                tracing::error!("cannot install platform packages: {e}");
                return Err(names());
            }
        };
        match sdk::ensure_installed(manager.as_ref(), packages, self.prompter.as_ref()).await {
            Ok(installed) => Ok(!installed.is_empty()),
            Err(e) => {
                tracing::error!("{e}");
                Err(names())
            }
        }
    }

    /// Post-process every copied archive, one at a time, relabeling the
    /// results. Returns the final output paths.
    async fn process_artifacts(
        &self,
        fetched: &FetchResult,
        settings: &ResolutionSettings,
        ledger: &mut LabelLedger,
    ) -> Vec<PathBuf> {
        let processor = ArtifactProcessor::new(self.archive_tool.clone(), settings);
        let mut outputs = Vec::with_capacity(fetched.copied.len());
        for artifact in &fetched.copied {
            tokio::task::yield_now().await;
            let path = &artifact.path;
            match processor.process(path).await {
                Ok(ProcessOutcome::Exploded(dir)) => {
                    ledger.unlabel(path);
                    ledger.label(&dir);
                    outputs.push(dir);
                }
                Ok(ProcessOutcome::Repacked(repacked)) => {
                    ledger.label(&repacked);
                    outputs.push(repacked);
                }
                Ok(ProcessOutcome::Unchanged) => outputs.push(path.clone()),
                Err(e) => {
                    tracing::warn!("failed to process {}: {e:#}", path.display());
                    outputs.push(path.clone());
                }
            }
        }
        outputs
    }

    fn resolve_conflicts(&self, ledger: &LabelLedger) -> ConflictResolution {
        let archives = scan_project_archives(&self.layout, ledger);
        let conflicts = find_conflicts(&archives);
        if conflicts.is_empty() {
            return ConflictResolution::default();
        }
        resolve_conflicts(conflicts, self.prompter.as_ref())
    }

    /// Conflicts currently in the project, without touching anything.
    pub fn find_conflicts(&self) -> anyhow::Result<Vec<Conflict>> {
        let ledger = LabelLedger::load(&self.layout)?;
        Ok(find_conflicts(&scan_project_archives(&self.layout, &ledger)))
    }

    /// Delete every resolver-owned artifact and forget the last resolution.
    pub fn clean(&self) -> anyhow::Result<DeletionReport> {
        let mut ledger = LabelLedger::load(&self.layout)?;
        let report = ledger.delete_all();
        ledger.save()?;
        ResolutionState::remove(&self.layout.state_path())?;
        Ok(report)
    }
}

#[async_trait]
impl ResolutionPass for Resolver {
    async fn resolve(&self, force: bool) -> ResolutionOutcome {
        Resolver::resolve(self, force).await
    }
}

fn log_missing(missing: &[Dependency]) {
    if missing.is_empty() {
        return;
    }
    let lines: Vec<String> = missing
        .iter()
        .map(|d| {
            if d.provenance.is_empty() {
                format!("  {}", d.key())
            } else {
                format!("  {} (declared in {})", d.key(), d.provenance)
            }
        })
        .collect();
    tracing::error!("unable to resolve:\n{}", lines.join("\n"));
}

/// Deletions made during one pass, and the paths that could not be removed.
#[derive(Debug, Default)]
struct Cleanup {
    deleted: Vec<PathBuf>,
    failures: Vec<String>,
}

impl Cleanup {
    fn record(&mut self, mut report: DeletionReport) {
        self.deleted.append(&mut report.deleted);
        self.absorb(report.into_error());
    }

    /// Batch errors are logged where they are built; this only collects them.
    fn absorb(&mut self, error: Option<ResolveError>) {
        if let Some(ResolveError::Cleanup { failures }) = error {
            self.failures.extend(failures);
        }
    }

    fn finish(self) -> (Vec<PathBuf>, Option<ResolveError>) {
        let error = (!self.failures.is_empty()).then(|| ResolveError::Cleanup {
            failures: self.failures,
        });
        (self.deleted, error)
    }
}

fn save_ledger(ledger: &LabelLedger) {
    if let Err(e) = ledger.save() {
        tracing::warn!("failed to save labels: {e:#}");
    }
}
