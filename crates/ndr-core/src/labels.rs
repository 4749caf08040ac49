//! Ownership labels: which files and directories in the project belong to the
//! resolver. Stored as project-relative paths in `.ndr/labels.json`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::ResolveError;
use crate::layout::ProjectLayout;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedLabels {
    labeled: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct LabelLedger {
    layout: ProjectLayout,
    labeled: BTreeSet<String>,
}

impl LabelLedger {
    pub fn new(layout: &ProjectLayout) -> Self {
        Self {
            layout: layout.clone(),
            labeled: BTreeSet::new(),
        }
    }

    /// Load the ledger; a missing file is an empty ledger.
    pub fn load(layout: &ProjectLayout) -> Result<Self> {
        let path = layout.labels_path();
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new(layout)),
            Err(e) => return Err(e).with_context(|| format!("read labels: {}", path.display())),
        };
        let persisted: PersistedLabels = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse labels: {}", path.display()))?;
        Ok(Self {
            layout: layout.clone(),
            labeled: persisted.labeled,
        })
    }

    pub fn save(&self) -> Result<()> {
        let path = self.layout.labels_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let persisted = PersistedLabels {
            labeled: self.labeled.clone(),
        };
        let json = serde_json::to_string_pretty(&persisted).context("serialize labels")?;
        std::fs::write(&path, json).with_context(|| format!("write labels: {}", path.display()))?;
        Ok(())
    }

    pub fn label(&mut self, path: &Path) -> bool {
        self.labeled.insert(self.layout.relative(path))
    }

    pub fn unlabel(&mut self, path: &Path) -> bool {
        self.labeled.remove(&self.layout.relative(path))
    }

    pub fn is_labeled(&self, path: &Path) -> bool {
        self.labeled.contains(&self.layout.relative(path))
    }

    /// Absolute paths of every labeled entry, existing or not.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.labeled.iter().map(|p| self.layout.absolute(p)).collect()
    }

    /// Labeled paths that are still on disk.
    pub fn existing_paths(&self) -> Vec<PathBuf> {
        self.paths().into_iter().filter(|p| p.exists()).collect()
    }

    pub fn len(&self) -> usize {
        self.labeled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labeled.is_empty()
    }

    /// Delete every labeled path. Deleted entries lose their label; failed
    /// ones keep it so a later pass can retry.
    pub fn delete_all(&mut self) -> DeletionReport {
        let report = delete_paths(&self.paths());
        for path in &report.deleted {
            self.unlabel(path);
        }
        report
    }

    /// Delete labeled paths for which `keep` returns false.
    pub fn delete_where<F>(&mut self, keep: F) -> DeletionReport
    where
        F: Fn(&Path) -> bool,
    {
        let stale: Vec<PathBuf> = self.paths().into_iter().filter(|p| !keep(p)).collect();
        let report = delete_paths(&stale);
        for path in &report.deleted {
            self.unlabel(path);
        }
        report
    }
}

/// Result of a deletion batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    pub deleted: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, String)>,
}

impl DeletionReport {
    pub fn merge(&mut self, other: DeletionReport) {
        self.deleted.extend(other.deleted);
        self.failures.extend(other.failures);
    }

    /// One aggregate error for the whole batch, logged once.
    pub fn into_error(self) -> Option<ResolveError> {
        if self.failures.is_empty() {
            return None;
        }
        let failures: Vec<String> = self
            .failures
            .iter()
            .map(|(p, e)| format!("{}: {e}", p.display()))
            .collect();
        let err = ResolveError::Cleanup { failures };
        tracing::error!("{err}");
        Some(err)
    }
}

/// Remove files and directories. Paths already gone count as deleted.
pub fn delete_paths(paths: &[PathBuf]) -> DeletionReport {
    let mut report = DeletionReport::default();
    for path in paths {
        let result = match std::fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
            Ok(_) => std::fs::remove_file(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                tracing::debug!("deleted {}", path.display());
                report.deleted.push(path.clone());
            }
            Err(e) => report.failures.push((path.clone(), e.to_string())),
        }
    }
    report
}
