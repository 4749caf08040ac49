//! Post-processing of fetched library archives.
//!
//! An `.aar` is unpacked to a scratch directory and inspected. If the build
//! cannot consume it as-is, placeholders are substituted, unselected ABIs are
//! removed, and the result is either exploded into a library directory or
//! repacked in place.

pub mod abi;
pub mod archive;
pub mod decide;
pub mod manifest;

pub use archive::{ArchiveTool, JarTool, EMPTY_JAR};
pub use decide::{process_reasons, should_process, ProcessReason, ToolchainCapabilities, CLASSES_JAR};
pub use manifest::{Substitution, APPLICATION_ID_PLACEHOLDER};

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::config::ResolutionSettings;

/// Marker that makes an exploded directory a library project.
pub const PROJECT_PROPERTIES: &str = "project.properties";
const PROJECT_PROPERTIES_CONTENT: &str = "target=android-9\nandroid.library=true\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Unchanged,
    /// Rewritten in place; same path.
    Repacked(PathBuf),
    /// Replaced by a library directory; the archive is gone.
    Exploded(PathBuf),
}

pub struct ArtifactProcessor {
    tool: Arc<dyn ArchiveTool>,
    explode_enabled: bool,
    capabilities: ToolchainCapabilities,
    selected_abis: BTreeSet<String>,
    substitutions: Vec<Substitution>,
}

impl ArtifactProcessor {
    pub fn new(tool: Arc<dyn ArchiveTool>, settings: &ResolutionSettings) -> Self {
        Self {
            tool,
            explode_enabled: settings.explode_archives,
            capabilities: settings.capabilities(),
            selected_abis: settings.selected_abi_set(),
            substitutions: settings.substitutions(),
        }
    }

    pub async fn process(&self, archive: &Path) -> Result<ProcessOutcome> {
        if !self.explode_enabled || archive.extension().and_then(|e| e.to_str()) != Some("aar") {
            return Ok(ProcessOutcome::Unchanged);
        }
        let scratch = tempfile::tempdir().context("create scratch dir")?;
        let unpacked = scratch.path();
        self.tool.extract(archive, unpacked).await?;

        let reasons = process_reasons(unpacked, self.capabilities, &self.selected_abis);
        if reasons.is_empty() {
            return Ok(ProcessOutcome::Unchanged);
        }
        tracing::debug!("processing {}: {reasons:?}", archive.display());

        self.rewrite_manifest(unpacked)?;
        let removed = abi::strip_unselected(unpacked, &self.selected_abis)?;
        if !removed.is_empty() {
            tracing::debug!("removed ABIs {removed:?} from {}", archive.display());
        }
        let classes = unpacked.join(CLASSES_JAR);
        if !classes.exists() {
            std::fs::write(&classes, EMPTY_JAR)
                .with_context(|| format!("write {}", classes.display()))?;
        }

        if self.capabilities.supports_packed_libraries {
            self.repack(archive, unpacked).await?;
            Ok(ProcessOutcome::Repacked(archive.to_path_buf()))
        } else {
            let dir = explode(archive, unpacked)?;
            Ok(ProcessOutcome::Exploded(dir))
        }
    }

    fn rewrite_manifest(&self, unpacked: &Path) -> Result<()> {
        let path = unpacked.join(manifest::MANIFEST_FILE);
        if !path.is_file() {
            return Ok(());
        }
        let xml = std::fs::read_to_string(&path)
            .with_context(|| format!("read {}", path.display()))?;
        if let Some(rewritten) = manifest::substitute_manifest(&xml, &self.substitutions)
            .with_context(|| format!("rewrite {}", path.display()))?
        {
            std::fs::write(&path, rewritten)
                .with_context(|| format!("write {}", path.display()))?;
        }
        if manifest::has_unresolved_application_id(&std::fs::read_to_string(&path)?) {
            tracing::warn!(
                "{} still references {APPLICATION_ID_PLACEHOLDER}; set resolution.application_id",
                path.display()
            );
        }
        Ok(())
    }

    async fn repack(&self, archive: &Path, unpacked: &Path) -> Result<()> {
        let staged = archive.with_extension("aar.tmp");
        self.tool.create(&staged, unpacked).await?;
        std::fs::rename(&staged, archive)
            .with_context(|| format!("replace {}", archive.display()))?;
        Ok(())
    }
}

/// Where an unpacked entry lands in the exploded layout: native code and the
/// code jar move under `libs/`.
fn exploded_location(relative: &Path) -> PathBuf {
    if relative == Path::new(CLASSES_JAR) {
        return Path::new("libs").join(CLASSES_JAR);
    }
    match relative.strip_prefix("jni") {
        Ok(rest) => Path::new("libs").join(rest),
        Err(_) => relative.to_path_buf(),
    }
}

/// Copy the unpacked tree into a directory named after the archive and
/// remove the archive.
fn explode(archive: &Path, unpacked: &Path) -> Result<PathBuf> {
    let stem = archive
        .file_stem()
        .with_context(|| format!("no file name in {}", archive.display()))?;
    let parent = archive.parent().unwrap_or_else(|| Path::new("."));
    let target = parent.join(stem);
    if target.exists() {
        std::fs::remove_dir_all(&target)
            .with_context(|| format!("remove {}", target.display()))?;
    }
    std::fs::create_dir_all(&target).with_context(|| format!("create {}", target.display()))?;

    for entry in WalkDir::new(unpacked).min_depth(1) {
        let entry = entry.context("walk unpacked archive")?;
        let relative = entry.path().strip_prefix(unpacked)?;
        let dest = target.join(exploded_location(relative));
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else {
            if let Some(dir) = dest.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::copy(entry.path(), &dest)
                .with_context(|| format!("copy to {}", dest.display()))?;
        }
    }
    std::fs::write(target.join(PROJECT_PROPERTIES), PROJECT_PROPERTIES_CONTENT)?;
    std::fs::remove_file(archive).with_context(|| format!("remove {}", archive.display()))?;
    Ok(target)
}
