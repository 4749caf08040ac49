//! Conflicts between resolver-managed artifacts and archives that were added
//! to the project by hand.
//!
//! Two archives conflict when they share a base name (file name minus version
//! and extension). A conflict is auto-resolvable when every unmanaged copy is
//! no newer than the managed one; the unmanaged copies can then be deleted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ResolveError;
use crate::labels::{delete_paths, DeletionReport, LabelLedger};
use crate::layout::ProjectLayout;
use crate::prompt::{Prompter, Question};
use crate::version::compare_versions;

pub const ARCHIVE_EXTENSIONS: [&str; 3] = ["aar", "jar", "srcaar"];

/// Managed artifacts with this prefix come from the split Play services
/// libraries, which cannot coexist with the monolithic jar below.
pub const LEGACY_MONOLITHIC_PREFIX: &str = "com.google.android.gms.play-services-";
pub const LEGACY_FLAT_JAR: &str = "google-play-services.jar";

pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ARCHIVE_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Split `name-1.2.3.aar` into `("name", "1.2.3")`. The version starts at the
/// first `-` followed by a digit; names without one have an empty version.
pub fn split_versioned_name(file_name: &str) -> (String, String) {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, ext)) if ARCHIVE_EXTENSIONS.contains(&ext) => stem,
        _ => file_name,
    };
    let bytes = stem.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'-' && bytes.get(i + 1).map(u8::is_ascii_digit).unwrap_or(false) {
            return (stem[..i].to_string(), stem[i + 1..].to_string());
        }
    }
    (stem.to_string(), String::new())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Every unmanaged copy is older or equal: safe to delete them.
    AutoResolvable,
    /// An unmanaged copy is newer than the managed artifact.
    ManagedOlder,
    /// Split Play services libraries alongside the monolithic jar.
    LegacyMonolithic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub base_name: String,
    pub managed: PathBuf,
    pub managed_version: String,
    pub unmanaged: Vec<PathBuf>,
}

impl Conflict {
    pub fn describe(&self) -> String {
        let unmanaged: Vec<String> = self.unmanaged.iter().map(|p| p.display().to_string()).collect();
        match self.kind {
            ConflictKind::AutoResolvable => format!(
                "{} {} conflicts with older copies: {}",
                self.base_name,
                self.managed_version,
                unmanaged.join(", ")
            ),
            ConflictKind::ManagedOlder => format!(
                "{} {} is older than unmanaged copies {}; the build will likely fail",
                self.base_name,
                self.managed_version,
                unmanaged.join(", ")
            ),
            ConflictKind::LegacyMonolithic => format!(
                "{} cannot be used together with {}; remove the monolithic jar",
                self.managed.display(),
                unmanaged.join(", ")
            ),
        }
    }
}

/// Managed paths (files and exploded directories) and unmanaged archives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectArchives {
    pub managed: Vec<PathBuf>,
    pub unmanaged: Vec<PathBuf>,
}

/// Split the archives under `Assets/` into managed and unmanaged. Anything
/// inside a labeled directory counts as managed.
pub fn scan_project_archives(layout: &ProjectLayout, ledger: &LabelLedger) -> ProjectArchives {
    let managed = ledger.existing_paths();
    let managed_dirs: Vec<&PathBuf> = managed.iter().filter(|p| p.is_dir()).collect();
    let mut unmanaged = Vec::new();

    let walker = WalkDir::new(layout.assets_dir())
        .into_iter()
        .filter_entry(|e| !managed_dirs.iter().any(|d| e.path() == d.as_path()));
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("skipping unreadable path while scanning archives: {e}");
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_file() && is_archive(path) && !ledger.is_labeled(path) {
            unmanaged.push(path.to_path_buf());
        }
    }
    unmanaged.sort();
    ProjectArchives { managed, unmanaged }
}

pub fn find_conflicts(archives: &ProjectArchives) -> Vec<Conflict> {
    let mut unmanaged_by_base: BTreeMap<String, Vec<(PathBuf, String)>> = BTreeMap::new();
    for path in &archives.unmanaged {
        let (base, version) = split_versioned_name(&file_name(path));
        unmanaged_by_base.entry(base).or_default().push((path.clone(), version));
    }

    let mut conflicts = Vec::new();
    for managed in &archives.managed {
        let (base, managed_version) = split_versioned_name(&file_name(managed));
        let Some(copies) = unmanaged_by_base.get(&base) else {
            continue;
        };
        let newer = copies
            .iter()
            .any(|(_, v)| compare_versions(v, &managed_version).is_gt());
        conflicts.push(Conflict {
            kind: if newer {
                ConflictKind::ManagedOlder
            } else {
                ConflictKind::AutoResolvable
            },
            base_name: base,
            managed: managed.clone(),
            managed_version,
            unmanaged: copies.iter().map(|(p, _)| p.clone()).collect(),
        });
    }

    let flat_jars: Vec<PathBuf> = archives
        .unmanaged
        .iter()
        .filter(|p| file_name(p) == LEGACY_FLAT_JAR)
        .cloned()
        .collect();
    if !flat_jars.is_empty() {
        if let Some(split) = archives
            .managed
            .iter()
            .find(|p| file_name(p).starts_with(LEGACY_MONOLITHIC_PREFIX))
        {
            conflicts.push(Conflict {
                kind: ConflictKind::LegacyMonolithic,
                base_name: LEGACY_FLAT_JAR.to_string(),
                managed: split.clone(),
                managed_version: String::new(),
                unmanaged: flat_jars,
            });
        }
    }
    conflicts
}

#[derive(Debug, Default)]
pub struct ConflictResolution {
    pub deleted: Vec<PathBuf>,
    /// Conflicts left in place (not auto-resolvable, or declined).
    pub remaining: Vec<Conflict>,
    pub error: Option<ResolveError>,
}

/// Offer each auto-resolvable conflict to the user, one prompt per managed
/// artifact; report the rest. Deletion failures are aggregated.
pub fn resolve_conflicts(conflicts: Vec<Conflict>, prompter: &dyn Prompter) -> ConflictResolution {
    let mut resolution = ConflictResolution::default();
    let mut batch = DeletionReport::default();

    for conflict in conflicts {
        if conflict.kind != ConflictKind::AutoResolvable {
            tracing::warn!("{}", conflict.describe());
            resolution.remaining.push(conflict);
            continue;
        }
        let question = Question::new(
            "Remove conflicting libraries?",
            &format!(
                "{}\nDelete the unmanaged copies and keep {}?",
                conflict.describe(),
                file_name(&conflict.managed)
            ),
        )
        .with_choices("Delete", "Keep");
        if prompter.confirm(&question) {
            batch.merge(delete_paths(&conflict.unmanaged));
        } else {
            tracing::warn!("{}", conflict.describe());
            resolution.remaining.push(conflict);
        }
    }

    resolution.deleted = std::mem::take(&mut batch.deleted);
    resolution.error = batch.into_error();
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::AutoPrompter;

    fn archives(managed: &[&str], unmanaged: &[&str]) -> ProjectArchives {
        ProjectArchives {
            managed: managed.iter().map(|m| PathBuf::from("dest").join(m)).collect(),
            unmanaged: unmanaged.iter().map(|u| PathBuf::from("Assets").join(u)).collect(),
        }
    }

    #[test]
    fn split_names() {
        assert_eq!(
            split_versioned_name("foo-2.0.aar"),
            ("foo".to_string(), "2.0".to_string())
        );
        assert_eq!(
            split_versioned_name("com.google.android.gms.play-services-base-15.0.1.aar"),
            (
                "com.google.android.gms.play-services-base".to_string(),
                "15.0.1".to_string()
            )
        );
        assert_eq!(
            split_versioned_name("google-play-services.jar"),
            ("google-play-services".to_string(), String::new())
        );
        assert_eq!(
            split_versioned_name("exploded-1.0"),
            ("exploded".to_string(), "1.0".to_string())
        );
    }

    #[test]
    fn older_unmanaged_is_auto_resolvable() {
        let conflicts = find_conflicts(&archives(&["foo-2.0.aar"], &["foo-1.0.aar", "bar-1.0.jar"]));
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::AutoResolvable);
        assert_eq!(conflicts[0].unmanaged, vec![PathBuf::from("Assets/foo-1.0.aar")]);
    }

    #[test]
    fn newer_unmanaged_is_reported_only() {
        let conflicts = find_conflicts(&archives(&["foo-2.0.aar"], &["foo-3.0.aar"]));
        assert_eq!(conflicts[0].kind, ConflictKind::ManagedOlder);

        let resolution = resolve_conflicts(conflicts, &AutoPrompter::new(true));
        assert!(resolution.deleted.is_empty());
        assert_eq!(resolution.remaining.len(), 1);
    }

    #[test]
    fn monolithic_jar_always_conflicts() {
        let conflicts = find_conflicts(&archives(
            &["com.google.android.gms.play-services-base-15.0.1.aar"],
            &["Plugins/google-play-services.jar"],
        ));
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::LegacyMonolithic);
    }

    #[test]
    fn resolution_deletes_after_one_prompt_per_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        let dest = layout.destination();
        let other = layout.assets_dir().join("Other");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::create_dir_all(&other).unwrap();
        for (dir, name) in [
            (&dest, "foo-2.0.aar"),
            (&dest, "bar-1.0.aar"),
            (&other, "foo-1.0.aar"),
            (&other, "foo-1.5.jar"),
            (&other, "bar-0.9.aar"),
        ] {
            std::fs::write(dir.join(name), "x").unwrap();
        }
        let mut ledger = LabelLedger::new(&layout);
        ledger.label(&dest.join("foo-2.0.aar"));
        ledger.label(&dest.join("bar-1.0.aar"));

        let scanned = scan_project_archives(&layout, &ledger);
        assert_eq!(scanned.unmanaged.len(), 3);
        let conflicts = find_conflicts(&scanned);
        assert_eq!(conflicts.len(), 2);

        let prompter = AutoPrompter::new(true);
        let resolution = resolve_conflicts(conflicts, &prompter);
        assert_eq!(prompter.asked().len(), 2);
        assert_eq!(resolution.deleted.len(), 3);
        assert!(resolution.error.is_none());
        assert!(!other.join("foo-1.0.aar").exists());
        assert!(dest.join("foo-2.0.aar").exists());
    }

    #[test]
    fn declined_conflicts_remain() {
        let conflicts = find_conflicts(&archives(&["foo-2.0.aar"], &["foo-1.0.aar"]));
        let resolution = resolve_conflicts(conflicts, &AutoPrompter::new(false));
        assert!(resolution.deleted.is_empty());
        assert_eq!(resolution.remaining.len(), 1);
    }

    #[test]
    fn files_inside_exploded_dirs_are_managed() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        let exploded = layout.destination().join("foo-2.0");
        std::fs::create_dir_all(exploded.join("libs")).unwrap();
        std::fs::write(exploded.join("libs").join("classes.jar"), "x").unwrap();
        let mut ledger = LabelLedger::new(&layout);
        ledger.label(&exploded);

        let scanned = scan_project_archives(&layout, &ledger);
        assert_eq!(scanned.managed, vec![exploded]);
        assert!(scanned.unmanaged.is_empty());
    }
}
