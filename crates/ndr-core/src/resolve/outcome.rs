//! Result of one resolution pass.

use std::path::PathBuf;

use crate::conflict::Conflict;
use crate::dependency::Dependency;
use crate::error::ResolveError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionOutcome {
    /// True when every requested dependency was resolved.
    pub success: bool,
    /// Nothing changed since the last pass; no tool was run.
    pub up_to_date: bool,
    /// Resolved artifacts after post-processing (files or exploded directories).
    pub copied: Vec<PathBuf>,
    pub missing: Vec<Dependency>,
    /// Dependencies the compatibility rewrite touched.
    pub modified: Vec<Dependency>,
    /// Conflicts still present after conflict resolution.
    pub conflicts: Vec<Conflict>,
    /// Settings were changed during the pass and should be persisted.
    pub settings_changed: bool,
    pub error: Option<ResolveError>,
    /// Paths removed during the pass: stale artifacts, unmanaged copies
    /// replaced by a managed one, artifacts dropped after a declined rewrite.
    pub deleted: Vec<PathBuf>,
    /// Every path that could not be removed. Does not affect `success`.
    pub cleanup_error: Option<ResolveError>,
}

impl ResolutionOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn up_to_date() -> Self {
        Self {
            success: true,
            up_to_date: true,
            ..Self::default()
        }
    }

    /// Every requested dependency reported missing.
    pub fn failed(error: ResolveError, missing: Vec<Dependency>) -> Self {
        Self {
            success: false,
            missing,
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn missing_keys(&self) -> Vec<String> {
        self.missing.iter().map(Dependency::key).collect()
    }
}
