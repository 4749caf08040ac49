//! Snapshot of the last completed resolution, used to skip passes whose
//! inputs and outputs have not changed.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionState {
    /// Keys of the dependencies that were resolved.
    pub requested: BTreeSet<String>,
    /// Project-relative labeled outputs.
    pub outputs: BTreeSet<String>,
    /// Resolution-affecting settings at the time.
    pub settings: BTreeMap<String, String>,
}

impl ResolutionState {
    pub fn new<R, O>(requested: R, outputs: O, settings: BTreeMap<String, String>) -> Self
    where
        R: IntoIterator<Item = String>,
        O: IntoIterator<Item = String>,
    {
        Self {
            requested: requested.into_iter().collect(),
            outputs: outputs.into_iter().collect(),
            settings,
        }
    }

    /// Missing file means no previous pass.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("read state: {}", path.display())),
        };
        let state = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse state: {}", path.display()))?;
        Ok(Some(state))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize state")?;
        std::fs::write(path, json).with_context(|| format!("write state: {}", path.display()))?;
        Ok(())
    }

    pub fn remove(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove state: {}", path.display())),
        }
    }
}
