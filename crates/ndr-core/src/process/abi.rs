//! Native-code ABI directories inside an unpacked archive.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const KNOWN_ABIS: [&str; 7] = [
    "armeabi",
    "armeabi-v7a",
    "arm64-v8a",
    "x86",
    "x86_64",
    "mips",
    "mips64",
];

/// Directories that may hold per-ABI subdirectories: `jni/` in packed
/// archives, `libs/` once exploded.
const NATIVE_DIRS: [&str; 2] = ["jni", "libs"];

fn abi_dirs(unpacked: &Path) -> Vec<(String, PathBuf)> {
    let mut found = Vec::new();
    for native in NATIVE_DIRS {
        let Ok(entries) = std::fs::read_dir(unpacked.join(native)) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_dir() && KNOWN_ABIS.contains(&name.as_str()) {
                found.push((name, entry.path()));
            }
        }
    }
    found
}

pub fn present_abis(unpacked: &Path) -> BTreeSet<String> {
    abi_dirs(unpacked).into_iter().map(|(abi, _)| abi).collect()
}

/// ABIs present but not selected. An empty selection keeps everything.
pub fn unselected_abis(unpacked: &Path, selected: &BTreeSet<String>) -> Vec<String> {
    if selected.is_empty() {
        return Vec::new();
    }
    present_abis(unpacked)
        .into_iter()
        .filter(|abi| !selected.contains(abi))
        .collect()
}

/// Remove ABI directories outside `selected`; returns the removed ABIs.
pub fn strip_unselected(unpacked: &Path, selected: &BTreeSet<String>) -> Result<Vec<String>> {
    if selected.is_empty() {
        return Ok(Vec::new());
    }
    let mut removed = BTreeSet::new();
    for (abi, dir) in abi_dirs(unpacked) {
        if selected.contains(&abi) {
            continue;
        }
        std::fs::remove_dir_all(&dir).with_context(|| format!("remove {}", dir.display()))?;
        removed.insert(abi);
    }
    Ok(removed.into_iter().collect())
}
