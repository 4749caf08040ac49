//! Whether an unpacked archive needs rewriting before the build can use it.

use std::collections::BTreeSet;
use std::path::Path;

use super::abi::unselected_abis;
use super::manifest::{has_unresolved_application_id, MANIFEST_FILE};
use crate::config::Toolchain;

/// Primary code entry of a packed library.
pub const CLASSES_JAR: &str = "classes.jar";

/// What the consuming build toolchain can cope with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolchainCapabilities {
    /// Packed (.aar) libraries can be consumed as-is.
    pub supports_packed_libraries: bool,
    /// Unselected ABIs are dropped at build time.
    pub filters_abis: bool,
}

impl ToolchainCapabilities {
    pub fn for_toolchain(toolchain: Toolchain, filter_abis_at_build: bool) -> Self {
        match toolchain {
            Toolchain::Internal => Self {
                supports_packed_libraries: false,
                filters_abis: false,
            },
            Toolchain::Gradle => Self {
                supports_packed_libraries: true,
                filters_abis: filter_abis_at_build,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessReason {
    PackedUnsupported,
    UnresolvedApplicationId,
    MissingClassesJar,
    UnfilteredAbis(Vec<String>),
}

pub fn process_reasons(
    unpacked: &Path,
    capabilities: ToolchainCapabilities,
    selected_abis: &BTreeSet<String>,
) -> Vec<ProcessReason> {
    let mut reasons = Vec::new();
    if !capabilities.supports_packed_libraries {
        reasons.push(ProcessReason::PackedUnsupported);
    }
    let manifest = std::fs::read_to_string(unpacked.join(MANIFEST_FILE)).unwrap_or_default();
    if has_unresolved_application_id(&manifest) {
        reasons.push(ProcessReason::UnresolvedApplicationId);
    }
    if !unpacked.join(CLASSES_JAR).is_file() {
        reasons.push(ProcessReason::MissingClassesJar);
    }
    if !capabilities.filters_abis {
        let extra = unselected_abis(unpacked, selected_abis);
        if !extra.is_empty() {
            reasons.push(ProcessReason::UnfilteredAbis(extra));
        }
    }
    reasons
}

pub fn should_process(
    unpacked: &Path,
    explode_enabled: bool,
    capabilities: ToolchainCapabilities,
    selected_abis: &BTreeSet<String>,
) -> bool {
    explode_enabled && !process_reasons(unpacked, capabilities, selected_abis).is_empty()
}
