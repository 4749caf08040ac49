use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::process::{Substitution, ToolchainCapabilities, APPLICATION_ID_PLACEHOLDER};

/// Build toolchain that consumes the resolved artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toolchain {
    /// Legacy toolchain: no packed (.aar) library support, no build-time ABI filtering.
    Internal,
    /// Gradle-based toolchain: packed libraries supported.
    #[default]
    Gradle,
}

/// Settings that change what a resolution pass produces (section `[resolution]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSettings {
    /// Rewrite legacy support-library namespaces while fetching (Jetifier).
    #[serde(default)]
    pub jetifier: bool,
    /// Allow unpacking/repackaging of fetched archives.
    #[serde(default = "default_true")]
    pub explode_archives: bool,
    /// Target ABIs kept in native-code directories; empty keeps everything.
    #[serde(default)]
    pub selected_abis: Vec<String>,
    /// Application id substituted for `${applicationId}` in archive manifests.
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub toolchain: Toolchain,
    /// Whether the toolchain strips unselected ABIs at build time.
    #[serde(default = "default_true")]
    pub filter_abis_at_build: bool,
    /// Extra manifest substitutions: `${token}` keys are variables, other keys are literal prefixes.
    #[serde(default)]
    pub placeholder_substitutions: BTreeMap<String, String>,
    /// Run automatically triggered resolutions at all.
    #[serde(default = "default_true")]
    pub auto_resolve_on_change: bool,
    /// Ask before running an automatically triggered resolution.
    #[serde(default)]
    pub prompt_before_auto_resolution: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            jetifier: false,
            explode_archives: true,
            selected_abis: Vec::new(),
            application_id: String::new(),
            toolchain: Toolchain::Gradle,
            filter_abis_at_build: true,
            placeholder_substitutions: BTreeMap::new(),
            auto_resolve_on_change: true,
            prompt_before_auto_resolution: false,
        }
    }
}

impl ResolutionSettings {
    pub fn capabilities(&self) -> ToolchainCapabilities {
        ToolchainCapabilities::for_toolchain(self.toolchain, self.filter_abis_at_build)
    }

    pub fn selected_abi_set(&self) -> BTreeSet<String> {
        self.selected_abis.iter().cloned().collect()
    }

    /// Manifest substitutions: the application id first, then configured extras.
    pub fn substitutions(&self) -> Vec<Substitution> {
        let mut subs = Vec::new();
        if !self.application_id.is_empty() {
            subs.push(Substitution::new(APPLICATION_ID_PLACEHOLDER, &self.application_id));
        }
        for (token, value) in &self.placeholder_substitutions {
            subs.push(Substitution::new(token, value));
        }
        subs
    }

    /// Flattened view stored in the resolution-state snapshot.
    pub fn as_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("jetifier".to_string(), self.jetifier.to_string());
        map.insert("explode_archives".to_string(), self.explode_archives.to_string());
        map.insert("selected_abis".to_string(), self.selected_abis.join(","));
        map.insert("application_id".to_string(), self.application_id.clone());
        map.insert("toolchain".to_string(), format!("{:?}", self.toolchain).to_lowercase());
        map.insert(
            "filter_abis_at_build".to_string(),
            self.filter_abis_at_build.to_string(),
        );
        for (token, value) in &self.placeholder_substitutions {
            map.insert(format!("substitution:{token}"), value.clone());
        }
        map
    }
}

/// Global configuration loaded from `~/.config/ndr/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NdrConfig {
    /// Platform SDK root; falls back to `ANDROID_HOME` / `ANDROID_SDK_ROOT`.
    #[serde(default)]
    pub sdk_root: Option<PathBuf>,
    /// Executable of the build tool that copies artifacts (e.g. `gradle`).
    pub build_tool: PathBuf,
    /// Optional build script passed to the build tool with `-b`.
    #[serde(default)]
    pub fetch_script: Option<PathBuf>,
    /// Archive tool used to unpack and repack libraries (e.g. `jar`).
    pub archive_tool: PathBuf,
    /// Repositories searched before any dependency-specific repository.
    #[serde(default)]
    pub global_repositories: Vec<String>,
    #[serde(default)]
    pub resolution: ResolutionSettings,
}

impl Default for NdrConfig {
    fn default() -> Self {
        Self {
            sdk_root: None,
            build_tool: PathBuf::from("gradle"),
            fetch_script: None,
            archive_tool: PathBuf::from("jar"),
            global_repositories: Vec::new(),
            resolution: ResolutionSettings::default(),
        }
    }
}

impl NdrConfig {
    /// Configured SDK root, else the first SDK environment variable that is set.
    pub fn sdk_root(&self) -> Option<PathBuf> {
        if let Some(root) = &self.sdk_root {
            return Some(root.clone());
        }
        ["ANDROID_HOME", "ANDROID_SDK_ROOT"]
            .iter()
            .filter_map(|var| std::env::var_os(var))
            .find(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ndr")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<NdrConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = NdrConfig::default();
        save_to_path(&default_cfg, &path)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: NdrConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Write configuration back (e.g. after the Jetifier flag was enabled mid-resolution).
pub fn save(cfg: &NdrConfig) -> Result<()> {
    save_to_path(cfg, &config_path()?)
}

pub fn save_to_path(cfg: &NdrConfig, path: &Path) -> Result<()> {
    let toml = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml)?;
    Ok(())
}
