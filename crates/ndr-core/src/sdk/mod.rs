//! Platform SDK package management.
//!
//! Two command-line package managers exist: the legacy `tools/android` script
//! and the modern `sdkmanager`. [`discover`] probes the SDK once and returns
//! the matching [`PackageManager`]; everything after that goes through the
//! trait.

pub mod catalog;
pub mod install;
pub mod package;
pub mod parse;

pub use catalog::PackageCatalog;
pub use install::{InstallFlow, InstallReport, InstallState, LicensePrompt};
pub use package::{PackageNameVersion, PlatformPackage};

use async_trait::async_trait;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::prompt::Prompter;
use crate::tool::{CommandRunner, ToolCommand, ToolError};
use crate::version::compare_versions;

/// First `sdkmanager` release that understands `--verbose --list`.
pub const MIN_VERBOSE_LIST_VERSION: &str = "26.0.2";

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("SDK root is not configured; set sdk_root in config.toml or ANDROID_HOME")]
    RootUnset,
    #[error("SDK root {0} does not exist or is not a directory")]
    RootInvalid(PathBuf),
    #[error("no package manager found under {0}")]
    ManagerNotFound(PathBuf),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("`{command}` failed ({summary})")]
    ListFailed { command: String, summary: String },
    #[error("failed to install {}", .packages.join(", "))]
    InstallFailed { packages: Vec<String> },
}

/// Which package manager the SDK ships, resolved once at discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolFlavor {
    Legacy,
    /// `sdkmanager` with the version it reported.
    Modern(String),
}

impl ToolFlavor {
    pub fn supports_verbose_list(&self) -> bool {
        match self {
            ToolFlavor::Legacy => false,
            ToolFlavor::Modern(version) => {
                compare_versions(version, MIN_VERBOSE_LIST_VERSION).is_ge()
            }
        }
    }
}

impl fmt::Display for ToolFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolFlavor::Legacy => write!(f, "android (legacy)"),
            ToolFlavor::Modern(v) => write!(f, "sdkmanager {v}"),
        }
    }
}

#[async_trait]
pub trait PackageManager: Send + Sync {
    fn flavor(&self) -> ToolFlavor;

    /// List installed and available packages.
    async fn query_packages(&self) -> Result<PackageCatalog, SdkError>;

    /// Install packages after license acceptance. False on any failure.
    async fn install_packages(
        &self,
        packages: &[PackageNameVersion],
        prompter: &dyn Prompter,
    ) -> bool;
}

/// Validate an SDK root before anything is run against it.
pub fn locate_sdk_root(root: Option<&Path>) -> Result<PathBuf, SdkError> {
    let root = root.ok_or(SdkError::RootUnset)?;
    if !root.is_dir() {
        return Err(SdkError::RootInvalid(root.to_path_buf()));
    }
    Ok(root.to_path_buf())
}

fn script(dir: PathBuf, name: &str) -> PathBuf {
    if cfg!(windows) {
        dir.join(format!("{name}.bat"))
    } else {
        dir.join(name)
    }
}

fn version_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\.\d+)*$").expect("valid regex"))
}

/// Last line of `sdkmanager --version` output that looks like a version.
pub fn parse_tool_version(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| version_line().is_match(l))
        .last()
        .map(str::to_string)
}

/// Probe the SDK for a package manager, preferring `sdkmanager`.
pub async fn discover(
    runner: Arc<dyn CommandRunner>,
    sdk_root: &Path,
) -> Result<Box<dyn PackageManager>, SdkError> {
    let candidates = [
        script(sdk_root.join("cmdline-tools").join("latest").join("bin"), "sdkmanager"),
        script(sdk_root.join("tools").join("bin"), "sdkmanager"),
    ];
    for path in candidates.into_iter().filter(|p| p.is_file()) {
        let out = runner
            .run(&ToolCommand::new(&path).arg("--version"), None)
            .await?;
        if !out.success() {
            tracing::warn!("{} --version failed ({})", path.display(), out.failure_summary());
            continue;
        }
        let Some(version) = parse_tool_version(&out.stdout) else {
            tracing::warn!("{} reported no version", path.display());
            continue;
        };
        tracing::info!("using sdkmanager {version} at {}", path.display());
        return Ok(Box::new(SdkManagerTool::new(runner, path, sdk_root, &version)));
    }

    let legacy = script(sdk_root.join("tools"), "android");
    if legacy.is_file() {
        tracing::info!("using legacy package manager at {}", legacy.display());
        return Ok(Box::new(LegacyAndroidTool::new(runner, legacy, sdk_root)));
    }
    Err(SdkError::ManagerNotFound(sdk_root.to_path_buf()))
}

/// Install whatever in `requested` is not installed yet. Returns the packages
/// that were installed; empty when nothing was needed.
pub async fn ensure_installed(
    manager: &dyn PackageManager,
    requested: &[PackageNameVersion],
    prompter: &dyn Prompter,
) -> Result<Vec<PackageNameVersion>, SdkError> {
    if requested.is_empty() {
        return Ok(Vec::new());
    }
    let catalog = manager.query_packages().await?;
    let to_install = catalog.to_install(requested);
    if to_install.is_empty() {
        return Ok(Vec::new());
    }
    let names: Vec<String> = to_install.iter().map(|p| p.to_string()).collect();
    tracing::info!("installing platform packages: {}", names.join(", "));
    if manager.install_packages(&to_install, prompter).await {
        Ok(to_install)
    } else {
        Err(SdkError::InstallFailed { packages: names })
    }
}

async fn list(
    runner: &dyn CommandRunner,
    command: ToolCommand,
) -> Result<String, SdkError> {
    let out = runner.run(&command, None).await?;
    if !out.success() {
        return Err(SdkError::ListFailed {
            command: command.to_string(),
            summary: out.failure_summary(),
        });
    }
    Ok(out.stdout)
}

/// The pre-26 `tools/android` script.
pub struct LegacyAndroidTool {
    runner: Arc<dyn CommandRunner>,
    program: PathBuf,
    sdk_root: PathBuf,
}

impl LegacyAndroidTool {
    pub fn new(runner: Arc<dyn CommandRunner>, program: PathBuf, sdk_root: &Path) -> Self {
        Self {
            runner,
            program,
            sdk_root: sdk_root.to_path_buf(),
        }
    }

    pub fn license_prompt() -> LicensePrompt {
        LicensePrompt::new("Do you accept the license", "y", "n")
    }
}

#[async_trait]
impl PackageManager for LegacyAndroidTool {
    fn flavor(&self) -> ToolFlavor {
        ToolFlavor::Legacy
    }

    async fn query_packages(&self) -> Result<PackageCatalog, SdkError> {
        let command = ToolCommand::new(&self.program).args(["list", "sdk", "-u", "-e", "-a"]);
        let stdout = list(self.runner.as_ref(), command).await?;
        Ok(parse::parse_legacy_list(&stdout, &self.sdk_root)
            .into_iter()
            .collect())
    }

    async fn install_packages(
        &self,
        packages: &[PackageNameVersion],
        prompter: &dyn Prompter,
    ) -> bool {
        let names: Vec<String> = packages.iter().map(|p| p.legacy_name()).collect();
        let command = ToolCommand::new(&self.program)
            .args(["update", "sdk", "-u", "-a", "-t"])
            .arg(names.join(","));
        InstallFlow::new(self.runner.as_ref(), command, Self::license_prompt())
            .run(prompter)
            .await
            .succeeded()
    }
}

/// `sdkmanager` from `cmdline-tools` or `tools/bin`.
pub struct SdkManagerTool {
    runner: Arc<dyn CommandRunner>,
    program: PathBuf,
    sdk_root: PathBuf,
    version: String,
}

impl SdkManagerTool {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        program: PathBuf,
        sdk_root: &Path,
        version: &str,
    ) -> Self {
        Self {
            runner,
            program,
            sdk_root: sdk_root.to_path_buf(),
            version: version.to_string(),
        }
    }

    pub fn license_prompt() -> LicensePrompt {
        LicensePrompt::new("Accept? (y/N):", "y", "N")
    }

    fn base_command(&self) -> ToolCommand {
        ToolCommand::new(&self.program).arg(format!("--sdk_root={}", self.sdk_root.display()))
    }
}

#[async_trait]
impl PackageManager for SdkManagerTool {
    fn flavor(&self) -> ToolFlavor {
        ToolFlavor::Modern(self.version.clone())
    }

    async fn query_packages(&self) -> Result<PackageCatalog, SdkError> {
        let verbose = self.flavor().supports_verbose_list();
        let command = if verbose {
            self.base_command().args(["--verbose", "--list"])
        } else {
            self.base_command().arg("--list")
        };
        let stdout = list(self.runner.as_ref(), command).await?;
        let packages = if verbose {
            parse::parse_verbose_list(&stdout)
        } else {
            parse::parse_tabular_list(&stdout)
        };
        Ok(packages.into_iter().collect())
    }

    async fn install_packages(
        &self,
        packages: &[PackageNameVersion],
        prompter: &dyn Prompter,
    ) -> bool {
        let command = self
            .base_command()
            .args(packages.iter().map(|p| p.name.clone()));
        InstallFlow::new(self.runner.as_ref(), command, Self::license_prompt())
            .run(prompter)
            .await
            .succeeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::AutoPrompter;
    use crate::tool::{ScriptedReply, ScriptedRunner};
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn sdk_root_validation() {
        assert!(matches!(locate_sdk_root(None), Err(SdkError::RootUnset)));
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            locate_sdk_root(Some(&missing)),
            Err(SdkError::RootInvalid(_))
        ));
        assert_eq!(locate_sdk_root(Some(dir.path())).unwrap(), dir.path());
    }

    #[test]
    fn verbose_gate() {
        assert!(!ToolFlavor::Legacy.supports_verbose_list());
        assert!(!ToolFlavor::Modern("26.0.1".into()).supports_verbose_list());
        assert!(ToolFlavor::Modern("26.0.2".into()).supports_verbose_list());
        assert!(ToolFlavor::Modern("26.1.1".into()).supports_verbose_list());
    }

    #[test]
    fn tool_version_ignores_noise() {
        let out = "Warning: some notice\n[=====] 100%\n26.1.1\n";
        assert_eq!(parse_tool_version(out).as_deref(), Some("26.1.1"));
        assert_eq!(parse_tool_version("nothing useful"), None);
    }

    #[tokio::test]
    async fn discover_prefers_sdkmanager() {
        let dir = tempfile::tempdir().unwrap();
        touch(&script(dir.path().join("tools").join("bin"), "sdkmanager"));
        touch(&script(dir.path().join("tools"), "android"));
        let runner = Arc::new(ScriptedRunner::new());
        runner.push(ScriptedReply::ok("25.2.5\n"));
        let manager = discover(runner.clone(), dir.path()).await.unwrap();
        assert_eq!(manager.flavor(), ToolFlavor::Modern("25.2.5".into()));
        assert_eq!(runner.invocations()[0].args, vec!["--version"]);
    }

    #[tokio::test]
    async fn discover_falls_back_to_legacy() {
        let dir = tempfile::tempdir().unwrap();
        touch(&script(dir.path().join("tools"), "android"));
        let runner = Arc::new(ScriptedRunner::new());
        let manager = discover(runner.clone(), dir.path()).await.unwrap();
        assert_eq!(manager.flavor(), ToolFlavor::Legacy);
        assert_eq!(runner.invocation_count(), 0);

        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover(runner, empty.path()).await,
            Err(SdkError::ManagerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn modern_query_picks_grammar_by_version() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push(ScriptedReply::ok(
            "Available Packages:\n---\ntools\n    Version: 26.1.1\n",
        ));
        let tool = SdkManagerTool::new(runner.clone(), "sdkmanager".into(), Path::new("/sdk"), "26.1.1");
        let catalog = tool.query_packages().await.unwrap();
        assert!(catalog.contains("tools"));
        let cmd = &runner.invocations()[0];
        assert_eq!(cmd.args, vec!["--sdk_root=/sdk", "--verbose", "--list"]);

        let runner = Arc::new(ScriptedRunner::new());
        runner.push(ScriptedReply::ok(
            "Available Packages:\n  Path | Version\n  ---- | ----\n  tools | 25.2.5\n",
        ));
        let tool = SdkManagerTool::new(runner.clone(), "sdkmanager".into(), Path::new("/sdk"), "25.2.5");
        let catalog = tool.query_packages().await.unwrap();
        assert!(catalog.contains("tools"));
        assert_eq!(runner.invocations()[0].args, vec!["--sdk_root=/sdk", "--list"]);
    }

    #[tokio::test]
    async fn query_failure_is_an_error() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push(ScriptedReply::failed(1, "no network"));
        let tool = LegacyAndroidTool::new(runner, "android".into(), Path::new("/sdk"));
        let err = tool.query_packages().await.unwrap_err();
        assert!(err.to_string().contains("no network"));
    }

    #[tokio::test]
    async fn legacy_install_uses_legacy_names() {
        let runner = Arc::new(ScriptedRunner::new());
        let tool = LegacyAndroidTool::new(runner.clone(), "android".into(), Path::new("/sdk"));
        let ok = tool
            .install_packages(
                &[PackageNameVersion::new("extras;google;m2repository")],
                &AutoPrompter::new(true),
            )
            .await;
        assert!(ok);
        let cmd = &runner.invocations()[0];
        assert_eq!(
            cmd.args,
            vec!["update", "sdk", "-u", "-a", "-t", "extra-google-m2repository"]
        );
    }

    #[tokio::test]
    async fn ensure_installed_skips_installed_packages() {
        let runner = Arc::new(ScriptedRunner::new());
        let listing = "Installed packages:\n---\nextras;google;m2repository\n    Version: 58\n\
                       Available Packages:\n---\nextras;android;m2repository\n    Version: 47\n";
        runner.push(ScriptedReply::ok(listing));
        let tool = SdkManagerTool::new(runner.clone(), "sdkmanager".into(), Path::new("/sdk"), "26.1.1");
        let installed = ensure_installed(
            &tool,
            &[
                PackageNameVersion::new("extras;google;m2repository"),
                PackageNameVersion::new("extras;android;m2repository"),
            ],
            &AutoPrompter::new(true),
        )
        .await
        .unwrap();
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].name, "extras;android;m2repository");
        // list, dry run, install
        assert_eq!(runner.invocation_count(), 3);
        assert!(runner.invocations()[2].has_arg_containing("extras;android;m2repository"));
    }
}
