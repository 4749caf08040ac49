//! `ndr sdk list` / `ndr sdk install` – drive the platform package manager.

use anyhow::Result;
use ndr_core::config::NdrConfig;
use ndr_core::prompt::Prompter;
use ndr_core::sdk::{self, PackageManager, PackageNameVersion};
use ndr_core::tool::ProcessRunner;
use std::sync::Arc;

async fn manager(cfg: &NdrConfig) -> Result<Box<dyn PackageManager>> {
    let root = sdk::locate_sdk_root(cfg.sdk_root().as_deref())?;
    let manager = sdk::discover(Arc::new(ProcessRunner), &root).await?;
    tracing::debug!("package manager: {}", manager.flavor());
    Ok(manager)
}

pub async fn run_sdk_list(cfg: &NdrConfig) -> Result<()> {
    let catalog = manager(cfg).await?.query_packages().await?;
    if catalog.is_empty() {
        println!("No packages reported.");
        return Ok(());
    }
    println!("{:<45} {:<14} {:<10} {}", "PACKAGE", "VERSION", "INSTALLED", "DESCRIPTION");
    for name in catalog.names() {
        for package in catalog.versions(name) {
            println!(
                "{:<45} {:<14} {:<10} {}",
                package.name,
                package.version,
                if package.installed { "yes" } else { "-" },
                package.description
            );
        }
    }
    Ok(())
}

pub async fn run_sdk_install(
    cfg: &NdrConfig,
    names: &[String],
    prompter: &dyn Prompter,
) -> Result<()> {
    let requested: Vec<PackageNameVersion> =
        names.iter().map(|n| PackageNameVersion::parse_any(n)).collect();
    let manager = manager(cfg).await?;
    let installed = sdk::ensure_installed(manager.as_ref(), &requested, prompter).await?;
    if installed.is_empty() {
        println!("All requested packages are already installed.");
    } else {
        for package in installed {
            println!("Installed {package}");
        }
    }
    Ok(())
}
