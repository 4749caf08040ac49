//! `ndr deps` – list declared dependencies.

use anyhow::Result;
use ndr_core::declarations::{DeclarationRegistry, DependencySource};
use ndr_core::layout::ProjectLayout;

pub fn run_deps(layout: &ProjectLayout) -> Result<()> {
    let deps = DeclarationRegistry::new(layout).dependencies();
    if deps.is_empty() {
        println!("No dependencies declared under {}.", layout.assets_dir().display());
        return Ok(());
    }
    println!("{:<60} {}", "DEPENDENCY", "DECLARED IN");
    for dep in deps {
        println!("{:<60} {}", dep.key(), dep.provenance);
        if !dep.platform_packages.is_empty() {
            println!("    requires {}", dep.platform_packages.join(", "));
        }
    }
    Ok(())
}
