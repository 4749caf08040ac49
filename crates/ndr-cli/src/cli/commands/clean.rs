//! `ndr clean` – delete managed libraries and the resolution snapshot.

use anyhow::Result;
use ndr_core::resolve::Resolver;

pub fn run_clean(resolver: &Resolver) -> Result<()> {
    let report = resolver.clean()?;
    for path in &report.deleted {
        println!("deleted {}", path.display());
    }
    let deleted = report.deleted.len();
    if let Some(err) = report.into_error() {
        return Err(err.into());
    }
    println!("Removed {deleted} managed path(s).");
    Ok(())
}
