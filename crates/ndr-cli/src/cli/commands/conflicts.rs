//! `ndr conflicts` – report conflicts without deleting anything.

use anyhow::Result;
use ndr_core::conflict::ConflictKind;
use ndr_core::resolve::Resolver;

pub fn run_conflicts(resolver: &Resolver) -> Result<()> {
    let conflicts = resolver.find_conflicts()?;
    if conflicts.is_empty() {
        println!("No conflicts.");
        return Ok(());
    }
    for conflict in &conflicts {
        let tag = match conflict.kind {
            ConflictKind::AutoResolvable => "resolvable",
            ConflictKind::ManagedOlder => "manual",
            ConflictKind::LegacyMonolithic => "legacy",
        };
        println!("[{tag}] {}", conflict.describe());
    }
    Ok(())
}
