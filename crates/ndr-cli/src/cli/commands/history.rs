//! `ndr history` – show recent resolution jobs.

use anyhow::Result;
use ndr_core::history::HistoryDb;

pub async fn run_history(limit: i64) -> Result<()> {
    let db = HistoryDb::open_default().await?;
    let runs = db.list_runs(limit).await?;
    if runs.is_empty() {
        println!("No resolutions recorded.");
        return Ok(());
    }
    println!(
        "{:<6} {:<10} {:<10} {:<8} {:<8} {}",
        "ID", "TRIGGER", "STATE", "COPIED", "MISSING", "ERROR"
    );
    for run in runs {
        let trigger = if run.force {
            format!("{}!", run.trigger.as_str())
        } else {
            run.trigger.as_str().to_string()
        };
        println!(
            "{:<6} {:<10} {:<10} {:<8} {:<8} {}",
            run.id,
            trigger,
            run.state.as_str(),
            run.copied,
            run.missing,
            run.error.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
