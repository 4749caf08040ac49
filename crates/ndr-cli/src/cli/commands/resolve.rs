//! `ndr resolve` – queue a resolution, run it, print the outcome.

use anyhow::{bail, Result};
use ndr_core::config::{self, NdrConfig};
use ndr_core::declarations::DeclarationRegistry;
use ndr_core::history::HistoryDb;
use ndr_core::layout::ProjectLayout;
use ndr_core::prompt::{Prompter, Question};
use ndr_core::resolve::{ResolutionOutcome, Resolver};
use ndr_core::scheduler::{JobResult, ResolutionRequest, ResolutionScheduler};
use ndr_core::tool::ProcessRunner;
use std::sync::Arc;

async fn scheduler() -> ResolutionScheduler {
    let history = match HistoryDb::open_default().await {
        Ok(db) => db,
        Err(e) => {
            tracing::warn!("history unavailable, jobs will not be recorded: {e:#}");
            return ResolutionScheduler::new();
        }
    };
    match history.recover_interrupted().await {
        Ok(n) if n > 0 => tracing::info!("marked {n} interrupted job(s) as failed"),
        Ok(_) => {}
        Err(e) => tracing::warn!("could not recover interrupted jobs: {e:#}"),
    }
    ResolutionScheduler::with_history(history)
}

pub async fn run_resolve(
    cfg: &mut NdrConfig,
    layout: ProjectLayout,
    prompter: Arc<dyn Prompter>,
    force: bool,
    auto: bool,
) -> Result<()> {
    let request = if auto {
        if !cfg.resolution.auto_resolve_on_change {
            println!("Automatic resolution is disabled (auto_resolve_on_change = false).");
            return Ok(());
        }
        if cfg.resolution.prompt_before_auto_resolution {
            let question = Question::new(
                "Resolve dependencies?",
                &format!("Dependencies of {} may have changed.", layout.root().display()),
            );
            if !prompter.confirm(&question) {
                println!("Skipped.");
                return Ok(());
            }
        }
        ResolutionRequest::automatic()
    } else {
        ResolutionRequest::explicit(force)
    };

    let source = Arc::new(DeclarationRegistry::new(&layout));
    let resolver = Resolver::new(cfg, layout, Arc::new(ProcessRunner), prompter, source);
    let scheduler = scheduler().await;
    let handle = scheduler.submit(request).await;
    scheduler.run_pending(&resolver).await;

    let outcome = match handle.wait().await {
        JobResult::Finished(outcome) => outcome,
        JobResult::Cancelled => {
            println!("Resolution was superseded by a newer request.");
            return Ok(());
        }
    };

    let settings = resolver.settings();
    if settings != cfg.resolution {
        cfg.resolution = settings;
        config::save(cfg)?;
        tracing::info!("saved updated resolution settings");
    }

    print_outcome(&outcome);
    if !outcome.success {
        bail!("resolution failed: {} dependencies missing", outcome.missing.len());
    }
    Ok(())
}

fn print_outcome(outcome: &ResolutionOutcome) {
    if outcome.up_to_date {
        println!("Dependencies are up to date.");
        return;
    }
    for path in &outcome.copied {
        println!("  copied   {}", path.display());
    }
    for dep in &outcome.missing {
        if dep.provenance.is_empty() {
            println!("  missing  {}", dep.key());
        } else {
            println!("  missing  {} (declared in {})", dep.key(), dep.provenance);
        }
    }
    for dep in &outcome.modified {
        println!("  jetified {}", dep.key());
    }
    for path in &outcome.deleted {
        println!("  deleted  {}", path.display());
    }
    for conflict in &outcome.conflicts {
        println!("  conflict {}", conflict.describe());
    }
    if outcome.settings_changed {
        println!("Jetifier was enabled for this project.");
    }
    if let Some(err) = &outcome.error {
        println!("Error: {err}");
    }
    if let Some(err) = &outcome.cleanup_error {
        println!("Warning: {err}");
    }
    println!(
        "{} copied, {} missing, {} conflicts.",
        outcome.copied.len(),
        outcome.missing.len(),
        outcome.conflicts.len()
    );
}
