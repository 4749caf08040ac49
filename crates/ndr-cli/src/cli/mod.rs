//! CLI for NDR, the native-library dependency resolver.

mod commands;
mod console;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use ndr_core::config::{self, NdrConfig};
use ndr_core::declarations::DeclarationRegistry;
use ndr_core::layout::ProjectLayout;
use ndr_core::prompt::{AutoPrompter, Prompter};
use ndr_core::resolve::Resolver;
use ndr_core::tool::ProcessRunner;
use std::path::PathBuf;
use std::sync::Arc;

use commands::{
    run_clean, run_completions, run_conflicts, run_deps, run_history, run_resolve,
    run_sdk_install, run_sdk_list,
};
use console::ConsolePrompter;

/// Top-level CLI for the NDR dependency resolver.
#[derive(Debug, Parser)]
#[command(name = "ndr")]
#[command(about = "NDR: fetch and manage native Android libraries for a game project", long_about = None)]
pub struct Cli {
    /// Project root (defaults to the current directory).
    #[arg(long, global = true, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Answer yes to every question (licenses, Jetifier, conflict cleanup).
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch declared dependencies into the project.
    Resolve {
        /// Resolve even if nothing changed since the last run.
        #[arg(long)]
        force: bool,
        /// Treat this as an automatic (change-triggered) resolution.
        #[arg(long)]
        auto: bool,
    },

    /// List declared dependencies and where they were declared.
    Deps,

    /// Query or install platform SDK packages.
    Sdk {
        #[command(subcommand)]
        action: SdkCommand,
    },

    /// Report conflicts between managed and hand-added libraries.
    Conflicts,

    /// Delete every managed library and forget the last resolution.
    Clean,

    /// Show recent resolution jobs.
    History {
        /// Number of jobs to show.
        #[arg(long, default_value = "20", value_name = "N")]
        limit: i64,
    },

    /// Print shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum SdkCommand {
    /// List installed and available packages.
    List,

    /// Install packages by name (either naming form).
    Install {
        /// Package names, e.g. `extras;google;m2repository`.
        #[arg(required = true)]
        names: Vec<String>,
    },
}

impl Cli {
    fn layout(&self) -> Result<ProjectLayout> {
        let root = match &self.project {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        Ok(ProjectLayout::new(&root))
    }

    fn prompter(&self) -> Arc<dyn Prompter> {
        if self.yes {
            Arc::new(AutoPrompter::new(true))
        } else {
            Arc::new(ConsolePrompter)
        }
    }
}

fn resolver(cfg: &NdrConfig, layout: ProjectLayout, prompter: Arc<dyn Prompter>) -> Resolver {
    let source = Arc::new(DeclarationRegistry::new(&layout));
    Resolver::new(cfg, layout, Arc::new(ProcessRunner), prompter, source)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = &cli.command {
            run_completions(*shell);
            return Ok(());
        }

        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let layout = cli.layout()?;
        let prompter = cli.prompter();

        match cli.command {
            CliCommand::Resolve { force, auto } => {
                run_resolve(&mut cfg, layout, prompter, force, auto).await?
            }
            CliCommand::Deps => run_deps(&layout)?,
            CliCommand::Sdk { action } => match action {
                SdkCommand::List => run_sdk_list(&cfg).await?,
                SdkCommand::Install { names } => {
                    run_sdk_install(&cfg, &names, prompter.as_ref()).await?
                }
            },
            CliCommand::Conflicts => run_conflicts(&resolver(&cfg, layout, prompter))?,
            CliCommand::Clean => run_clean(&resolver(&cfg, layout, prompter))?,
            CliCommand::History { limit } => run_history(limit).await?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
