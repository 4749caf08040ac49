//! Shared fixtures for pipeline integration tests: a scratch project, a fake
//! SDK root, and a scripted runner standing in for every external tool.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use ndr_core::config::NdrConfig;
use ndr_core::declarations::StaticDependencies;
use ndr_core::dependency::Dependency;
use ndr_core::layout::ProjectLayout;
use ndr_core::prompt::AutoPrompter;
use ndr_core::resolve::Resolver;
use ndr_core::tool::{ScriptedReply, ScriptedRunner, ToolCommand};
use tempfile::TempDir;

pub struct Fixture {
    pub project: TempDir,
    pub sdk: TempDir,
    pub layout: ProjectLayout,
    pub runner: Arc<ScriptedRunner>,
    pub prompter: Arc<AutoPrompter>,
    pub source: Arc<StaticDependencies>,
}

impl Fixture {
    /// Every prompt is answered with `answer`.
    pub fn new(answer: bool) -> Self {
        let project = tempfile::tempdir().unwrap();
        let sdk = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(project.path());
        std::fs::create_dir_all(layout.assets_dir()).unwrap();
        Self {
            project,
            sdk,
            layout,
            runner: Arc::new(ScriptedRunner::new()),
            prompter: Arc::new(AutoPrompter::new(answer)),
            source: Arc::new(StaticDependencies::default()),
        }
    }

    /// Archive post-processing is off so only fetch and SDK tools run.
    pub fn config(&self) -> NdrConfig {
        let mut cfg = NdrConfig::default();
        cfg.sdk_root = Some(self.sdk.path().to_path_buf());
        cfg.global_repositories = vec!["https://maven.google.com".to_string()];
        cfg.resolution.explode_archives = false;
        cfg
    }

    pub fn resolver(&self) -> Resolver {
        self.resolver_with(&self.config())
    }

    pub fn resolver_with(&self, cfg: &NdrConfig) -> Resolver {
        Resolver::new(
            cfg,
            self.layout.clone(),
            self.runner.clone(),
            self.prompter.clone(),
            self.source.clone(),
        )
    }

    pub fn depend_on(&self, deps: Vec<Dependency>) {
        self.source.set(deps);
    }

    pub fn dest(&self, file: &str) -> PathBuf {
        self.layout.destination().join(file)
    }

    /// Install the legacy `tools/android` script so discovery finds it.
    pub fn with_legacy_sdk_tool(&self) {
        let tools = self.sdk.path().join("tools");
        std::fs::create_dir_all(&tools).unwrap();
        std::fs::write(tools.join("android"), "").unwrap();
    }
}

fn target_dir(cmd: &ToolCommand) -> PathBuf {
    cmd.args
        .iter()
        .find_map(|a| a.strip_prefix("-PTARGET_DIR="))
        .map(PathBuf::from)
        .expect("fetch command carries a target dir")
}

/// A fetch run that copies `copied` into the target directory and reports
/// `missing` specs.
pub fn fetch_reply(copied: &[&str], missing: &[&str]) -> ScriptedReply {
    let mut stdout = String::from("> Task :copyPackages\n\n");
    if !copied.is_empty() {
        stdout.push_str("Copied artifacts:\n");
        for name in copied {
            stdout.push_str(name);
            stdout.push('\n');
        }
        stdout.push('\n');
    }
    if !missing.is_empty() {
        stdout.push_str("Missing artifacts:\n");
        for spec in missing {
            stdout.push_str(spec);
            stdout.push('\n');
        }
    }
    let files: Vec<String> = copied.iter().map(|s| s.to_string()).collect();
    ScriptedReply::ok(&stdout).with_effect(move |cmd| {
        let dir = target_dir(cmd);
        for name in &files {
            std::fs::write(dir.join(name), "archive").unwrap();
        }
    })
}

pub fn is_fetch(cmd: &ToolCommand) -> bool {
    cmd.args.iter().any(|a| a == "copyPackages")
}
