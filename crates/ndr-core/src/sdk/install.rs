//! License-gated package installation.
//!
//! `Idle → FetchingLicense → AwaitingUserDecision → Installing → {Succeeded, Failed}`
//!
//! The first run answers "decline" to the license question so the license
//! text can be harvested without installing anything. If no license text
//! appears the decision step is skipped. Any non-zero exit fails the flow.

use crate::prompt::Prompter;
use crate::tool::{CommandRunner, PromptResponder, ToolCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Idle,
    FetchingLicense,
    AwaitingUserDecision,
    Installing,
    Succeeded,
    Failed,
}

/// The question a tool asks before installing, and the answers it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicensePrompt {
    pub question: String,
    pub accept: String,
    pub decline: String,
}

impl LicensePrompt {
    pub fn new(question: &str, accept: &str, decline: &str) -> Self {
        Self {
            question: question.to_string(),
            accept: accept.to_string(),
            decline: decline.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Every state entered, starting with `Idle`.
    pub transitions: Vec<InstallState>,
    pub license: Option<String>,
    /// Why the flow failed, if it did.
    pub failure: Option<String>,
}

impl InstallReport {
    pub fn state(&self) -> InstallState {
        self.transitions.last().copied().unwrap_or(InstallState::Idle)
    }

    pub fn succeeded(&self) -> bool {
        self.state() == InstallState::Succeeded
    }
}

/// Text printed before the question, minus progress-bar lines.
pub fn harvest_license(stdout: &str, question: &str) -> Option<String> {
    let end = stdout.find(question)?;
    let text: Vec<&str> = stdout[..end]
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim_start().starts_with('['))
        .collect();
    let text = text.join("\n").trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub struct InstallFlow<'a> {
    runner: &'a dyn CommandRunner,
    command: ToolCommand,
    prompt: LicensePrompt,
    transitions: Vec<InstallState>,
}

impl<'a> InstallFlow<'a> {
    pub fn new(runner: &'a dyn CommandRunner, command: ToolCommand, prompt: LicensePrompt) -> Self {
        Self {
            runner,
            command,
            prompt,
            transitions: vec![InstallState::Idle],
        }
    }

    fn enter(&mut self, state: InstallState) {
        tracing::debug!(?state, "install flow");
        self.transitions.push(state);
    }

    fn fail(mut self, license: Option<String>, why: String) -> InstallReport {
        tracing::error!("package installation failed: {why}");
        self.enter(InstallState::Failed);
        InstallReport {
            transitions: self.transitions,
            license,
            failure: Some(why),
        }
    }

    pub async fn run(mut self, prompter: &dyn Prompter) -> InstallReport {
        self.enter(InstallState::FetchingLicense);
        let decline = PromptResponder::new(&self.prompt.question, &self.prompt.decline);
        let dry = match self.runner.run(&self.command, Some(decline)).await {
            Ok(out) => out,
            Err(e) => return self.fail(None, e.to_string()),
        };
        if !dry.success() {
            let why = format!("{} ({})", self.command, dry.failure_summary());
            return self.fail(None, why);
        }

        let license = harvest_license(&dry.stdout, &self.prompt.question);
        if let Some(text) = &license {
            self.enter(InstallState::AwaitingUserDecision);
            if !prompter.accept_license(text) {
                return self.fail(license, "license declined".to_string());
            }
        }

        self.enter(InstallState::Installing);
        let accept = PromptResponder::new(&self.prompt.question, &self.prompt.accept);
        let installed = match self.runner.run(&self.command, Some(accept)).await {
            Ok(out) => out,
            Err(e) => return self.fail(license, e.to_string()),
        };
        if !installed.success() {
            let why = format!("{} ({})", self.command, installed.failure_summary());
            return self.fail(license, why);
        }

        self.enter(InstallState::Succeeded);
        InstallReport {
            transitions: self.transitions,
            license,
            failure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::AutoPrompter;
    use crate::tool::{ScriptedReply, ScriptedRunner};
    use InstallState::*;

    fn prompt() -> LicensePrompt {
        LicensePrompt::new("Accept? (y/N):", "y", "N")
    }

    const LICENSE_OUT: &str = "License android-sdk-license:\n---------\nTerms and conditions\n[=====] 10%\nAccept? (y/N): ";

    #[test]
    fn harvest_strips_progress_and_question() {
        let text = harvest_license(LICENSE_OUT, "Accept? (y/N):").unwrap();
        assert_eq!(text, "License android-sdk-license:\n---------\nTerms and conditions");
        assert_eq!(harvest_license("no question here", "Accept?"), None);
        assert_eq!(harvest_license("Accept? (y/N):", "Accept? (y/N):"), None);
    }

    #[tokio::test]
    async fn accepted_license_installs() {
        let runner = ScriptedRunner::new();
        runner
            .push(ScriptedReply::ok(LICENSE_OUT))
            .push(ScriptedReply::ok(LICENSE_OUT));
        let prompter = AutoPrompter::new(true);
        let report = InstallFlow::new(&runner, ToolCommand::new("sdkmanager"), prompt())
            .run(&prompter)
            .await;
        assert!(report.succeeded());
        assert_eq!(
            report.transitions,
            vec![Idle, FetchingLicense, AwaitingUserDecision, Installing, Succeeded]
        );
        assert_eq!(runner.responses(), vec!["N\n".to_string(), "y\n".to_string()]);
    }

    #[tokio::test]
    async fn declined_license_fails_without_second_run() {
        let runner = ScriptedRunner::new();
        runner.push(ScriptedReply::ok(LICENSE_OUT));
        let prompter = AutoPrompter::new(false);
        let report = InstallFlow::new(&runner, ToolCommand::new("sdkmanager"), prompt())
            .run(&prompter)
            .await;
        assert_eq!(report.state(), Failed);
        assert_eq!(runner.invocation_count(), 1);
        assert!(report.license.is_some());
    }

    #[tokio::test]
    async fn no_license_skips_decision() {
        let runner = ScriptedRunner::new();
        runner.push(ScriptedReply::ok("done\n")).push(ScriptedReply::ok("done\n"));
        let prompter = AutoPrompter::new(false);
        let report = InstallFlow::new(&runner, ToolCommand::new("sdkmanager"), prompt())
            .run(&prompter)
            .await;
        assert!(report.succeeded());
        assert_eq!(report.transitions, vec![Idle, FetchingLicense, Installing, Succeeded]);
        assert!(prompter.asked().is_empty());
    }

    #[tokio::test]
    async fn non_zero_exit_aborts() {
        let runner = ScriptedRunner::new();
        runner.push(ScriptedReply::ok(LICENSE_OUT)).push(ScriptedReply::failed(1, "disk full"));
        let prompter = AutoPrompter::new(true);
        let report = InstallFlow::new(&runner, ToolCommand::new("sdkmanager"), prompt())
            .run(&prompter)
            .await;
        assert_eq!(report.state(), Failed);
        assert!(report.failure.unwrap().contains("disk full"));

        let runner = ScriptedRunner::new();
        runner.push(ScriptedReply::failed(3, ""));
        let report = InstallFlow::new(&runner, ToolCommand::new("sdkmanager"), prompt())
            .run(&prompter)
            .await;
        assert_eq!(report.transitions, vec![Idle, FetchingLicense, Failed]);
    }
}
