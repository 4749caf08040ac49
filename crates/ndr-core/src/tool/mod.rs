//! External tool invocation.
//!
//! Every external program (fetch tool, SDK package manager, archive tool) is
//! run through a [`CommandRunner`], so the pipeline can be exercised with a
//! scripted runner (feature `test-util`) instead of real processes.

mod responder;
mod runner;
#[cfg(any(test, feature = "test-util"))]
mod scripted;

pub use responder::PromptResponder;
pub use runner::ProcessRunner;
#[cfg(any(test, feature = "test-util"))]
pub use scripted::{ScriptedReply, ScriptedRunner};

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

/// A program plus arguments, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// True if any argument contains `needle`.
    pub fn has_arg_containing(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a.contains(needle))
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Short human-readable failure description for diagnostics.
    pub fn failure_summary(&self) -> String {
        let code = self
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        let detail = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        if detail.is_empty() {
            format!("exit {code}")
        } else {
            format!("exit {code}: {detail}")
        }
    }
}

/// Failure to run a tool at all. A non-zero exit is not a `ToolError`;
/// callers inspect [`ToolOutput::success`].
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to capture output of {program}")]
    Capture { program: String },
    #[error("failed while waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs external commands. `responder`, when given, answers one interactive
/// question on the tool's stdin.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        command: &ToolCommand,
        responder: Option<PromptResponder>,
    ) -> Result<ToolOutput, ToolError>;
}
