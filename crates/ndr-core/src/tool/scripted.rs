//! Scripted command runner for tests and offline runs.
//!
//! Replies are consumed in FIFO order, one per invocation; once the script is
//! exhausted every invocation succeeds with empty output. Canned stdout is fed
//! line by line through the responder, so prompt handling is exercised the
//! same way as with a real process.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{CommandRunner, PromptResponder, ToolCommand, ToolError, ToolOutput};

type Effect = Arc<dyn Fn(&ToolCommand) + Send + Sync>;

/// One canned tool run.
#[derive(Clone)]
pub struct ScriptedReply {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    effect: Option<Effect>,
}

impl ScriptedReply {
    pub fn ok(stdout: &str) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
            effect: None,
        }
    }

    pub fn failed(exit_code: i32, stderr: &str) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
            effect: None,
        }
    }

    /// Side effect run when the reply is consumed (e.g. create the files a
    /// fetch tool would have copied).
    pub fn with_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&ToolCommand) + Send + Sync + 'static,
    {
        self.effect = Some(Arc::new(effect));
        self
    }
}

impl std::fmt::Debug for ScriptedReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedReply")
            .field("exit_code", &self.exit_code)
            .field("stdout", &self.stdout)
            .field("stderr", &self.stderr)
            .field("effect", &self.effect.is_some())
            .finish()
    }
}

#[derive(Default)]
pub struct ScriptedRunner {
    replies: Mutex<VecDeque<ScriptedReply>>,
    invocations: Mutex<Vec<ToolCommand>>,
    responses: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: ScriptedReply) -> &Self {
        lock(&self.replies).push_back(reply);
        self
    }

    /// Every command run so far, in order.
    pub fn invocations(&self) -> Vec<ToolCommand> {
        lock(&self.invocations).clone()
    }

    pub fn invocation_count(&self) -> usize {
        lock(&self.invocations).len()
    }

    /// Text the responders wrote to stdin, in order.
    pub fn responses(&self) -> Vec<String> {
        lock(&self.responses).clone()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        command: &ToolCommand,
        responder: Option<PromptResponder>,
    ) -> Result<ToolOutput, ToolError> {
        lock(&self.invocations).push(command.clone());
        let reply = lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::ok(""));

        if let Some(mut r) = responder {
            for line in reply.stdout.split_inclusive('\n') {
                if let Some(answer) = r.feed(line) {
                    lock(&self.responses).push(answer);
                }
            }
        }
        if let Some(effect) = &reply.effect {
            effect(command);
        }

        Ok(ToolOutput {
            exit_code: Some(reply.exit_code),
            stdout: reply.stdout,
            stderr: reply.stderr,
        })
    }
}
