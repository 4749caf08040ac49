//! Real subprocess execution on tokio.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use super::{CommandRunner, PromptResponder, ToolCommand, ToolError, ToolOutput};

const READ_CHUNK: usize = 4096;

/// Runs commands as child processes. No timeout is applied: a hung tool hangs
/// the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        command: &ToolCommand,
        responder: Option<PromptResponder>,
    ) -> Result<ToolOutput, ToolError> {
        let program = command.program.display().to_string();
        tracing::debug!(command = %command, "running tool");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(if responder.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| ToolError::Spawn {
            program: program.clone(),
            source,
        })?;

        let mut stdin = child.stdin.take();
        let mut stdout = child.stdout.take().ok_or_else(|| ToolError::Capture {
            program: program.clone(),
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| ToolError::Capture {
            program: program.clone(),
        })?;
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        let mut responder = responder;
        let mut collected = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = match stdout.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(program = %program, "stdout read failed: {e}");
                    break;
                }
            };
            collected.extend_from_slice(&chunk[..n]);

            let Some(r) = responder.as_mut() else {
                continue;
            };
            let text = String::from_utf8_lossy(&chunk[..n]);
            if let Some(reply) = r.feed(&text) {
                tracing::debug!(program = %program, reply = reply.trim(), "answering prompt");
                if let Some(pipe) = stdin.as_mut() {
                    // The tool may already have exited and closed stdin.
                    if let Err(e) = pipe.write_all(reply.as_bytes()).await {
                        tracing::debug!("stdin write ignored: {e}");
                    }
                    let _ = pipe.flush().await;
                }
            }
        }
        drop(stdin);

        let status = child.wait().await.map_err(|source| ToolError::Wait {
            program: program.clone(),
            source,
        })?;
        let stderr_bytes = stderr_task.await.unwrap_or_default();

        let output = ToolOutput {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&collected).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
        };
        tracing::debug!(program = %program, exit = ?output.exit_code, "tool finished");
        Ok(output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let cmd = ToolCommand::new("sh").args(["-c", "echo hello; echo oops >&2; exit 3"]);
        let out = ProcessRunner.run(&cmd, None).await.unwrap();
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn responder_answers_on_stdin() {
        let script = "printf 'Accept? (y/N): '; read answer; echo \"got $answer\"";
        let cmd = ToolCommand::new("sh").args(["-c", script]);
        let responder = PromptResponder::new("Accept? (y/N):", "y");
        let out = ProcessRunner.run(&cmd, Some(responder)).await.unwrap();
        assert!(out.success());
        assert!(out.stdout.contains("got y"));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let cmd = ToolCommand::new("/nonexistent/ndr-test-tool");
        let err = ProcessRunner.run(&cmd, None).await.unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
