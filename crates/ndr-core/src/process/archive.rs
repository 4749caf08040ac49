//! Unpacking and repacking zip-format library archives with an external tool.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::tool::{CommandRunner, ToolCommand};

/// A zip archive with no entries (just the end-of-central-directory record).
pub const EMPTY_JAR: [u8; 22] = [
    0x50, 0x4b, 0x05, 0x06, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

#[async_trait]
pub trait ArchiveTool: Send + Sync {
    /// Unpack `archive` into the existing directory `dest`.
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
    /// Pack the contents of `source` into a new `archive`.
    async fn create(&self, archive: &Path, source: &Path) -> Result<()>;
}

/// The JDK `jar` tool.
pub struct JarTool {
    runner: Arc<dyn CommandRunner>,
    program: PathBuf,
}

impl JarTool {
    pub fn new(runner: Arc<dyn CommandRunner>, program: &Path) -> Self {
        Self {
            runner,
            program: program.to_path_buf(),
        }
    }

    async fn run(&self, command: ToolCommand) -> Result<()> {
        let out = self
            .runner
            .run(&command, None)
            .await
            .with_context(|| format!("run {command}"))?;
        if !out.success() {
            bail!("`{command}` failed ({})", out.failure_summary());
        }
        Ok(())
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()
        .context("current directory")?
        .join(path))
}

#[async_trait]
impl ArchiveTool for JarTool {
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        // `jar x` always extracts into the working directory.
        let command = ToolCommand::new(&self.program)
            .arg("xf")
            .arg(absolute(archive)?.display().to_string())
            .current_dir(dest);
        self.run(command).await
    }

    async fn create(&self, archive: &Path, source: &Path) -> Result<()> {
        let command = ToolCommand::new(&self.program)
            .arg("cfM")
            .arg(absolute(archive)?.display().to_string())
            .arg("-C")
            .arg(source.display().to_string())
            .arg(".");
        self.run(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ScriptedReply, ScriptedRunner};

    #[tokio::test]
    async fn extract_runs_in_destination() {
        let runner = Arc::new(ScriptedRunner::new());
        let tool = JarTool::new(runner.clone(), Path::new("jar"));
        tool.extract(Path::new("/a/lib.aar"), Path::new("/scratch"))
            .await
            .unwrap();
        let cmd = &runner.invocations()[0];
        assert_eq!(cmd.args, vec!["xf", "/a/lib.aar"]);
        assert_eq!(cmd.current_dir.as_deref(), Some(Path::new("/scratch")));
    }

    #[tokio::test]
    async fn create_and_failure() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .push(ScriptedReply::ok(""))
            .push(ScriptedReply::failed(1, "zip error"));
        let tool = JarTool::new(runner.clone(), Path::new("jar"));
        tool.create(Path::new("/a/lib.aar"), Path::new("/scratch"))
            .await
            .unwrap();
        assert_eq!(
            runner.invocations()[0].args,
            vec!["cfM", "/a/lib.aar", "-C", "/scratch", "."]
        );
        let err = tool
            .create(Path::new("/a/lib.aar"), Path::new("/scratch"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("zip error"));
    }

    #[test]
    fn empty_jar_is_an_end_record() {
        assert_eq!(&EMPTY_JAR[..4], b"PK\x05\x06");
    }
}
