// src/exec/task_runner.rs

//! Production process runner on top of `tokio::process`.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::errors::{Result, RunsampleError};
use crate::exec::backend::{CommandLine, ProcessHandle, ProcessRunner, StageIo};

/// Spawns real OS processes.
///
/// When a search directory is configured, programs of commands that use it
/// are resolved as `<search_dir>/<program>`.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner {
    search_dir: Option<PathBuf>,
}

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            search_dir: Some(dir.into()),
        }
    }

    pub fn search_dir(&self) -> Option<&Path> {
        self.search_dir.as_deref()
    }

    fn resolve_program(&self, command: &CommandLine) -> PathBuf {
        match (&self.search_dir, command.use_search_dir) {
            (Some(dir), true) => dir.join(&command.program),
            _ => PathBuf::from(&command.program),
        }
    }
}

impl ProcessRunner for TokioProcessRunner {
    fn run(&mut self, command: &CommandLine, io: StageIo) -> Result<Box<dyn ProcessHandle>> {
        let program = self.resolve_program(command);
        debug!(program = %program.display(), args = ?command.args, "spawning process");

        let (stdin, stdout, stderr) = io.into_redirects()?;

        let mut cmd = Command::new(&program);
        cmd.args(&command.args)
            .stdin(stdin.into_stdio())
            .stdout(stdout.into_stdio())
            .stderr(stderr.into_stdio())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                RunsampleError::CommandNotFound(program.display().to_string())
            }
            _ => RunsampleError::LaunchError {
                program: program.display().to_string(),
                source: e,
            },
        })?;

        info!(pid = ?child.id(), program = %program.display(), "process started");

        Ok(Box::new(ChildHandle { child }))
    }
}

/// Handle for a process spawned by [`TokioProcessRunner`].
#[derive(Debug)]
pub struct ChildHandle {
    child: Child,
}

impl ProcessHandle for ChildHandle {
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>> {
        Box::pin(async move {
            let status = self.child.wait().await?;
            let code = status.code().unwrap_or(-1);
            debug!(exit_code = code, success = status.success(), "process exited");
            Ok(code)
        })
    }
}
