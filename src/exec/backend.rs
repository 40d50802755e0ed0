// src/exec/backend.rs

//! Pluggable process runner abstraction.
//!
//! The stage runtime talks to a `ProcessRunner` instead of spawning
//! `tokio::process::Command` directly. Production code uses
//! [`TokioProcessRunner`](super::TokioProcessRunner); tests provide a scripted
//! runner that records invocations and returns canned exit codes.

use std::fmt;
use std::fs::File;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use crate::errors::Result;

/// A fully resolved command: program plus ordered arguments.
///
/// No shell is involved, so arguments are passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    /// Resolve `program` against the runner's search directory (if it has
    /// one). System tools such as `samtools` opt out and use `PATH`.
    pub use_search_dir: bool,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            use_search_dir: true,
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

    pub fn on_path(mut self) -> Self {
        self.use_search_dir = false;
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Where one of the child's standard streams goes.
#[derive(Debug)]
pub enum Redirect {
    Inherit,
    Null,
    File(File),
}

impl Redirect {
    fn try_clone(&self) -> std::io::Result<Redirect> {
        Ok(match self {
            Redirect::Inherit => Redirect::Inherit,
            Redirect::Null => Redirect::Null,
            Redirect::File(f) => Redirect::File(f.try_clone()?),
        })
    }

    pub fn into_stdio(self) -> Stdio {
        match self {
            Redirect::Inherit => Stdio::inherit(),
            Redirect::Null => Stdio::null(),
            Redirect::File(f) => Stdio::from(f),
        }
    }
}

/// Stderr can additionally share whatever stdout was wired to.
#[derive(Debug)]
pub enum StderrRedirect {
    To(Redirect),
    MergeIntoStdout,
}

/// The three streams of a stage process, wired exactly as given.
#[derive(Debug)]
pub struct StageIo {
    pub stdin: Redirect,
    pub stdout: Redirect,
    pub stderr: StderrRedirect,
}

impl StageIo {
    /// stdout and stderr both to `file`, stdin closed.
    pub fn combined(file: File) -> Self {
        Self {
            stdin: Redirect::Null,
            stdout: Redirect::File(file),
            stderr: StderrRedirect::MergeIntoStdout,
        }
    }

    /// stdout to `out`, stderr to `err`, stdin closed.
    pub fn split(out: File, err: File) -> Self {
        Self {
            stdin: Redirect::Null,
            stdout: Redirect::File(out),
            stderr: StderrRedirect::To(Redirect::File(err)),
        }
    }

    /// Resolve the merge request into concrete redirects.
    pub fn into_redirects(self) -> std::io::Result<(Redirect, Redirect, Redirect)> {
        let stderr = match self.stderr {
            StderrRedirect::To(r) => r,
            StderrRedirect::MergeIntoStdout => self.stdout.try_clone()?,
        };
        Ok((self.stdin, self.stdout, stderr))
    }
}

/// A started process that can be waited on.
pub trait ProcessHandle: Send {
    /// Wait for the process to exit and return its exit code.
    ///
    /// A process killed by a signal reports `-1`.
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>>;
}

/// Trait abstracting how stage commands are started.
pub trait ProcessRunner: Send {
    /// Start `command` with its streams wired to `io`.
    ///
    /// Fails with `CommandNotFound` when the executable cannot be located or
    /// executed and with `LaunchError` for any other spawn failure. A
    /// non-zero exit is not an error; it is reported by
    /// [`ProcessHandle::wait`].
    fn run(&mut self, command: &CommandLine, io: StageIo) -> Result<Box<dyn ProcessHandle>>;
}
