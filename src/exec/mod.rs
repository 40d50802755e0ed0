// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually starting the external stage
//! commands, using `tokio::process::Command`, with their standard streams
//! wired to the run's log files.
//!
//! - [`backend`] provides the `ProcessRunner` / `ProcessHandle` traits and
//!   the stream redirection types. Tests replace the runner with a scripted
//!   fake.
//! - [`task_runner`] holds `TokioProcessRunner`, the production runner.

pub mod backend;
pub mod task_runner;

pub use backend::{
    CommandLine, ProcessHandle, ProcessRunner, Redirect, StageIo, StderrRedirect,
};
pub use task_runner::TokioProcessRunner;
