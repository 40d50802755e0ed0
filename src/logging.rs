// src/logging.rs

//! Logging for `runsample`.
//!
//! Two layers:
//! - a console subscriber (`tracing` + `tracing-subscriber`) on STDERR, set up
//!   once at startup by [`init_logging`];
//! - a per-run [`RunLog`] that writes the structured run log
//!   (`<sample>.log`) inside the workspace and mirrors every record to
//!   `tracing`. It is created once per run and passed by reference to the
//!   components that need it.
//!
//! Priority for determining the console log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `RUNSAMPLE_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use chrono::Local;
use tracing::{debug, error, info, warn};
use tracing_subscriber::fmt as subscriber_fmt;

use crate::cli::LogLevel;

/// Initialise global console logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("RUNSAMPLE_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    subscriber_fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

/// Severity of a run log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunLogLevel {
    Debug,
    Info,
    Warning,
    Critical,
}

impl fmt::Display for RunLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunLogLevel::Debug => "DEBUG",
            RunLogLevel::Info => "INFO",
            RunLogLevel::Warning => "WARNING",
            RunLogLevel::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// Structured diagnostic log for a single run.
///
/// Records go to the sink (normally `<sample>.log` in the workspace) as
/// `timestamp -- LEVEL -- sample -- message` lines and are always mirrored to
/// `tracing`. After [`RunLog::close`] the sink is flushed and dropped and
/// records only reach the console; publish relies on this because it may
/// move the directory the log file lives in.
pub struct RunLog {
    sample: String,
    path: Option<PathBuf>,
    sink: Mutex<Option<Box<dyn Write + Send>>>,
}

impl fmt::Debug for RunLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLog")
            .field("sample", &self.sample)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RunLog {
    /// Create (truncate) the run log file at `path`.
    pub fn create(sample: impl Into<String>, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(Self {
            sample: sample.into(),
            path: Some(path),
            sink: Mutex::new(Some(Box::new(BufWriter::new(file)))),
        })
    }

    /// Log into an arbitrary writer (tests use a capturing buffer).
    pub fn with_writer(sample: impl Into<String>, writer: Box<dyn Write + Send>) -> Self {
        Self {
            sample: sample.into(),
            path: None,
            sink: Mutex::new(Some(writer)),
        }
    }

    /// Console-only log, used before a workspace exists.
    pub fn console(sample: impl Into<String>) -> Self {
        Self {
            sample: sample.into(),
            path: None,
            sink: Mutex::new(None),
        }
    }

    /// Location of the log file, if this log is file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.record(RunLogLevel::Debug, message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.record(RunLogLevel::Info, message.as_ref());
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.record(RunLogLevel::Warning, message.as_ref());
    }

    pub fn critical(&self, message: impl AsRef<str>) {
        self.record(RunLogLevel::Critical, message.as_ref());
    }

    pub fn record(&self, level: RunLogLevel, message: &str) {
        match level {
            RunLogLevel::Debug => debug!(sample = %self.sample, "{message}"),
            RunLogLevel::Info => info!(sample = %self.sample, "{message}"),
            RunLogLevel::Warning => warn!(sample = %self.sample, "{message}"),
            RunLogLevel::Critical => error!(sample = %self.sample, "{message}"),
        }

        let mut guard = match self.sink.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(sink) = guard.as_mut() {
            let stamp = Local::now().format("%Y-%m-%d %H:%M:%S,%3f");
            let line = format!("{stamp} -- {level} -- {} -- {message}\n", self.sample);
            if let Err(e) = sink.write_all(line.as_bytes()).and_then(|_| sink.flush()) {
                warn!(error = %e, "failed to write run log record");
            }
        }
    }

    /// Flush and drop the file sink. Idempotent.
    pub fn close(&self) {
        let mut guard = match self.sink.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(mut sink) = guard.take() {
            if let Err(e) = sink.flush() {
                warn!(error = %e, "failed to flush run log on close");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        match self.sink.lock() {
            Ok(g) => g.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        self.close();
    }
}
