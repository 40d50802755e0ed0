// src/engine/mod.rs

//! Orchestration engine for runsample.
//!
//! This module ties together:
//! - the stage sequencer (which stage may run next, and when a run stops)
//! - the result aggregator (overall status and exit code)
//! - the async shell that actually starts stage processes
//!
//! The pure sequencing state machine lives in [`sequencer`]; the async/IO
//! shell is implemented in [`runtime`].

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::types::RunStatus;

/// Outcome of one executed stage. Appended once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    pub stage: String,
    /// Rendered command line as it was started.
    pub command: String,
    pub exit_code: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Where the stage's output went.
    pub log: PathBuf,
}

impl StageResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Position of the sequencer in the stage list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    NotStarted,
    /// Stage `i` is the next (or current) stage.
    Running(usize),
    Completed,
    /// Stage `i` was fatal and failed.
    Aborted(usize),
}

impl SequencerState {
    pub fn is_finished(self) -> bool {
        matches!(self, SequencerState::Completed | SequencerState::Aborted(_))
    }
}

/// One invocation of the pipeline for one sample.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub sample: String,
    pub results: Vec<StageResult>,
    pub workspace: PathBuf,
    pub outdir: PathBuf,
    pub status: RunStatus,
}

impl PipelineRun {
    pub fn new(sample: impl Into<String>, workspace: PathBuf, outdir: PathBuf) -> Self {
        Self {
            sample: sample.into(),
            results: Vec::new(),
            workspace,
            outdir,
            status: RunStatus::Pending,
        }
    }

    pub fn start(&mut self) {
        self.status = RunStatus::Running;
    }

    /// Take over the aggregated results and terminal status.
    pub fn finish(&mut self, aggregator: ResultAggregator) {
        self.status = aggregator.status();
        self.results = aggregator.into_results();
    }
}

pub mod aggregator;
pub mod runtime;
pub mod sequencer;

pub use aggregator::ResultAggregator;
pub use runtime::{PipelineRunner, Transcript};
pub use sequencer::Sequencer;
