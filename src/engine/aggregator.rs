// src/engine/aggregator.rs

use crate::engine::{Sequencer, SequencerState, StageResult};
use crate::types::RunStatus;

/// Collects stage results and decides the run's outcome.
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    results: Vec<StageResult>,
    aborted_at: Option<usize>,
    completed: bool,
}

impl ResultAggregator {
    pub fn from_sequencer(sequencer: Sequencer) -> Self {
        let state = sequencer.state();
        Self {
            results: sequencer.into_results(),
            aborted_at: match state {
                SequencerState::Aborted(i) => Some(i),
                _ => None,
            },
            completed: state == SequencerState::Completed,
        }
    }

    /// `Succeeded` iff every stage ran and every exit code is zero.
    pub fn status(&self) -> RunStatus {
        if self.completed && self.results.iter().all(StageResult::succeeded) {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.status().exit_code()
    }

    /// Index of the fatal stage that stopped the run.
    pub fn aborted_at(&self) -> Option<usize> {
        self.aborted_at
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted_at.is_some()
    }

    pub fn failures(&self) -> impl Iterator<Item = &StageResult> {
        self.results.iter().filter(|r| !r.succeeded())
    }

    pub fn results(&self) -> &[StageResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<StageResult> {
        self.results
    }
}
