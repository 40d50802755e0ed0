// src/engine/sequencer.rs

//! Pure stage sequencing state machine.
//!
//! The sequencer hands out stage indices one at a time and consumes the
//! matching [`StageResult`]s. It has no Tokio types and performs no IO, so
//! it can be driven directly from tests.
//!
//! Invariants:
//! - stage `i` is only handed out once results `0..i` have been recorded;
//! - each stage is recorded exactly once, in declared order;
//! - a non-zero exit from a fatal stage moves the machine to `Aborted(i)`
//!   and nothing further is handed out.

use crate::engine::{SequencerState, StageResult};
use crate::errors::{Result, RunsampleError};
use crate::pipeline::Pipeline;
use crate::types::Fatality;

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    fatality: Fatality,
}

#[derive(Debug, Clone)]
pub struct Sequencer {
    slots: Vec<Slot>,
    state: SequencerState,
    results: Vec<StageResult>,
}

impl Sequencer {
    pub fn new(pipeline: &Pipeline) -> Self {
        Self::from_stages(
            pipeline
                .stages()
                .iter()
                .map(|s| (s.name().to_string(), s.fatality())),
        )
    }

    /// Build from bare `(name, fatality)` pairs.
    pub fn from_stages<I, S>(stages: I) -> Self
    where
        I: IntoIterator<Item = (S, Fatality)>,
        S: Into<String>,
    {
        Self {
            slots: stages
                .into_iter()
                .map(|(name, fatality)| Slot {
                    name: name.into(),
                    fatality,
                })
                .collect(),
            state: SequencerState::NotStarted,
            results: Vec::new(),
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn results(&self) -> &[StageResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<StageResult> {
        self.results
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.state, SequencerState::Aborted(_))
    }

    /// Index of the stage to run now, if any.
    ///
    /// Calling this again before recording returns the same index.
    pub fn next_stage(&mut self) -> Option<usize> {
        match self.state {
            SequencerState::NotStarted => {
                if self.slots.is_empty() {
                    self.state = SequencerState::Completed;
                    None
                } else {
                    self.state = SequencerState::Running(0);
                    Some(0)
                }
            }
            SequencerState::Running(i) if self.results.len() == i => Some(i),
            SequencerState::Running(_) => None,
            SequencerState::Completed | SequencerState::Aborted(_) => None,
        }
    }

    /// Record the result of the stage handed out by [`next_stage`].
    ///
    /// [`next_stage`]: Sequencer::next_stage
    pub fn record(&mut self, result: StageResult) -> Result<SequencerState> {
        let i = match self.state {
            SequencerState::Running(i) if self.results.len() == i => i,
            other => {
                return Err(RunsampleError::InvalidStage(format!(
                    "cannot record '{}' in state {:?}",
                    result.stage, other
                )));
            }
        };

        let slot = &self.slots[i];
        if slot.name != result.stage {
            return Err(RunsampleError::InvalidStage(format!(
                "expected result for '{}', got '{}'",
                slot.name, result.stage
            )));
        }

        let failed = !result.succeeded();
        let fatal = slot.fatality == Fatality::Fatal;
        self.results.push(result);

        self.state = if failed && fatal {
            SequencerState::Aborted(i)
        } else if i + 1 == self.slots.len() {
            SequencerState::Completed
        } else {
            SequencerState::Running(i + 1)
        };
        Ok(self.state)
    }
}
