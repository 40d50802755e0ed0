// src/pipeline/mod.rs

//! Stage definitions.
//!
//! - [`params`] names the template fields and the fixed workspace layout.
//! - [`stage`] holds the typed stage descriptor and its builder.
//! - [`standard`] declares the single-sample pipeline.

pub mod params;
pub mod stage;
pub mod standard;

use std::collections::HashSet;

use crate::errors::{Result, RunsampleError};

pub use params::{Param, RunPaths, StageParams};
pub use stage::{Stage, StageBuilder, StageSink, Template};
pub use standard::standard_pipeline;

/// Ordered, validated list of stages.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Result<Self> {
        if stages.is_empty() {
            return Err(RunsampleError::InvalidStage(
                "pipeline must contain at least one stage".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for stage in &stages {
            if !seen.insert(stage.name()) {
                return Err(RunsampleError::InvalidStage(format!(
                    "duplicate stage name '{}'",
                    stage.name()
                )));
            }
        }
        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// Fail with `MissingParameter` if any stage needs a value `params`
    /// does not have. Run once before the first stage starts.
    pub fn check_params(&self, params: &StageParams) -> Result<()> {
        for stage in &self.stages {
            if let Some(param) = stage
                .required_params()
                .into_iter()
                .find(|p| !params.contains(*p))
            {
                return Err(RunsampleError::MissingParameter {
                    stage: stage.name().to_string(),
                    param: param.to_string(),
                });
            }
        }
        Ok(())
    }
}
