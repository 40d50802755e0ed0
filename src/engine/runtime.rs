// src/engine/runtime.rs

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::engine::{SequencerState, StageResult};
use crate::errors::{Result, RunsampleError};
use crate::exec::{CommandLine, ProcessRunner, StageIo};
use crate::logging::RunLog;
use crate::pipeline::{Param, Pipeline, Stage, StageParams, StageSink};

use super::sequencer::Sequencer;

/// Exit code recorded when a stage's program cannot be found.
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;
/// Exit code recorded when a stage could not be started for another reason.
pub const EXIT_LAUNCH_FAILED: i32 = 126;

/// The shared raw output file most stages write to.
#[derive(Debug)]
pub struct Transcript {
    file: File,
    path: PathBuf,
}

impl Transcript {
    /// Create (truncate) the transcript at `path`.
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn handle(&self) -> io::Result<File> {
        self.file.try_clone()
    }
}

/// Walks a [`Pipeline`] with a [`Sequencer`], starting each stage through a
/// `ProcessRunner`.
///
/// This is the IO shell around the sequencer: it renders commands, opens
/// log sinks, spawns and waits. Every decision about what runs next is made
/// by the sequencer.
pub struct PipelineRunner<R: ProcessRunner> {
    runner: R,
}

impl<R: ProcessRunner> fmt::Debug for PipelineRunner<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineRunner").finish_non_exhaustive()
    }
}

impl<R: ProcessRunner> PipelineRunner<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Run every stage of `pipeline` in order, stopping at a fatal failure.
    ///
    /// Stage failures are recorded as results, not returned as errors.
    pub async fn run(
        &mut self,
        pipeline: &Pipeline,
        params: &StageParams,
        transcript: &Transcript,
        log: &RunLog,
    ) -> Result<Sequencer> {
        let mut sequencer = Sequencer::new(pipeline);
        info!(stages = pipeline.len(), "pipeline started");

        while let Some(i) = sequencer.next_stage() {
            let stage = pipeline.get(i).ok_or_else(|| {
                RunsampleError::InvalidStage(format!("no stage at position {i}"))
            })?;

            let result = self.run_stage(stage, params, transcript, log).await;
            let state = sequencer.record(result)?;
            debug!(stage = stage.name(), ?state, "stage recorded");

            if let SequencerState::Aborted(_) = state {
                info!(stage = stage.name(), "fatal stage failed; stopping pipeline");
            }
        }

        info!(state = ?sequencer.state(), "pipeline finished");
        Ok(sequencer)
    }

    async fn run_stage(
        &mut self,
        stage: &Stage,
        params: &StageParams,
        transcript: &Transcript,
        log: &RunLog,
    ) -> StageResult {
        let started_at = Utc::now();
        let mut log_path = transcript.path().to_path_buf();

        let (rendered, exit_code) = match stage.command(params) {
            Ok(command) => {
                let rendered = command.to_string();
                let code = match open_sink(stage, params, transcript) {
                    Ok((io, sink_path)) => {
                        log_path = sink_path;
                        log.debug(format!("Running {rendered}"));
                        self.spawn_and_wait(&command, io, log).await
                    }
                    Err(e) => {
                        log.critical(format!("Could not open log for {}: {e}", stage.name()));
                        EXIT_LAUNCH_FAILED
                    }
                };
                (rendered, code)
            }
            Err(e) => {
                log.critical(format!("Could not build command for {}: {e}", stage.name()));
                (stage.describe(), EXIT_LAUNCH_FAILED)
            }
        };

        if exit_code != 0 {
            log.critical(format!("{rendered} did not exit successfully"));
            if stage.is_fatal() {
                log.critical(format!(
                    "{rendered} failed to complete successfully. Please check the log file {} for more details",
                    log_path.display()
                ));
            }
        } else {
            check_outputs(stage, params, log);
        }

        StageResult {
            stage: stage.name().to_string(),
            command: rendered,
            exit_code,
            started_at,
            finished_at: Utc::now(),
            log: log_path,
        }
    }

    async fn spawn_and_wait(&mut self, command: &CommandLine, io: StageIo, log: &RunLog) -> i32 {
        let mut handle = match self.runner.run(command, io) {
            Ok(h) => h,
            Err(e @ RunsampleError::CommandNotFound(_)) => {
                log.critical(e.to_string());
                return EXIT_COMMAND_NOT_FOUND;
            }
            Err(e) => {
                log.critical(e.to_string());
                return EXIT_LAUNCH_FAILED;
            }
        };

        match handle.wait().await {
            Ok(code) => code,
            Err(e) => {
                log.critical(format!("Waiting for {} failed: {e}", command.program));
                -1
            }
        }
    }
}

/// Wire the stage's streams according to its sink.
fn open_sink(
    stage: &Stage,
    params: &StageParams,
    transcript: &Transcript,
) -> Result<(StageIo, PathBuf)> {
    let sink_path = |param: Param| {
        params.path(param).ok_or_else(|| RunsampleError::MissingParameter {
            stage: stage.name().to_string(),
            param: param.to_string(),
        })
    };

    Ok(match stage.sink() {
        StageSink::Transcript => (
            StageIo::combined(transcript.handle()?),
            transcript.path().to_path_buf(),
        ),
        StageSink::Dedicated(param) => {
            let path = sink_path(param)?;
            (StageIo::combined(File::create(&path)?), path)
        }
        StageSink::CaptureStdout(param) => {
            let path = sink_path(param)?;
            (
                StageIo::split(File::create(&path)?, transcript.handle()?),
                path,
            )
        }
    })
}

fn check_outputs(stage: &Stage, params: &StageParams, log: &RunLog) {
    for param in stage.outputs() {
        if let Some(path) = params.path(*param) {
            if !path.exists() {
                log.warning(format!(
                    "{} exited successfully but did not produce {}",
                    stage.name(),
                    path.display()
                ));
            }
        }
    }
}
