// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod types;
pub mod workspace;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::RunSettings;
use crate::engine::{PipelineRun, PipelineRunner, ResultAggregator, StageResult, Transcript};
use crate::errors::{Result, RunsampleError};
use crate::exec::{ProcessRunner, TokioProcessRunner};
use crate::logging::RunLog;
use crate::pipeline::{standard_pipeline, Pipeline, RunPaths, StageParams};
use crate::types::RunStatus;
use crate::workspace::{preflight_destination, Workspace};

/// What a finished invocation hands back to `main`.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub sample: String,
    pub status: RunStatus,
    pub results: Vec<StageResult>,
    /// Published destination, or the scratch workspace if the run aborted.
    pub location: PathBuf,
    pub published: bool,
    pub exit_code: i32,
}

impl RunReport {
    fn dry_run(settings: &RunSettings) -> Self {
        Self {
            sample: settings.sample.clone(),
            status: RunStatus::Pending,
            results: Vec::new(),
            location: settings.outdir.clone(),
            published: false,
            exit_code: 0,
        }
    }
}

/// High-level entry point used by `main.rs`.
///
/// Resolves settings, builds the standard pipeline and runs it with the
/// production process runner.
pub async fn run(args: CliArgs) -> Result<RunReport> {
    let settings = RunSettings::resolve(&args)?;
    let pipeline = standard_pipeline()?;

    if args.dry_run {
        print_dry_run(&settings, &pipeline);
        return Ok(RunReport::dry_run(&settings));
    }

    let runner = match settings.script_dir {
        Some(ref dir) => TokioProcessRunner::with_search_dir(dir),
        None => TokioProcessRunner::new(),
    };
    run_pipeline(&settings, &pipeline, runner).await
}

/// Run `pipeline` for one sample.
///
/// Order: destination pre-flight, workspace, logs, provenance, reference
/// copy, stages, aggregation, provenance commit, publish. A fatal stage
/// failure skips the commit and the publish and reports the scratch path.
pub async fn run_pipeline<R: ProcessRunner>(
    settings: &RunSettings,
    pipeline: &Pipeline,
    runner: R,
) -> Result<RunReport> {
    preflight_destination(&settings.outdir)?;

    let sample = settings.sample.as_str();
    let mut workspace = Workspace::create(settings.tmpdir.as_deref(), sample)?;
    let root = workspace.root().to_path_buf();
    let paths = RunPaths::new(&root, sample, &settings.reference);

    let log = RunLog::create(sample, &paths.run_log)?;
    log.info(format!("--- Starting {sample} ---"));
    if let Some(ref cfg) = settings.config_path {
        log.info(format!("--- Using custom config from {} ---", cfg.display()));
    }

    let mut run = PipelineRun::new(sample, root.clone(), settings.outdir.clone());

    workspace.init_provenance(&log);

    log.debug(format!(
        "Copying reference file {} to {}",
        settings.reference.display(),
        paths.reference.display()
    ));
    fs::copy(&settings.reference, &paths.reference)
        .map_err(|e| setup_failed(&log, RunsampleError::IoError(e)))?;

    let params = StageParams::for_run(settings, &paths);
    pipeline
        .check_params(&params)
        .map_err(|e| setup_failed(&log, e))?;

    let transcript =
        Transcript::create(&paths.transcript).map_err(|e| setup_failed(&log, e.into()))?;

    run.start();
    let sequencer = PipelineRunner::new(runner)
        .run(pipeline, &params, &transcript, &log)
        .await?;
    let aggregator = ResultAggregator::from_sequencer(sequencer);
    let aborted = aggregator.is_aborted();

    match aggregator.status() {
        RunStatus::Succeeded => log.info(format!("--- Finished {sample} ---")),
        _ => {
            // A published run's log is read from its destination.
            let logfile = if aborted {
                paths.run_log.clone()
            } else {
                rebase(&paths.run_log, &root, &settings.outdir)
            };
            log.critical("!!! There was an error running part of the pipeline !!!");
            log.critical(format!("Please check the logfile {}", logfile.display()));
        }
    }
    run.finish(aggregator);

    if aborted {
        log.critical(format!("Workspace left in place at {}", root.display()));
        drop(transcript);
        log.close();
        return Ok(report(run, root, false));
    }

    workspace.commit_provenance(&format!("{sample}: run {}", run.status), run.status, &log);

    log.debug(format!(
        "Moving {} to {}",
        root.display(),
        settings.outdir.display()
    ));
    drop(transcript);
    log.close();

    let outcome = workspace.publish(&settings.outdir).inspect_err(|e| {
        error!(workspace = %root.display(), error = %e, "publish failed; workspace left in place");
    })?;
    info!(dest = %outcome.dest().display(), status = %run.status, "run published");

    let dest = outcome.dest().to_path_buf();
    for result in &mut run.results {
        result.log = rebase(&result.log, &root, &dest);
    }
    Ok(report(run, dest, true))
}

/// Move `path` from under `from` to the same place under `to`. Paths outside
/// `from` are returned unchanged.
fn rebase(path: &Path, from: &Path, to: &Path) -> PathBuf {
    match path.strip_prefix(from) {
        Ok(rel) => to.join(rel),
        Err(_) => path.to_path_buf(),
    }
}

fn report(run: PipelineRun, location: PathBuf, published: bool) -> RunReport {
    RunReport {
        exit_code: run.status.exit_code(),
        sample: run.sample,
        status: run.status,
        results: run.results,
        location,
        published,
    }
}

fn setup_failed(log: &RunLog, e: RunsampleError) -> RunsampleError {
    log.critical(format!("Setup failed: {e}"));
    e
}

/// Print the resolved settings and every stage's command template.
fn print_dry_run(settings: &RunSettings, pipeline: &Pipeline) {
    println!("runsample dry-run");
    println!("  sample    = {}", settings.sample);
    println!("  readsdir  = {}", settings.readsdir.display());
    println!("  reference = {}", settings.reference.display());
    println!("  outdir    = {}", settings.outdir.display());
    println!("  trim_qual = {}", settings.trim_qual);
    println!("  head_crop = {}", settings.head_crop);
    println!("  minth     = {}", settings.minth);
    println!("  CN        = {}", settings.cn);
    if let Some(ref cfg) = settings.config_path {
        println!("  config    = {}", cfg.display());
    }
    if let Some(ref dir) = settings.tmpdir {
        println!("  tmpdir    = {}", dir.display());
    }
    if let Some(ref dir) = settings.script_dir {
        println!("  scripts   = {}", dir.display());
    }
    println!();

    println!("stages ({}):", pipeline.len());
    for (i, stage) in pipeline.stages().iter().enumerate() {
        let fatal = if stage.is_fatal() { " (fatal)" } else { "" };
        println!("  {}. {}{fatal}", i + 1, stage.name());
        println!("      cmd: {}", stage.describe());
    }

    debug!("dry-run complete (no execution)");
}
