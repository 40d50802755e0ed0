// tests/pipeline_scenarios.rs

mod common;
use crate::common::{entry_names, init_tracing, read_commits, six_stage_pipeline};

use std::fs;
use std::path::PathBuf;

use runsample::run_pipeline;
use runsample::types::RunStatus;
use runsample_test_utils::builders::RunFixture;
use runsample_test_utils::fake_executor::ScriptedRunner;
use runsample_test_utils::with_timeout;

#[tokio::test]
async fn alignment_failure_aborts_and_leaves_workspace() {
    init_tracing();
    let fx = RunFixture::new("s1");
    let runner = ScriptedRunner::new().exit_code("align.sh", 1);

    let report = with_timeout(run_pipeline(
        &fx.settings(),
        &six_stage_pipeline(),
        runner.clone(),
    ))
    .await
    .unwrap();

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[1].stage, "align");
    assert_eq!(report.results[1].exit_code, 1);
    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.exit_code, 1);
    assert!(!report.published);

    // Nothing after the aligner was started.
    assert_eq!(runner.programs(), vec!["trim.sh", "align.sh"]);

    // Workspace is still in the scratch pool, unpublished and uncommitted.
    assert!(!fx.outdir().exists());
    assert_eq!(fx.scratch_entries(), vec![report.location.clone()]);
    assert!(read_commits(&report.location).is_empty());

    let log = fs::read_to_string(report.location.join("s1.log")).unwrap();
    assert!(log.contains("did not exit successfully"));
    assert!(log.contains("failed to complete successfully. Please check the log file"));
    assert!(log.contains("bwa.log"));
    assert!(log.contains("!!! There was an error running part of the pipeline !!!"));
}

#[tokio::test]
async fn all_stages_succeed_commit_and_publish() {
    init_tracing();
    let fx = RunFixture::new("s2");
    let runner = ScriptedRunner::new().stdout("stats.sh", "42 + 0 in total\n");

    let report = with_timeout(run_pipeline(
        &fx.settings(),
        &six_stage_pipeline(),
        runner.clone(),
    ))
    .await
    .unwrap();

    assert_eq!(report.results.len(), 6);
    assert!(report.results.iter().all(|r| r.exit_code == 0));
    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.exit_code, 0);
    assert!(report.published);
    assert_eq!(report.location, fx.outdir());

    // Scratch path is gone.
    assert!(fx.scratch_entries().is_empty());

    let out = fx.outdir();
    let names = entry_names(&out);
    for expected in [".provenance", "bwa.log", "flagstats.txt", "ref.fasta", "s2.log", "s2.std.log"] {
        assert!(names.contains(&expected.to_string()), "missing {expected} in {names:?}");
    }
    assert_eq!(
        fs::read_to_string(out.join("flagstats.txt")).unwrap(),
        "42 + 0 in total\n"
    );

    let commits = read_commits(&out);
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].status, Some(RunStatus::Succeeded));
    assert!(commits[0].tree.iter().any(|e| e.path == "ref.fasta"));

    let log = fs::read_to_string(out.join("s2.log")).unwrap();
    assert!(log.contains("--- Starting s2 ---"));
    assert!(log.contains("--- Finished s2 ---"));
}

/// Writes `path` with a one-line body naming the stage that made it.
fn touch(path: &str, stage: &str) {
    fs::write(path, format!("{stage}\n")).unwrap();
}

#[tokio::test]
async fn recoverable_failure_runs_everything_and_publishes() {
    init_tracing();
    let fx = RunFixture::new("s3");
    let runner = ScriptedRunner::new()
        .on_run("trim.sh", |c| {
            fs::create_dir_all(&c.args[2]).unwrap();
            touch(&format!("{}/r1.fastq", c.args[2]), "trim");
        })
        .on_run("align.sh", |c| touch(&c.args[3], "align"))
        .on_run("tag.sh", |c| touch(&format!("{}.bai", c.args[0]), "tag"))
        .on_run("call.sh", |c| touch(&c.args[2], "call"))
        .stdout("stats.sh", "partial\n")
        .exit_code("stats.sh", 2)
        .on_run("consensus.sh", |c| touch(&c.args[4], "consensus"));

    let report = with_timeout(run_pipeline(
        &fx.settings(),
        &six_stage_pipeline(),
        runner.clone(),
    ))
    .await
    .unwrap();

    assert_eq!(report.results.len(), 6);
    assert_eq!(report.results[4].stage, "stats");
    assert_eq!(report.results[4].exit_code, 2);
    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.exit_code, 1);
    assert!(report.published);

    // Every stage executed exactly once.
    assert_eq!(
        runner.programs(),
        vec!["trim.sh", "align.sh", "tag.sh", "call.sh", "stats.sh", "consensus.sh"]
    );

    // Partial results from every stage made it to the destination.
    let out = fx.outdir();
    for artifact in [
        "trimmed_reads/r1.fastq",
        "s3.bam",
        "s3.bam.bai",
        "s3.bam.vcf",
        "flagstats.txt",
        "s3.bam.consensus.fasta",
        "bwa.log",
        "s3.log",
        "s3.std.log",
    ] {
        assert!(out.join(artifact).is_file(), "missing {artifact}");
    }
    assert_eq!(fs::read_to_string(out.join("flagstats.txt")).unwrap(), "partial\n");
    assert!(fx.scratch_entries().is_empty());

    let commits = read_commits(&out);
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].status, Some(RunStatus::Failed));
    assert!(commits[0].tree.iter().any(|e| e.path == "s3.bam.consensus.fasta"));

    let log = fs::read_to_string(out.join("s3.log")).unwrap();
    assert!(log.contains("stats.sh"));
    assert!(log.contains("did not exit successfully"));
    assert!(!log.contains("--- Finished s3 ---"));

    // The log names itself where it ended up, not in the scratch pool.
    let reported = log
        .lines()
        .find_map(|l| l.split("Please check the logfile ").nth(1))
        .unwrap();
    assert_eq!(PathBuf::from(reported), out.join("s3.log"));
    assert!(PathBuf::from(reported).is_file());

    // Stage log paths in the report point into the destination too.
    for result in &report.results {
        assert!(result.log.starts_with(&out), "{}", result.log.display());
        assert!(result.log.is_file(), "{}", result.log.display());
    }
}

#[tokio::test]
async fn missing_program_is_recorded_as_127() {
    init_tracing();
    let fx = RunFixture::new("s4");
    let runner = ScriptedRunner::new().missing("tag.sh");

    let report = run_pipeline(&fx.settings(), &six_stage_pipeline(), runner)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 6);
    assert_eq!(report.results[2].exit_code, 127);
    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.published);
}

#[tokio::test]
async fn missing_fatal_program_aborts() {
    init_tracing();
    let fx = RunFixture::new("s5");
    let runner = ScriptedRunner::new().missing("align.sh");

    let report = run_pipeline(&fx.settings(), &six_stage_pipeline(), runner)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[1].exit_code, 127);
    assert!(!report.published);
    assert!(report.location.starts_with(fx.scratch()));
}

#[tokio::test]
async fn results_carry_rendered_commands_and_sinks() {
    init_tracing();
    let fx = RunFixture::new("s6");
    let runner = ScriptedRunner::new();

    let report = run_pipeline(&fx.settings(), &six_stage_pipeline(), runner.clone())
        .await
        .unwrap();

    let tag = &report.results[2];
    assert!(tag.command.starts_with("tag.sh "));
    assert!(tag.command.ends_with("s6.bam -CN Unknown"));
    assert!(tag.finished_at >= tag.started_at);

    let file_name = |p: &PathBuf| p.file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(file_name(&report.results[0].log), "s6.std.log");
    assert_eq!(file_name(&report.results[1].log), "bwa.log");
    assert_eq!(file_name(&report.results[4].log), "flagstats.txt");

    let align = runner.invocation("align.sh").unwrap();
    assert!(align.args[1].ends_with("ref.fasta"));
    assert_ne!(PathBuf::from(&align.args[1]), fx.reference());
}
