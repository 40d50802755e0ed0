// tests/process_runner.rs

#![cfg(unix)]

use std::fs::{self, File};
use std::os::unix::fs::symlink;

use runsample::errors::RunsampleError;
use runsample::exec::{CommandLine, ProcessRunner, Redirect, StageIo, StderrRedirect, TokioProcessRunner};
use runsample_test_utils::with_timeout;

fn quiet() -> StageIo {
    StageIo {
        stdin: Redirect::Null,
        stdout: Redirect::Null,
        stderr: StderrRedirect::To(Redirect::Null),
    }
}

async fn exit_code(runner: &mut TokioProcessRunner, cmd: CommandLine, io: StageIo) -> i32 {
    let mut handle = runner.run(&cmd, io).unwrap();
    with_timeout(handle.wait()).await.unwrap()
}

#[tokio::test]
async fn reports_exit_codes() {
    let mut runner = TokioProcessRunner::new();

    let ok = CommandLine::new("true").on_path();
    assert_eq!(exit_code(&mut runner, ok, quiet()).await, 0);

    let three = CommandLine::new("sh").args(["-c", "exit 3"]).on_path();
    assert_eq!(exit_code(&mut runner, three, quiet()).await, 3);
}

#[tokio::test]
async fn signal_death_is_minus_one() {
    let mut runner = TokioProcessRunner::new();
    let cmd = CommandLine::new("sh").args(["-c", "kill -9 $$"]).on_path();
    assert_eq!(exit_code(&mut runner, cmd, quiet()).await, -1);
}

#[tokio::test]
async fn missing_program_is_command_not_found() {
    let mut runner = TokioProcessRunner::new();
    let cmd = CommandLine::new("definitely-not-a-real-program-xyz");

    match runner.run(&cmd, quiet()) {
        Err(RunsampleError::CommandNotFound(p)) => {
            assert!(p.contains("definitely-not-a-real-program-xyz"));
        }
        Err(e) => panic!("expected CommandNotFound, got {e:?}"),
        Ok(_) => panic!("expected CommandNotFound, got a process"),
    }
}

#[tokio::test]
async fn combined_sink_gets_both_streams() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("combined.log");
    let mut runner = TokioProcessRunner::new();

    let cmd = CommandLine::new("sh")
        .args(["-c", "echo out; echo err 1>&2"])
        .on_path();
    let code = exit_code(&mut runner, cmd, StageIo::combined(File::create(&log).unwrap())).await;

    assert_eq!(code, 0);
    let text = fs::read_to_string(&log).unwrap();
    assert!(text.contains("out\n"));
    assert!(text.contains("err\n"));
}

#[tokio::test]
async fn split_sink_separates_streams() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let err = dir.path().join("err.txt");
    let mut runner = TokioProcessRunner::new();

    let cmd = CommandLine::new("sh")
        .args(["-c", "echo product; echo noise 1>&2"])
        .on_path();
    let io = StageIo::split(File::create(&out).unwrap(), File::create(&err).unwrap());
    exit_code(&mut runner, cmd, io).await;

    assert_eq!(fs::read_to_string(&out).unwrap(), "product\n");
    assert_eq!(fs::read_to_string(&err).unwrap(), "noise\n");
}

#[tokio::test]
async fn programs_resolve_against_search_dir() {
    let bin = tempfile::tempdir().unwrap();
    symlink("/bin/echo", bin.path().join("hello.py")).unwrap();
    let out = bin.path().join("hello.out");

    let mut runner = TokioProcessRunner::with_search_dir(bin.path());
    assert_eq!(runner.search_dir(), Some(bin.path()));

    let cmd = CommandLine::new("hello.py").args(["a b", "c"]);
    let code = exit_code(&mut runner, cmd, StageIo::combined(File::create(&out).unwrap())).await;

    assert_eq!(code, 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "a b c\n");
}

#[tokio::test]
async fn search_dir_is_skipped_for_path_tools() {
    let bin = tempfile::tempdir().unwrap();
    let mut runner = TokioProcessRunner::with_search_dir(bin.path());

    let cmd = CommandLine::new("true").on_path();
    assert_eq!(exit_code(&mut runner, cmd, quiet()).await, 0);

    let cmd = CommandLine::new("true");
    assert!(matches!(
        runner.run(&cmd, quiet()),
        Err(RunsampleError::CommandNotFound(_))
    ));
}

#[tokio::test]
async fn non_executable_file_is_command_not_found() {
    let bin = tempfile::tempdir().unwrap();
    fs::write(bin.path().join("script.py"), "print('hi')\n").unwrap();
    let mut runner = TokioProcessRunner::with_search_dir(bin.path());

    assert!(matches!(
        runner.run(&CommandLine::new("script.py"), quiet()),
        Err(RunsampleError::CommandNotFound(_))
    ));
}

#[test]
fn command_line_display_quotes_spaces() {
    let cmd = CommandLine::new("tool.py").args(["plain", "with space", ""]);
    assert_eq!(cmd.to_string(), "tool.py plain 'with space' ''");
}
