// tests/run_log.rs

use std::fs;

use regex::Regex;

use runsample::logging::{RunLog, RunLogLevel};
use runsample_test_utils::CaptureBuffer;

#[test]
fn records_are_timestamped_and_tagged() {
    let buf = CaptureBuffer::new();
    let log = buf.run_log("s1");

    log.info("--- Starting s1 ---");
    log.critical("boom");

    let lines = buf.lines();
    assert_eq!(lines.len(), 2);

    let re = Regex::new(
        r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3} -- (DEBUG|INFO|WARNING|CRITICAL) -- s1 -- .+$",
    )
    .unwrap();
    assert!(re.is_match(&lines[0]), "{}", lines[0]);
    assert!(lines[0].ends_with("-- INFO -- s1 -- --- Starting s1 ---"));
    assert!(lines[1].ends_with("-- CRITICAL -- s1 -- boom"));
}

#[test]
fn closed_log_stops_writing() {
    let buf = CaptureBuffer::new();
    let log = buf.run_log("s1");
    log.record(RunLogLevel::Warning, "before");
    assert!(!log.is_closed());

    log.close();
    log.close();
    assert!(log.is_closed());

    log.info("after");
    assert_eq!(buf.lines().len(), 1);
    assert!(buf.contents().contains("WARNING"));
}

#[test]
fn file_backed_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.log");

    let log = RunLog::create("s", &path).unwrap();
    assert_eq!(log.path(), Some(path.as_path()));
    log.debug("hello");
    drop(log);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("-- DEBUG -- s -- hello"));
}

#[test]
fn console_log_has_no_file() {
    let log = RunLog::console("s");
    assert!(log.path().is_none());
    assert!(log.is_closed());
    log.info("only on the console");
}
