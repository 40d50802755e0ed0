// tests/provenance.rs

use std::fs;

use runsample::logging::RunLog;
use runsample::types::RunStatus;
use runsample::workspace::{Provenance, Workspace, PROVENANCE_DIR};
use runsample_test_utils::CaptureBuffer;

#[test]
fn init_creates_layout() {
    let dir = tempfile::tempdir().unwrap();
    let prov = Provenance::init(dir.path()).unwrap();

    assert_eq!(prov.dir(), dir.path().join(PROVENANCE_DIR));
    assert!(prov.dir().join("objects").is_dir());
    assert!(prov.dir().join("commits.jsonl").is_file());
    assert!(prov.commits().unwrap().is_empty());
    assert!(prov.head().unwrap().is_none());

    // Reopening finds the same log.
    Provenance::open(dir.path()).unwrap();
}

#[test]
fn open_without_log_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Provenance::open(dir.path()).is_err());
}

#[test]
fn commit_records_sorted_tree_and_stores_blobs() {
    let dir = tempfile::tempdir().unwrap();
    let prov = Provenance::init(dir.path()).unwrap();
    fs::write(dir.path().join("z.txt"), "zzz").unwrap();
    fs::create_dir(dir.path().join("trimmed_reads")).unwrap();
    fs::write(dir.path().join("trimmed_reads").join("a.fastq"), "@a\n").unwrap();

    let commit = prov
        .commit("first", Some(RunStatus::Succeeded))
        .unwrap()
        .expect("a commit");

    let paths: Vec<_> = commit.tree.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["trimmed_reads/a.fastq", "z.txt"]);
    assert!(commit.parent.is_none());
    assert_eq!(commit.message, "first");
    assert_eq!(commit.status, Some(RunStatus::Succeeded));

    let z = &commit.tree[1];
    assert_eq!(z.size, 3);
    assert_eq!(fs::read_to_string(prov.object_path(&z.hash)).unwrap(), "zzz");

    assert_eq!(prov.head().unwrap(), Some(commit));
}

#[test]
fn unchanged_tree_is_not_committed_again() {
    let dir = tempfile::tempdir().unwrap();
    let prov = Provenance::init(dir.path()).unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();

    assert!(prov.commit("one", None).unwrap().is_some());
    assert!(prov.commit("two", None).unwrap().is_none());
    assert_eq!(prov.commits().unwrap().len(), 1);
}

#[test]
fn changed_tree_chains_to_parent() {
    let dir = tempfile::tempdir().unwrap();
    let prov = Provenance::init(dir.path()).unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    let first = prov.commit("one", None).unwrap().unwrap();

    fs::write(dir.path().join("a.txt"), "changed").unwrap();
    let second = prov.commit("two", None).unwrap().unwrap();

    assert_eq!(second.parent.as_deref(), Some(first.id.as_str()));
    assert_ne!(second.id, first.id);
    assert_ne!(second.tree[0].hash, first.tree[0].hash);

    // Both versions of the file are retrievable.
    assert_eq!(fs::read_to_string(prov.object_path(&first.tree[0].hash)).unwrap(), "a");
    assert_eq!(
        fs::read_to_string(prov.object_path(&second.tree[0].hash)).unwrap(),
        "changed"
    );
    assert_eq!(prov.commits().unwrap(), vec![first, second]);
}

#[test]
fn empty_workspace_commits_empty_tree() {
    let dir = tempfile::tempdir().unwrap();
    let prov = Provenance::init(dir.path()).unwrap();

    let commit = prov.commit("empty", None).unwrap().unwrap();
    assert!(commit.tree.is_empty());
}

#[test]
fn workspace_commit_without_init_only_warns() {
    let dir = tempfile::tempdir().unwrap();
    let ws = Workspace::open(dir.path());
    let buf = CaptureBuffer::new();
    let log = buf.run_log("prov");

    assert!(ws.commit_provenance("run", RunStatus::Failed, &log).is_none());
    assert!(buf.contents().contains("-- WARNING -- prov -- Provenance log is not initialized"));
}

#[test]
fn workspace_commit_after_init() {
    let dir = tempfile::tempdir().unwrap();
    let mut ws = Workspace::open(dir.path());
    let buf = CaptureBuffer::new();
    let log = buf.run_log("prov");

    assert!(ws.init_provenance(&log));
    fs::write(dir.path().join("x.bam"), "bam").unwrap();

    let commit = ws.commit_provenance("run", RunStatus::Succeeded, &log).unwrap();
    assert_eq!(commit.tree.len(), 1);
    assert!(ws.commit_provenance("again", RunStatus::Succeeded, &log).is_none());
    assert!(ws.provenance().is_some());
}

#[test]
fn corrupt_log_is_reported_not_panicked() {
    let dir = tempfile::tempdir().unwrap();
    let mut ws = Workspace::open(dir.path());
    let buf = CaptureBuffer::new();
    let log: RunLog = buf.run_log("bad");
    ws.init_provenance(&log);

    fs::write(
        dir.path().join(PROVENANCE_DIR).join("commits.jsonl"),
        "not json\n",
    )
    .unwrap();

    assert!(ws.commit_provenance("run", RunStatus::Failed, &log).is_none());
    assert!(buf.contents().contains("Provenance commit failed"));
}
