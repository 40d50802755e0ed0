// src/workspace/provenance.rs

//! Content-addressed provenance log for a workspace.
//!
//! Layout inside the workspace:
//!
//! ```text
//! .provenance/
//!   objects/<blake3>   one blob per distinct file content
//!   commits.jsonl      append-only, one JSON commit per line
//! ```
//!
//! A commit records the full tree (relative path, content hash, size) of the
//! workspace minus `.provenance/` itself. Committing an unchanged tree is a
//! no-op.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use blake3::Hasher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{Result, RunsampleError};
use crate::types::RunStatus;

pub const PROVENANCE_DIR: &str = ".provenance";
const OBJECTS_DIR: &str = "objects";
const COMMITS_FILE: &str = "commits.jsonl";

/// One file in a committed tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the workspace root, `/`-separated.
    pub path: String,
    pub hash: String,
    pub size: u64,
}

/// An immutable snapshot record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub parent: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(default)]
    pub status: Option<RunStatus>,
    pub tree: Vec<TreeEntry>,
}

#[derive(Debug, Clone)]
pub struct Provenance {
    workspace: PathBuf,
}

impl Provenance {
    /// Create an empty provenance log rooted at `workspace`.
    pub fn init(workspace: impl Into<PathBuf>) -> Result<Self> {
        let p = Self {
            workspace: workspace.into(),
        };
        p.init_layout().map_err(provenance_err)?;
        Ok(p)
    }

    /// Open an existing provenance log.
    pub fn open(workspace: impl Into<PathBuf>) -> Result<Self> {
        let p = Self {
            workspace: workspace.into(),
        };
        if !p.commits_path().is_file() {
            return Err(RunsampleError::Provenance(format!(
                "no provenance log in {:?}",
                p.workspace
            )));
        }
        Ok(p)
    }

    pub fn dir(&self) -> PathBuf {
        self.workspace.join(PROVENANCE_DIR)
    }

    fn objects_dir(&self) -> PathBuf {
        self.dir().join(OBJECTS_DIR)
    }

    fn commits_path(&self) -> PathBuf {
        self.dir().join(COMMITS_FILE)
    }

    /// Path of the stored blob for `hash`.
    pub fn object_path(&self, hash: &str) -> PathBuf {
        self.objects_dir().join(hash)
    }

    fn init_layout(&self) -> anyhow::Result<()> {
        let objects = self.objects_dir();
        fs::create_dir_all(&objects)
            .with_context(|| format!("creating provenance objects dir at {:?}", objects))?;
        let commits = self.commits_path();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&commits)
            .with_context(|| format!("creating provenance log at {:?}", commits))?;
        Ok(())
    }

    /// All commits, oldest first.
    pub fn commits(&self) -> Result<Vec<Commit>> {
        self.read_commits().map_err(provenance_err)
    }

    /// The most recent commit, if any.
    pub fn head(&self) -> Result<Option<Commit>> {
        Ok(self.commits()?.pop())
    }

    /// Snapshot the workspace. Returns `None` when the tree is unchanged.
    pub fn commit(&self, message: &str, status: Option<RunStatus>) -> Result<Option<Commit>> {
        self.commit_inner(message, status).map_err(provenance_err)
    }

    fn commit_inner(
        &self,
        message: &str,
        status: Option<RunStatus>,
    ) -> anyhow::Result<Option<Commit>> {
        let parent = self.read_commits()?.pop();
        let tree = self.snapshot_tree()?;

        if let Some(ref head) = parent {
            if head.tree == tree {
                debug!(head = %head.id, "workspace tree unchanged; no commit");
                return Ok(None);
            }
        }

        let timestamp = Utc::now();
        let parent_id = parent.map(|c| c.id);
        let id = commit_id(parent_id.as_deref(), &timestamp, message, &tree);

        let commit = Commit {
            id,
            parent: parent_id,
            timestamp,
            message: message.to_string(),
            status,
            tree,
        };

        let path = self.commits_path();
        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .with_context(|| format!("opening provenance log at {:?}", path))?;
        let line = serde_json::to_string(&commit).context("serializing provenance commit")?;
        writeln!(file, "{line}")?;
        file.flush()?;

        Ok(Some(commit))
    }

    fn read_commits(&self) -> anyhow::Result<Vec<Commit>> {
        let path = self.commits_path();
        let file = File::open(&path)
            .with_context(|| format!("opening provenance log at {:?}", path))?;
        let mut commits = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let commit: Commit = serde_json::from_str(&line)
                .with_context(|| format!("parsing provenance commit on line {}", lineno + 1))?;
            commits.push(commit);
        }
        Ok(commits)
    }

    /// Hash every file in the workspace, storing unseen blobs.
    fn snapshot_tree(&self) -> anyhow::Result<Vec<TreeEntry>> {
        let mut files = Vec::new();
        collect_files(&self.workspace, &self.workspace, &mut files)?;
        files.sort();

        let objects = self.objects_dir();
        let mut tree = Vec::with_capacity(files.len());
        for rel in files {
            let abs = self.workspace.join(&rel);
            let (hash, size) = hash_file(&abs)?;
            let blob = objects.join(&hash);
            if !blob.exists() {
                fs::copy(&abs, &blob)
                    .with_context(|| format!("storing blob for {:?}", abs))?;
            }
            tree.push(TreeEntry {
                path: rel_to_string(&rel),
                hash,
                size,
            });
        }
        Ok(tree)
    }
}

fn provenance_err(e: anyhow::Error) -> RunsampleError {
    RunsampleError::Provenance(format!("{e:#}"))
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("reading dir {:?}", dir))? {
        let entry = entry?;
        let path = entry.path();
        let rel = path
            .strip_prefix(root)
            .map_err(|_| anyhow!("{:?} is outside the workspace", path))?
            .to_path_buf();
        if rel.as_os_str() == PROVENANCE_DIR {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(root, &path, out)?;
        } else if file_type.is_file() {
            out.push(rel);
        }
    }
    Ok(())
}

fn rel_to_string(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// blake3 of a file's contents, plus its size.
fn hash_file(path: &Path) -> anyhow::Result<(String, u64)> {
    let mut hasher = Hasher::new();
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    let mut size = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        size += n as u64;
        hasher.update(&buf[..n]);
    }
    Ok((hasher.finalize().to_hex().to_string(), size))
}

fn commit_id(
    parent: Option<&str>,
    timestamp: &DateTime<Utc>,
    message: &str,
    tree: &[TreeEntry],
) -> String {
    let mut hasher = Hasher::new();
    hasher.update(parent.unwrap_or("").as_bytes());
    hasher.update(b"\n");
    hasher.update(timestamp.to_rfc3339().as_bytes());
    hasher.update(b"\n");
    hasher.update(message.as_bytes());
    hasher.update(b"\n");
    for entry in tree {
        hasher.update(entry.path.as_bytes());
        hasher.update(b"\0");
        hasher.update(entry.hash.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}
