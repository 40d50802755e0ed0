// src/workspace/mod.rs

//! Scratch workspace lifecycle.
//!
//! A run owns exactly one workspace: a uniquely named directory under the
//! scratch pool where every stage writes its outputs. The workspace is
//! snapshotted into its provenance log once the run is terminal and then
//! published to the requested output directory.
//!
//! - [`provenance`] is the content-addressed audit trail.
//! - [`publish`] moves a finished workspace to its final location and owns
//!   the destination pre-flight check.

pub mod provenance;
pub mod publish;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{Result, RunsampleError};
use crate::logging::RunLog;
use crate::types::RunStatus;

pub use provenance::{Commit, Provenance, TreeEntry, PROVENANCE_DIR};
pub use publish::{copy_tree, preflight_destination, PublishOutcome};

const WORKSPACE_SUFFIX: &str = "runsample";

#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    provenance: Option<Provenance>,
}

impl Workspace {
    /// Create a new, empty, uniquely named directory under `base_dir`
    /// (or the platform scratch directory when `None`).
    ///
    /// Safe to call concurrently from many runs sharing one base directory.
    pub fn create(base_dir: Option<&Path>, sample: &str) -> Result<Self> {
        let base = match base_dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::temp_dir(),
        };

        let dir = tempfile::Builder::new()
            .prefix(sample)
            .suffix(WORKSPACE_SUFFIX)
            .tempdir_in(&base)
            .map_err(|source| RunsampleError::WorkspaceCreate {
                base: base.clone(),
                source,
            })?;
        let root = dir.keep();

        debug!(root = %root.display(), "created scratch workspace");
        Ok(Self {
            root,
            provenance: None,
        })
    }

    /// Adopt an existing directory as a workspace.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            provenance: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    /// Initialise the provenance log. Failure only disables snapshots.
    pub fn init_provenance(&mut self, log: &RunLog) -> bool {
        match Provenance::init(&self.root) {
            Ok(p) => {
                log.debug(format!(
                    "Initialized provenance log in {}",
                    p.dir().display()
                ));
                self.provenance = Some(p);
                true
            }
            Err(e) => {
                log.warning(format!("Could not initialize provenance log: {e}"));
                false
            }
        }
    }

    /// Record one snapshot of the workspace.
    ///
    /// Returns the new commit, or `None` if nothing changed or the snapshot
    /// failed. Failures are logged as warnings and never propagate.
    pub fn commit_provenance(
        &self,
        message: &str,
        status: RunStatus,
        log: &RunLog,
    ) -> Option<Commit> {
        let Some(ref provenance) = self.provenance else {
            log.warning("Provenance log is not initialized; skipping snapshot");
            return None;
        };

        match provenance.commit(message, Some(status)) {
            Ok(Some(commit)) => {
                log.debug(format!(
                    "Recorded provenance commit {} ({} files)",
                    commit.id,
                    commit.tree.len()
                ));
                Some(commit)
            }
            Ok(None) => {
                log.debug("Workspace unchanged since last provenance commit");
                None
            }
            Err(e) => {
                log.warning(format!("Provenance commit failed: {e}"));
                None
            }
        }
    }
}
