// src/workspace/publish.rs

//! Moving a finished workspace to its output directory.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::{Result, RunsampleError};
use crate::workspace::Workspace;

/// How a workspace reached its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The destination did not exist; the whole workspace became it.
    Renamed { dest: PathBuf },
    /// The destination was an existing empty directory; each top-level
    /// entry was moved into it and the scratch root removed.
    Merged { dest: PathBuf, entries: usize },
}

impl PublishOutcome {
    pub fn dest(&self) -> &Path {
        match self {
            PublishOutcome::Renamed { dest } | PublishOutcome::Merged { dest, .. } => dest,
        }
    }
}

/// Reject destinations a run could not publish into.
///
/// A missing destination or an existing empty directory is fine. Anything
/// else is a `WorkspaceConflict`. This only inspects the filesystem.
pub fn preflight_destination(dest: &Path) -> Result<()> {
    match fs::metadata(dest) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
        Ok(meta) if meta.is_dir() => {
            if fs::read_dir(dest)?.next().is_some() {
                Err(RunsampleError::WorkspaceConflict(dest.to_path_buf()))
            } else {
                Ok(())
            }
        }
        Ok(_) => Err(RunsampleError::WorkspaceConflict(dest.to_path_buf())),
    }
}

impl Workspace {
    /// Relocate the workspace to `dest`.
    ///
    /// Consumes the workspace: afterwards the scratch path no longer exists.
    /// Every file handle into the workspace must be closed first.
    pub fn publish(self, dest: &Path) -> Result<PublishOutcome> {
        preflight_destination(dest)?;
        let root = self.root;

        if dest.is_dir() {
            let mut entries = 0;
            for entry in fs::read_dir(&root)? {
                let entry = entry?;
                move_path(&entry.path(), &dest.join(entry.file_name()))?;
                entries += 1;
            }
            fs::remove_dir(&root)?;
            info!(
                from = %root.display(),
                to = %dest.display(),
                entries,
                "merged workspace into existing empty directory"
            );
            return Ok(PublishOutcome::Merged {
                dest: dest.to_path_buf(),
                entries,
            });
        }

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        move_path(&root, dest)?;
        info!(from = %root.display(), to = %dest.display(), "moved workspace");
        Ok(PublishOutcome::Renamed {
            dest: dest.to_path_buf(),
        })
    }
}

/// Rename `from` to `to`, copying then deleting when they sit on different
/// filesystems.
fn move_path(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            debug!(
                from = %from.display(),
                to = %to.display(),
                "rename crosses filesystems; copying instead"
            );
            copy_tree(from, to)?;
            if fs::symlink_metadata(from)?.is_dir() {
                fs::remove_dir_all(from)?;
            } else {
                fs::remove_file(from)?;
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Copy `from` to `to` without following symlinks. Links are recreated as
/// links pointing at the same target.
pub fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    let file_type = fs::symlink_metadata(from)?.file_type();
    if file_type.is_symlink() {
        copy_link(from, to)?;
    } else if file_type.is_dir() {
        fs::create_dir_all(to)?;
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            copy_tree(&entry.path(), &to.join(entry.file_name()))?;
        }
    } else {
        fs::copy(from, to)?;
    }
    Ok(())
}

#[cfg(unix)]
fn copy_link(from: &Path, to: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(from)?, to)
}

#[cfg(windows)]
fn copy_link(from: &Path, to: &Path) -> io::Result<()> {
    let target = fs::read_link(from)?;
    if fs::metadata(from).is_ok_and(|m| m.is_dir()) {
        std::os::windows::fs::symlink_dir(target, to)
    } else {
        std::os::windows::fs::symlink_file(target, to)
    }
}
