//! # Scratch Workspace
//!
//! All mutation happens inside an exclusively-owned temporary directory:
//! the template is copied here before its variable manifest is rewritten,
//! and each repository is copied here before being archived, rendered,
//! and finally moved back into place. The canonical template and the
//! original repository are never touched until the last replace step.
//!
//! The workspace is scope-bound: `tempfile::TempDir` removes it on every
//! exit path, including early returns and panics. Working-directory
//! changes go through [`ChdirGuard`], which restores the previous
//! directory when dropped.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

use crate::error::Result;

/// Exclusively-owned scratch directory for one run.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh scratch directory.
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Root path of the scratch directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Recursively copy a directory tree.
///
/// Symlinks are followed; permissions carry over through `fs::copy`.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir yields children of src");
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Move a directory, falling back to copy-and-remove across filesystems.
///
/// The cache root and the scratch workspace commonly live on different
/// mounts, where `rename` fails with `EXDEV`.
pub fn move_dir(src: &Path, dst: &Path) -> Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            copy_dir(src, dst)?;
            fs::remove_dir_all(src)?;
            Ok(())
        }
    }
}

/// Remove a file or directory tree if it exists.
pub fn remove_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// RAII guard that changes the process working directory and restores
/// the previous one on drop.
///
/// The working directory is process-global state; never change it
/// without going through this guard.
pub struct ChdirGuard {
    previous: PathBuf,
}

impl ChdirGuard {
    pub fn enter(path: &Path) -> Result<Self> {
        let previous = std::env::current_dir()?;
        std::env::set_current_dir(path)?;
        Ok(Self { previous })
    }
}

impl Drop for ChdirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            log::warn!(
                "failed to restore working directory to {}: {}",
                self.previous.display(),
                e
            );
        }
    }
}
