//! # Hook Guard
//!
//! Version-control hooks must not fire while the working copy is being
//! archived, regenerated, and spliced back together. The guard relocates
//! `.git/hooks` into a private holding directory for the duration and
//! restores it afterwards.
//!
//! It also stages the lint configuration (`.pre-commit-config.yaml`) on
//! entry and unstages it on release: hooks that run during template
//! application fail on an unstaged modification of their own config
//! file, independent of whether the rendering engine invoked any hooks.
//!
//! Release is scope-guaranteed: `Drop` restores on error paths, while the
//! happy path calls [`HookGuard::finish`] explicitly before the final
//! replace step so the restored hooks travel with the tree that is moved
//! into place.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;
use crate::git::Git;
use crate::workspace::move_dir;

/// Lint configuration staged around template application.
pub const PRE_COMMIT_CONFIG: &str = ".pre-commit-config.yaml";

const HOOKS: &str = "hooks";

/// Scope guard bracketing template application for one repository.
pub struct HookGuard<'a> {
    git: &'a Git,
    repo: PathBuf,
    holding: TempDir,
    hooks_moved: bool,
    config_staged: bool,
    released: bool,
}

impl<'a> HookGuard<'a> {
    /// Stage the lint config (if present) and relocate the hooks
    /// directory out of the live tree.
    pub fn enter(repo: &Path, git: &'a Git) -> Result<Self> {
        let holding = TempDir::new()?;

        let config_staged = if repo.join(PRE_COMMIT_CONFIG).is_file() {
            git.add(repo, PRE_COMMIT_CONFIG)?;
            true
        } else {
            false
        };

        let hooks_dir = repo.join(".git").join(HOOKS);
        let hooks_moved = if hooks_dir.is_dir() {
            move_dir(&hooks_dir, &holding.path().join(HOOKS))?;
            log::debug!("relocated hooks for {}", repo.display());
            true
        } else {
            false
        };

        Ok(Self {
            git,
            repo: repo.to_path_buf(),
            holding,
            hooks_moved,
            config_staged,
            released: false,
        })
    }

    /// Restore hooks and unstage the lint config.
    ///
    /// Consumes the guard; after this the repository tree is back to
    /// normal and safe to move into its final location.
    pub fn finish(mut self) -> Result<()> {
        self.restore()
    }

    fn restore(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        if self.hooks_moved {
            let held = self.holding.path().join(HOOKS);
            let target = self.repo.join(".git").join(HOOKS);
            if held.is_dir() && self.repo.join(".git").is_dir() {
                move_dir(&held, &target)?;
            } else {
                log::warn!(
                    "cannot restore hooks for {}: tree no longer present",
                    self.repo.display()
                );
            }
        }

        if self.config_staged {
            if let Err(e) = self.git.reset(&self.repo, PRE_COMMIT_CONFIG) {
                log::debug!("unstaging {} failed: {}", PRE_COMMIT_CONFIG, e);
            }
        }

        Ok(())
    }
}

impl Drop for HookGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            log::warn!("hook restore failed for {}: {}", self.repo.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::{calls_matching, RecordingGit};
    use std::fs;
    use tempfile::TempDir;

    fn repo_with_git_dir() -> TempDir {
        let repo = TempDir::new().unwrap();
        fs::create_dir_all(repo.path().join(".git/hooks")).unwrap();
        fs::write(repo.path().join(".git/hooks/pre-commit"), b"#!/bin/sh\n").unwrap();
        repo
    }

    #[test]
    fn test_hooks_relocated_and_restored() {
        let repo = repo_with_git_dir();
        let (runner, _log) = RecordingGit::new();
        let git = Git::with_runner(Box::new(runner));

        {
            let guard = HookGuard::enter(repo.path(), &git).unwrap();
            assert!(!repo.path().join(".git/hooks").exists());
            guard.finish().unwrap();
        }
        assert!(repo.path().join(".git/hooks/pre-commit").is_file());
    }

    #[test]
    fn test_hooks_restored_on_drop() {
        let repo = repo_with_git_dir();
        let (runner, _log) = RecordingGit::new();
        let git = Git::with_runner(Box::new(runner));

        {
            let _guard = HookGuard::enter(repo.path(), &git).unwrap();
            assert!(!repo.path().join(".git/hooks").exists());
            // dropped without finish(), as on an error path
        }
        assert!(repo.path().join(".git/hooks/pre-commit").is_file());
    }

    #[test]
    fn test_lint_config_staged_and_unstaged() {
        let repo = repo_with_git_dir();
        fs::write(repo.path().join(PRE_COMMIT_CONFIG), b"repos: []\n").unwrap();
        let (runner, log) = RecordingGit::new();
        let git = Git::with_runner(Box::new(runner));

        HookGuard::enter(repo.path(), &git).unwrap().finish().unwrap();

        assert_eq!(calls_matching(&log, &["add"]).len(), 1);
        assert_eq!(calls_matching(&log, &["reset"]).len(), 1);
    }

    #[test]
    fn test_no_lint_config_no_git_calls() {
        let repo = repo_with_git_dir();
        let (runner, log) = RecordingGit::new();
        let git = Git::with_runner(Box::new(runner));

        HookGuard::enter(repo.path(), &git).unwrap().finish().unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_hooks_dir_is_fine() {
        let repo = TempDir::new().unwrap();
        fs::create_dir_all(repo.path().join(".git")).unwrap();
        let (runner, _log) = RecordingGit::new();
        let git = Git::with_runner(Box::new(runner));

        HookGuard::enter(repo.path(), &git).unwrap().finish().unwrap();
        assert!(!repo.path().join(".git/hooks").exists());
    }

    #[test]
    fn test_finish_is_idempotent_with_drop() {
        let repo = repo_with_git_dir();
        let (runner, log) = RecordingGit::new();
        let git = Git::with_runner(Box::new(runner));
        fs::write(repo.path().join(PRE_COMMIT_CONFIG), b"repos: []\n").unwrap();

        let guard = HookGuard::enter(repo.path(), &git).unwrap();
        guard.finish().unwrap();
        // Drop runs after finish; reset must not fire twice.
        assert_eq!(calls_matching(&log, &["reset"]).len(), 1);
    }
}
