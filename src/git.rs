//! # Version-Control Client
//!
//! A thin wrapper around the system `git` command. The core only depends
//! on a small contract - stash, checkout of paths, checkout of
//! refs/branches, add, reset - each of which either succeeds or fails
//! with captured diagnostic text.
//!
//! ## Design
//!
//! Command execution goes through the [`GitRunner`] trait so that tests
//! can substitute a fake runner and simulate failures without a real
//! repository. [`SystemGit`] is the production implementation; it uses the
//! system `git` binary, which automatically handles SSH keys, credential
//! helpers, and anything else configured in `~/.gitconfig`.
//!
//! Output is always captured, never inherited: hook output and stash
//! chatter must not leak into the per-repository report lines.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Captured result of a git invocation.
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Trait for executing git commands - allows mocking in tests.
pub trait GitRunner {
    /// Run `git <args>` with `cwd` as the working directory, capturing
    /// stdout and stderr. A non-zero exit is returned as `Ok` with the
    /// captured output; `Err` is reserved for spawn failures.
    fn run(&self, cwd: &Path, args: &[&str]) -> Result<GitOutput>;
}

/// The default implementation of [`GitRunner`], shelling out to the
/// system `git` binary.
pub struct SystemGit;

impl GitRunner for SystemGit {
    fn run(&self, cwd: &Path, args: &[&str]) -> Result<GitOutput> {
        log::debug!("git {} (cwd: {})", args.join(" "), cwd.display());
        let output = Command::new("git").args(args).current_dir(cwd).output()?;

        Ok(GitOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// High-level facade over a [`GitRunner`] exposing the narrow contract
/// the pipeline needs.
pub struct Git {
    runner: Box<dyn GitRunner>,
}

impl Git {
    /// Create a facade over the system `git` binary.
    pub fn new() -> Self {
        Self {
            runner: Box::new(SystemGit),
        }
    }

    /// Create a facade over a custom runner.
    ///
    /// This is primarily used for testing to inject fake git behavior.
    pub fn with_runner(runner: Box<dyn GitRunner>) -> Self {
        Self { runner }
    }

    fn exec(&self, cwd: &Path, args: &[&str]) -> Result<GitOutput> {
        let output = self.runner.run(cwd, args)?;
        if output.status != 0 {
            return Err(Error::GitCommand {
                command: args.join(" "),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Set aside uncommitted changes so later steps operate on a clean
    /// tree.
    pub fn stash(&self, cwd: &Path) -> Result<()> {
        self.exec(cwd, &["stash"])?;
        Ok(())
    }

    /// Check out an existing ref (branch, tag, or commit).
    pub fn checkout_ref(&self, cwd: &Path, rev: &str) -> Result<()> {
        self.exec(cwd, &["checkout", rev])?;
        Ok(())
    }

    /// Create and check out a new branch.
    pub fn checkout_new_branch(&self, cwd: &Path, name: &str) -> Result<()> {
        self.exec(cwd, &["checkout", "-b", name])?;
        Ok(())
    }

    /// Restore a path to its last-committed content (`checkout HEAD -- <path>`).
    pub fn checkout_path(&self, cwd: &Path, path: &str) -> Result<()> {
        self.exec(cwd, &["checkout", "HEAD", "--", path])?;
        Ok(())
    }

    /// Stage a path.
    pub fn add(&self, cwd: &Path, path: &str) -> Result<()> {
        self.exec(cwd, &["add", path])?;
        Ok(())
    }

    /// Unstage a path.
    pub fn reset(&self, cwd: &Path, path: &str) -> Result<()> {
        self.exec(cwd, &["reset", path])?;
        Ok(())
    }
}

impl Default for Git {
    fn default() -> Self {
        Self::new()
    }
}
