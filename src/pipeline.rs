//! # Re-templating Pipeline
//!
//! The top-level per-repository state machine
//! (`Init -> Validated -> Archived -> Rendered -> Reverted -> Done`) and
//! the sequential multi-repository driver.
//!
//! Repositories are processed one at a time, in the order supplied. All
//! mutation happens on scratch copies; the original repository path is
//! replaced only at the very end of a successful pipeline, which is what
//! makes interruption safe: an abort at any earlier point leaves both
//! the canonical template and the original repository unmodified, and
//! the scratch workspace is torn down by RAII on every exit path.
//!
//! Every repository-scoped failure is converted into a warning line and
//! processing continues with the next repository; only
//! [`Error::Interrupted`] escapes this boundary.

use std::path::{Path, PathBuf};

use crate::context::{RenderContext, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::git::Git;
use crate::hooks::HookGuard;
use crate::manifest::{ProjectManifest, TemplateMetadata, MANIFEST_FILE};
use crate::output::{report, OutputConfig, Severity};
use crate::render::TemplateRenderer;
use crate::revert::revert_ignored;
use crate::snapshot::{dir_hash, SnapshotStore};
use crate::workspace::{copy_dir, move_dir, remove_path, Workspace};

/// A branch-checkout request applied to every repository.
#[derive(Debug, Clone)]
pub struct BranchRequest {
    /// Existing ref to check out first.
    pub rev: String,
    /// Branch to create and check out from it.
    pub new_branch: String,
}

/// Options for one run of the pipeline.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Permit template-declared pre/post hooks to execute.
    pub accept_hooks: bool,
    /// Delete archived snapshots before processing.
    pub gc: bool,
    /// Optional branch checkout applied per repository.
    pub branch: Option<BranchRequest>,
    /// Repository-relative paths restored to committed state after
    /// rendering; placeholder expressions allowed.
    pub ignore: Vec<PathBuf>,
}

/// Per-repository result, after the fact.
#[derive(Debug)]
enum RepoOutcome {
    Succeeded,
    Skipped(String),
}

/// Scratch-space paths shared by all repositories in one run.
struct Scratch {
    root: PathBuf,
    template: PathBuf,
}

/// The pipeline with its injected collaborators.
///
/// Nothing here is global state: the git client, the rendering engine,
/// and the snapshot store are constructed once per run and passed in
/// explicitly, so tests can substitute fakes for all of them.
pub struct Pipeline<'a> {
    git: &'a Git,
    renderer: &'a dyn TemplateRenderer,
    store: &'a SnapshotStore,
    out: &'a OutputConfig,
    opts: RunOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        git: &'a Git,
        renderer: &'a dyn TemplateRenderer,
        store: &'a SnapshotStore,
        out: &'a OutputConfig,
        opts: RunOptions,
    ) -> Self {
        Self {
            git,
            renderer,
            store,
            out,
            opts,
        }
    }

    /// Process every repository against the template at `template`.
    ///
    /// Returns `Ok` when the command ran to completion, regardless of
    /// per-repository skips; only fatal conditions (interrupt, workspace
    /// setup failure) surface as `Err`.
    pub fn run(&self, template: &Path, repos: &[PathBuf]) -> Result<()> {
        if self.opts.gc && self.store.gc()? {
            report(
                self.out,
                Severity::Info,
                &self.store.root().display().to_string(),
                "cleaning",
            );
        }

        // The canonical template is copied once per run; only its scratch
        // copy ever gets a rewritten variable manifest.
        let workspace = Workspace::new()?;
        let template_name = template
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "template".to_string());
        let scratch = Scratch {
            root: workspace.path().to_path_buf(),
            template: workspace.path().join(&template_name),
        };
        copy_dir(template, &scratch.template)?;

        for repo in repos {
            let name = repo_name(repo);
            match self.process_repo(repo, &name, template, &scratch) {
                Ok(RepoOutcome::Succeeded) => {
                    report(self.out, Severity::Info, &name, "success");
                }
                Ok(RepoOutcome::Skipped(message)) => {
                    report(self.out, Severity::Warning, &name, &message);
                }
                Err(Error::Interrupted) => return Err(Error::Interrupted),
                Err(e) => {
                    report(self.out, Severity::Warning, &name, &e.diagnostic());
                }
            }
        }

        Ok(())
    }

    /// Drive one repository through the state machine.
    fn process_repo(
        &self,
        repo: &Path,
        name: &str,
        template: &Path,
        scratch: &Scratch,
    ) -> Result<RepoOutcome> {
        // Init -> Validated
        if !repo.is_dir() {
            return Ok(RepoOutcome::Skipped("does not exist".to_string()));
        }
        if !repo.join(".git").is_dir() {
            return Ok(RepoOutcome::Skipped("not a repository".to_string()));
        }
        if !repo.join(MANIFEST_FILE).is_file() {
            return Ok(RepoOutcome::Skipped(format!("missing {MANIFEST_FILE}")));
        }

        // Fresh context per repository, from the canonical template
        // config. Entry-point detection runs against the original tree,
        // before any mutation.
        let mut ctx = RenderContext::load(&template.join(CONFIG_FILE))?;
        let manifest = ProjectManifest::load(repo)?;
        ctx.merge(&TemplateMetadata::from_manifest(&manifest, repo));
        ctx.resolve()?;
        ctx.write(&scratch.template.join(CONFIG_FILE))?;

        // Validated -> Archived
        let scratch_repo = scratch.root.join(name);
        copy_dir(repo, &scratch_repo)?;
        let guard = HookGuard::enter(&scratch_repo, self.git)?;

        let vcs_hash = dir_hash(&repo.join(".git"))?;
        let entry = self.store.entry_path(name, &vcs_hash);

        self.git.stash(&scratch_repo)?;
        if let Some(branch) = &self.opts.branch {
            // Either checkout step failing aborts this repository; the
            // original and the scratch copy are both left as they are.
            let checkout = self
                .git
                .checkout_ref(&scratch_repo, &branch.rev)
                .and_then(|()| self.git.checkout_new_branch(&scratch_repo, &branch.new_branch));
            if let Err(e) = checkout {
                return Ok(RepoOutcome::Skipped(e.diagnostic()));
            }
        }

        self.store.archive(&scratch_repo, &entry)?;

        // Archived -> Rendered
        self.renderer
            .render(&scratch.template, &scratch.root, self.opts.accept_hooks)?;
        let rendered_repo = scratch.root.join(name);
        if !rendered_repo.is_dir() {
            return Err(Error::Render {
                message: format!("rendered tree not found at {}", rendered_repo.display()),
            });
        }

        // History continuity wins over anything the template created.
        remove_path(&rendered_repo.join(".git"))?;
        self.store.restore_vcs_dir(&entry, &rendered_repo)?;

        // Rendered -> Reverted
        revert_ignored(&self.opts.ignore, &rendered_repo, &ctx, self.git)?;

        // Release the hook guard before the final replace so the
        // restored hooks travel with the tree being moved into place.
        guard.finish()?;

        // Reverted -> Done
        remove_path(repo)?;
        move_dir(&rendered_repo, repo)?;

        Ok(RepoOutcome::Succeeded)
    }
}

/// Repository display name: the final path segment.
fn repo_name(repo: &Path) -> String {
    repo.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| repo.display().to_string())
}
