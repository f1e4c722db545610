//! # Revert Selector
//!
//! After template application, an explicit set of paths is excluded from
//! the effect of re-templating: each is removed from the rendered tree
//! and restored to its last-committed content.
//!
//! A pattern may itself be a placeholder expression
//! (`{{ cookiecutter.project_slug }}`); it is resolved against the
//! just-built context before being treated as a literal path. An
//! unresolvable reference is deliberately treated as a literal filename,
//! not an error.
//!
//! Restore failures (no commits yet, detached state) are swallowed and
//! logged at debug level - the path is simply left absent.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::context::RenderContext;
use crate::error::Result;
use crate::git::Git;
use crate::workspace::{remove_path, ChdirGuard};

/// Resolve a single ignore pattern against the context.
///
/// Only a pattern that is entirely a `{{ cookiecutter.<key> }}`
/// expression is substituted, and only when `<key>` exists.
fn resolve_pattern(placeholder: &Regex, pattern: &Path, ctx: &RenderContext) -> PathBuf {
    let text = pattern.to_string_lossy();
    if let Some(caps) = placeholder.captures(&text) {
        if let Some(value) = ctx.get(&caps[1]) {
            return PathBuf::from(value);
        }
    }
    pattern.to_path_buf()
}

/// Restore the configured ignore paths in `repo` to their committed
/// state.
///
/// Operations run with the working directory pinned to the repository
/// root; the previous directory is restored on every exit path.
pub fn revert_ignored(
    patterns: &[PathBuf],
    repo: &Path,
    ctx: &RenderContext,
    git: &Git,
) -> Result<()> {
    if patterns.is_empty() {
        return Ok(());
    }

    let placeholder = Regex::new(r"^\{\{\s?cookiecutter\.([^\s}]+)\s?\}\}$")?;
    let _cwd = ChdirGuard::enter(repo)?;
    for pattern in patterns {
        let path = resolve_pattern(&placeholder, pattern, ctx);

        remove_path(&path)?;

        if let Err(e) = git.checkout_path(repo, &path.to_string_lossy()) {
            log::debug!(
                "committed restore of {} skipped: {}",
                path.display(),
                e.diagnostic()
            );
        }
    }

    Ok(())
}
