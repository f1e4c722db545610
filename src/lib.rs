//! # Retemplate Library
//!
//! This library provides the core functionality for re-applying an
//! evolving cookiecutter template to existing repositories. It is
//! designed to be used by the `retemplate` command-line tool but can
//! also be integrated into other applications that regenerate
//! repository boilerplate.
//!
//! ## Quick Example
//!
//! ```
//! use retemplate::context::RenderContext;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = dir.path().join("cookiecutter.json");
//! std::fs::write(
//!     &config,
//!     r#"{"project_name": "Demo", "project_slug": "{{cookiecutter.project_name|lower}}"}"#,
//! )
//! .unwrap();
//!
//! let mut ctx = RenderContext::load(&config).unwrap();
//! ctx.resolve().unwrap();
//! assert_eq!(ctx.get("project_slug"), Some("demo"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Render Context (`context`)**: the merged variable mapping handed
//!   to the template engine - template defaults overlaid with repository
//!   metadata, with self-referential placeholders resolved once per
//!   repository.
//! - **Snapshot Store (`snapshot`)**: content-addressed archive of
//!   pre-render repository states; the archived version-control
//!   directory is spliced back into the rendered tree so history always
//!   survives regeneration.
//! - **Hook Guard (`hooks`)**: relocates version-control hooks and
//!   stages the lint configuration around template application, restored
//!   on every exit path.
//! - **Revert Selector (`revert`)**: restores an explicit set of paths
//!   to their last-committed content after rendering.
//! - **Pipeline (`pipeline`)**: the per-repository state machine
//!   (`Init -> Validated -> Archived -> Rendered -> Reverted -> Done`)
//!   and the sequential multi-repository driver.
//!
//! ## Execution Flow
//!
//! For each repository, the `pipeline` module executes these steps:
//!
//! 1.  **Validate**: the path exists, is under version control, and
//!     carries a `pyproject.toml` manifest (anything else is a warning
//!     and a skip).
//! 2.  **Contextualize**: derive template variables from the manifest
//!     and resolve the merged mapping, fresh for this repository.
//! 3.  **Archive**: copy the repository into scratch space, stash
//!     uncommitted changes, optionally check out a branch, and move the
//!     copy into the content-addressed archive.
//! 4.  **Render**: invoke the external template engine on the scratch
//!     template, then splice the archived version-control directory back
//!     into the rendered tree.
//! 5.  **Revert**: restore ignored paths to their committed content.
//! 6.  **Replace**: swap the rendered tree into the original location.
//!
//! All mutation happens on scratch copies until the final replace, so an
//! interruption at any earlier point leaves the template and the
//! original repository unmodified.

pub mod context;
pub mod error;
pub mod git;
pub mod hooks;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod revert;
pub mod snapshot;
pub mod workspace;
