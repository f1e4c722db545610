//! # Template Engine Boundary
//!
//! The rendering engine is an external collaborator: it receives a
//! template directory plus the variable manifest written next to it and
//! produces a rendered directory tree, possibly running template-declared
//! pre/post hooks. It is treated as an opaque black box.
//!
//! [`TemplateRenderer`] is the seam; [`CookiecutterCli`] is the
//! production implementation shelling out to the `cookiecutter`
//! executable. Tests substitute a fake renderer.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Trait for invoking the rendering engine - allows faking in tests.
pub trait TemplateRenderer {
    /// Render `template` into `output_dir`, non-interactively.
    ///
    /// `accept_hooks` controls whether template-declared pre/post hooks
    /// are permitted to run.
    fn render(&self, template: &Path, output_dir: &Path, accept_hooks: bool) -> Result<()>;
}

/// The default implementation, shelling out to `cookiecutter`.
pub struct CookiecutterCli;

impl TemplateRenderer for CookiecutterCli {
    fn render(&self, template: &Path, output_dir: &Path, accept_hooks: bool) -> Result<()> {
        log::debug!(
            "cookiecutter --no-input {} -> {}",
            template.display(),
            output_dir.display()
        );

        let output = Command::new("cookiecutter")
            .arg("--no-input")
            .arg("--output-dir")
            .arg(output_dir)
            .arg("--accept-hooks")
            .arg(if accept_hooks { "yes" } else { "no" })
            .arg(template)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::Render {
                        message: "cookiecutter executable not found in PATH".to_string(),
                    }
                } else {
                    Error::Io(e)
                }
            })?;

        match output.status.code() {
            // Killed by a signal: user interrupt. Propagates past the
            // per-repository boundary.
            None => Err(Error::Interrupted),
            Some(0) => Ok(()),
            Some(_) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(Error::Render {
                    message: stderr
                        .lines()
                        .last()
                        .unwrap_or("unknown rendering failure")
                        .to_string(),
                })
            }
        }
    }
}
