//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `retemplate` application. It uses the `thiserror` library to create a
//! comprehensive `Error` enum that covers all anticipated failure modes,
//! providing clear and descriptive error messages.
//!
//! Most variants are repository-scoped: the pipeline catches them at the
//! orchestrator boundary and converts them into a warning line for that
//! repository, then continues with the next one. Only `Error::Interrupted`
//! escapes that boundary and aborts the whole run.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for retemplate operations
#[derive(Error, Debug)]
pub enum Error {
    /// The repository has no `pyproject.toml` manifest.
    ///
    /// This is a per-repository skip condition, not a fatal error.
    #[error("missing pyproject.toml")]
    ManifestMissing { repo: PathBuf },

    /// The manifest file exists but could not be parsed or lacks the
    /// required project fields.
    #[error("invalid pyproject.toml: {message}")]
    ManifestParse { repo: PathBuf, message: String },

    /// A git command exited non-zero.
    ///
    /// Carries the full command line and captured stderr so callers can
    /// surface the human-readable diagnostic tail.
    #[error("git command failed: git {command} - {stderr}")]
    GitCommand { command: String, stderr: String },

    /// The template rendering engine failed.
    #[error("template rendering failed: {message}")]
    Render { message: String },

    /// A placeholder expression in the variable manifest could not be
    /// resolved.
    ///
    /// May include the name of the problematic variable when applicable.
    #[error("template variable error: {message}{}", variable.as_ref().map(|v| format!(" (variable: {})", v)).unwrap_or_default())]
    Template {
        message: String,
        /// The template variable that caused the error, if applicable
        variable: Option<String>,
    },

    /// An error occurred while archiving or restoring a snapshot.
    #[error("snapshot error: {message}")]
    Snapshot { message: String },

    /// The external render call was killed by a signal.
    ///
    /// Unlike every other variant this one propagates past the
    /// per-repository boundary and aborts the run.
    #[error("interrupted")]
    Interrupted,

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// The human-readable tail of a captured git diagnostic.
    ///
    /// Git prefixes its messages with the failing subcommand and path
    /// (`error: pathspec 'x': ...`); the part after the last `": "` is
    /// what gets shown to the user. Falls back to the first stderr line.
    pub fn diagnostic(&self) -> String {
        match self {
            Error::GitCommand { stderr, .. } => {
                let line = stderr.lines().next().unwrap_or_default();
                match line.rsplit_once(": ") {
                    Some((_, tail)) => tail.to_string(),
                    None => line.to_string(),
                }
            }
            other => other.to_string(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
