//! # Project Metadata Extraction
//!
//! Reads the repository's `pyproject.toml` manifest and derives the fixed
//! set of template variables the render context overlays on top of the
//! template defaults.
//!
//! Detection of the runnable entry point (`<project_name>/__main__.py`)
//! runs against the original repository, before any template mutation.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Name of the manifest file every processed repository must carry.
pub const MANIFEST_FILE: &str = "pyproject.toml";

/// The declared project identity, parsed from `[tool.poetry]`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PyProject {
    tool: ToolSection,
}

#[derive(Debug, Deserialize)]
struct ToolSection {
    poetry: ProjectManifest,
}

impl ProjectManifest {
    /// Parse the manifest of the repository at `repo`.
    ///
    /// A missing file is the `ManifestMissing` skip condition; a present
    /// but malformed file is a repository-scoped parse error.
    pub fn load(repo: &Path) -> Result<Self> {
        let path = repo.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(Error::ManifestMissing {
                repo: repo.to_path_buf(),
            });
        }

        let text = fs::read_to_string(&path)?;
        let parsed: PyProject = toml::from_str(&text).map_err(|e| Error::ManifestParse {
            repo: repo.to_path_buf(),
            message: e.message().to_string(),
        })?;

        Ok(parsed.tool.poetry)
    }
}

/// The ordered variable overlay derived from a manifest.
///
/// Keys mirror the template's naming convention (`project_*`), plus the
/// `include_entry_point` flag.
#[derive(Debug, Clone)]
pub struct TemplateMetadata {
    entries: Vec<(String, String)>,
}

impl TemplateMetadata {
    /// Derive the overlay for `repo` from its parsed manifest.
    pub fn from_manifest(manifest: &ProjectManifest, repo: &Path) -> Self {
        let main_file = repo.join(&manifest.name).join("__main__.py");
        let entries = vec![
            ("project_name".to_string(), manifest.name.clone()),
            ("project_version".to_string(), manifest.version.clone()),
            (
                "project_description".to_string(),
                manifest.description.clone(),
            ),
            (
                "project_keywords".to_string(),
                manifest.keywords.join(","),
            ),
            (
                "include_entry_point".to_string(),
                if main_file.is_file() { "y" } else { "n" }.to_string(),
            ),
        ];
        Self { entries }
    }

    /// Iterate the overlay pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
