//! # Render Context
//!
//! Builds the variable mapping handed to the template engine: template
//! defaults, overlaid with repository metadata, then a single placeholder
//! resolution pass in which a value may reference other variables in the
//! same mapping (`{{ cookiecutter.project_name|lower }}`).
//!
//! One merged context is live per repository. Defaults are re-loaded from
//! the canonical template config and the resolution environment is
//! re-created for every repository, so nothing resolved for one
//! repository can leak into the next.
//!
//! The mapping preserves the template's declaration order (`serde_json`
//! with `preserve_order`); the resolution pass is order-sensitive, later
//! values see earlier values already resolved.

use std::fs;
use std::path::Path;

use minijinja::{context, Environment, UndefinedBehavior};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::manifest::TemplateMetadata;

/// The template engine's variable manifest, by its naming convention.
pub const CONFIG_FILE: &str = "cookiecutter.json";

/// The merged, insertion-ordered variable mapping for one repository.
#[derive(Debug, Clone)]
pub struct RenderContext {
    values: Map<String, Value>,
}

impl RenderContext {
    /// Load the template's declared defaults.
    ///
    /// Enumerated choice lists collapse to their first element, so the
    /// mapping is uniformly string-valued (equivalent to the engine's own
    /// no-input behavior). Non-string scalars are stringified.
    pub fn load(template_config: &Path) -> Result<Self> {
        let text = fs::read_to_string(template_config)?;
        let raw: Map<String, Value> = serde_json::from_str(&text)?;

        let mut values = Map::new();
        for (key, value) in raw {
            values.insert(key, Value::String(collapse(value)?));
        }

        Ok(Self { values })
    }

    /// Overlay repository metadata onto the defaults.
    ///
    /// Existing keys are updated in place (keeping their position in the
    /// ordering); unknown keys are appended.
    pub fn merge(&mut self, metadata: &TemplateMetadata) {
        for (key, value) in metadata.iter() {
            self.values
                .insert(key.to_string(), Value::String(value.to_string()));
        }
    }

    /// Resolve self-referential placeholder expressions, exactly once.
    ///
    /// Each value is rendered against the current state of the mapping
    /// under the `cookiecutter` namespace, in declaration order. The
    /// environment is strict: referencing an undeclared variable is an
    /// error. Private keys (leading underscore) are engine directives and
    /// pass through unrendered.
    pub fn resolve(&mut self) -> Result<()> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        let keys: Vec<String> = self.values.keys().cloned().collect();
        for key in keys {
            if key.starts_with('_') {
                continue;
            }
            let value = match self.values.get(&key) {
                Some(Value::String(s)) => s.clone(),
                _ => continue,
            };
            if !value.contains("{{") && !value.contains("{%") {
                continue;
            }

            let rendered = env
                .render_str(&value, context! { cookiecutter => &self.values })
                .map_err(|e| Error::Template {
                    message: e.to_string(),
                    variable: Some(key.clone()),
                })?;
            log::debug!("resolved {}: {:?} -> {:?}", key, value, rendered);
            self.values.insert(key, Value::String(rendered));
        }

        Ok(())
    }

    /// Write the mapping where the rendering engine reads its
    /// non-interactive input: the scratch template's variable manifest.
    ///
    /// This is the only place the scratch template is mutated.
    pub fn write(&self, template_config: &Path) -> Result<()> {
        let text = serde_json::to_string(&Value::Object(self.values.clone()))?;
        fs::write(template_config, text)?;
        Ok(())
    }

    /// Look up a resolved value.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Number of variables in the mapping.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

/// Collapse a raw default into its string form.
fn collapse(value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Array(items) => match items.into_iter().next() {
            Some(first) => collapse(first),
            None => Ok(String::new()),
        },
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ProjectManifest, TemplateMetadata};
    use tempfile::TempDir;

    fn context_from(json: &str) -> RenderContext {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join(CONFIG_FILE);
        fs::write(&config, json).unwrap();
        RenderContext::load(&config).unwrap()
    }

    fn metadata(name: &str) -> TemplateMetadata {
        let manifest = ProjectManifest {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            description: "d".to_string(),
            keywords: vec!["a".to_string(), "b".to_string()],
        };
        TemplateMetadata::from_manifest(&manifest, Path::new("/nonexistent"))
    }

    #[test]
    fn test_load_preserves_declaration_order() {
        let ctx = context_from(r#"{"zeta": "1", "alpha": "2", "mid": "3"}"#);
        let keys: Vec<_> = ctx.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_load_collapses_choice_lists() {
        let ctx = context_from(r#"{"license": ["MIT", "Apache-2.0"], "empty": []}"#);
        assert_eq!(ctx.get("license"), Some("MIT"));
        assert_eq!(ctx.get("empty"), Some(""));
    }

    #[test]
    fn test_load_stringifies_scalars() {
        let ctx = context_from(r#"{"use_docker": false, "retries": 3}"#);
        assert_eq!(ctx.get("use_docker"), Some("false"));
        assert_eq!(ctx.get("retries"), Some("3"));
    }

    #[test]
    fn test_merge_overrides_and_appends() {
        let mut ctx = context_from(r#"{"project_name": "x", "project_slug": "y"}"#);
        ctx.merge(&metadata("proj"));

        assert_eq!(ctx.get("project_name"), Some("proj"));
        assert_eq!(ctx.get("project_version"), Some("1.0.0"));
        assert_eq!(ctx.get("project_keywords"), Some("a,b"));
        // Overridden key keeps its original position
        let keys: Vec<_> = ctx.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys[0], "project_name");
        assert_eq!(keys[1], "project_slug");
    }

    #[test]
    fn test_resolve_self_reference_with_filter() {
        let mut ctx = context_from(
            r#"{"project_name": "x", "project_slug": "{{cookiecutter.project_name|lower}}"}"#,
        );
        ctx.merge(&metadata("Proj"));
        ctx.resolve().unwrap();
        assert_eq!(ctx.get("project_slug"), Some("proj"));
    }

    #[test]
    fn test_resolve_chains_through_earlier_values() {
        let mut ctx = context_from(
            r#"{
                "project_name": "Demo",
                "project_slug": "{{ cookiecutter.project_name|lower }}",
                "package_dir": "src/{{ cookiecutter.project_slug }}"
            }"#,
        );
        ctx.resolve().unwrap();
        assert_eq!(ctx.get("project_slug"), Some("demo"));
        assert_eq!(ctx.get("package_dir"), Some("src/demo"));
    }

    #[test]
    fn test_resolve_undeclared_reference_errors() {
        let mut ctx = context_from(r#"{"slug": "{{ cookiecutter.nope }}"}"#);
        let err = ctx.resolve().unwrap_err();
        assert!(matches!(err, Error::Template { .. }));
    }

    #[test]
    fn test_resolve_skips_private_keys() {
        let mut ctx =
            context_from(r#"{"_copy_without_render": "{{ not_a_variable }}", "plain": "v"}"#);
        ctx.resolve().unwrap();
        assert_eq!(ctx.get("_copy_without_render"), Some("{{ not_a_variable }}"));
    }

    #[test]
    fn test_fresh_load_isolates_repositories() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join(CONFIG_FILE);
        fs::write(
            &config,
            r#"{"project_name": "x", "project_slug": "{{cookiecutter.project_name|lower}}"}"#,
        )
        .unwrap();

        let mut first = RenderContext::load(&config).unwrap();
        first.merge(&metadata("Alpha"));
        first.resolve().unwrap();
        assert_eq!(first.get("project_slug"), Some("alpha"));

        // Second repository: defaults re-loaded, nothing from the first
        // context survives.
        let mut second = RenderContext::load(&config).unwrap();
        second.merge(&metadata("Beta"));
        second.resolve().unwrap();
        assert_eq!(second.get("project_slug"), Some("beta"));
        assert_eq!(
            first.get("project_slug"),
            Some("alpha"),
            "earlier context must be unaffected"
        );
    }

    #[test]
    fn test_write_round_trips_ordered_json() {
        let dir = TempDir::new().unwrap();
        let ctx = context_from(r#"{"b": "1", "a": "2"}"#);
        let out = dir.path().join(CONFIG_FILE);
        ctx.write(&out).unwrap();

        let reloaded = RenderContext::load(&out).unwrap();
        let keys: Vec<_> = reloaded.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
