//! Template module - HTML letter templates
//!
//! A template is an HTML file with `{{ field }}` placeholders, loaded once per
//! batch and shared read-only by every worker.
//!
//! ## Syntax
//!
//! - Placeholders: `{{field}}` or `{{ field }}`, HTML-escaped, empty when the
//!   row has no such field
//! - Filters: `{{ amount | required }}` fails the row when the value is
//!   missing or blank, `{{ note | raw }}` skips escaping
//! - Escape sequences: `\{{literal}}`
//!
//! After substitution, relative asset references are rewritten against the
//! template's directory (see [`assets`]).

pub mod assets;
pub mod engine;
pub mod error;

pub use engine::{CompiledTemplate, Placeholder, RenderContext, render};
pub use error::TemplateError;

use crate::error::{LetterGenError, Result};
use crate::row::Row;
use std::path::{Path, PathBuf};
use url::Url;

/// A compiled template plus the directory its assets are resolved against
#[derive(Debug, Clone)]
pub struct Template {
    base_dir: PathBuf,
    asset_base: Url,
    compiled: CompiledTemplate,
}

impl Template {
    /// Read and compile a template file
    ///
    /// Malformed placeholder syntax is reported here, before any row is
    /// rendered.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|source| LetterGenError::TemplateReadFailed {
                path: path.to_path_buf(),
                source,
            })?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let base_dir = parent
            .canonicalize()
            .map_err(|source| LetterGenError::TemplateReadFailed {
                path: path.to_path_buf(),
                source,
            })?;

        let template =
            Self::from_source(&source, base_dir).map_err(|e| LetterGenError::TemplateInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            path = %path.display(),
            fields = template.fields().len(),
            "loaded template"
        );
        Ok(template)
    }

    /// Compile template text with an explicit (absolute) asset directory
    pub fn from_source(
        source: &str,
        base_dir: impl Into<PathBuf>,
    ) -> std::result::Result<Self, TemplateError> {
        let base_dir = base_dir.into();
        let asset_base = Url::from_directory_path(&base_dir)
            .map_err(|_| TemplateError::InvalidBaseDir {
                path: base_dir.clone(),
            })?;
        let compiled = CompiledTemplate::compile(source)?;

        Ok(Self {
            base_dir,
            asset_base,
            compiled,
        })
    }

    /// Render one row into a complete HTML document
    pub fn render(&self, row: &Row) -> std::result::Result<String, TemplateError> {
        let html = self.compiled.render(&RenderContext::new(row.fields()))?;
        assets::resolve_assets(&html, &self.asset_base)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Distinct placeholder fields in first-appearance order
    pub fn fields(&self) -> Vec<String> {
        self.compiled.fields()
    }

    /// Fields marked `required`
    pub fn required_fields(&self) -> Vec<String> {
        self.compiled.required_fields()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[(&str, &str)]) -> Row {
        Row::new(0, fields.iter().copied())
    }

    #[test]
    fn test_render_substitutes_and_resolves() {
        let temp = tempfile::tempdir().unwrap();
        let base = temp.path().canonicalize().unwrap();
        let template = Template::from_source(
            "<html><head></head><body><img src=\"logo.png\">{{name}}</body></html>",
            &base,
        )
        .unwrap();

        let html = template.render(&row(&[("name", "Ann & Co")])).unwrap();
        let logo = Url::from_file_path(base.join("logo.png")).unwrap();

        assert!(html.contains("Ann &amp; Co"));
        assert!(html.contains(&format!("src=\"{}\"", logo)));
        assert!(html.contains("<base href=\"file://"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let temp = tempfile::tempdir().unwrap();
        let template = Template::from_source("<p>{{a}}</p>", temp.path()).unwrap();
        let r = row(&[("a", "x")]);
        assert_eq!(template.render(&r).unwrap(), template.render(&r).unwrap());
    }

    #[test]
    fn test_from_source_rejects_relative_base() {
        let result = Template::from_source("<p></p>", "relative/dir");
        assert!(matches!(result, Err(TemplateError::InvalidBaseDir { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        match Template::load("/definitely/not/here/letter.html") {
            Err(LetterGenError::TemplateReadFailed { .. }) => {}
            other => panic!("Expected TemplateReadFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_load_malformed_template_is_invalid() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("letter.html");
        std::fs::write(&path, "<p>{{ name </p>").unwrap();

        match Template::load(&path) {
            Err(LetterGenError::TemplateInvalid { reason, .. }) => {
                assert!(reason.contains("Unclosed"));
            }
            other => panic!("Expected TemplateInvalid, got {:?}", other),
        }
    }

    #[test]
    fn test_load_lists_fields() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("letter.html");
        std::fs::write(&path, "{{filename}} {{ amount | required }} {{filename}}").unwrap();

        let template = Template::load(&path).unwrap();
        assert_eq!(template.fields(), vec!["filename", "amount"]);
        assert_eq!(template.required_fields(), vec!["amount"]);
        assert_eq!(template.base_dir(), temp.path().canonicalize().unwrap());
    }
}
