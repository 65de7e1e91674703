// Document Renderer: template fill + external HTML→PDF conversion.
// Every request writes its own `<request_id>.html` / `<request_id>.pdf` pair.

pub mod converter;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::document::RenderedDocument;

pub use converter::{PdfConverter, WkhtmltopdfConverter};

/// Flat `section key → markup` mapping handed to the template.
pub type Sections = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("PDF rendering failed: {0}")]
    RenderFailure(String),
}

/// One of the bundled layouts. Each maps to `<template_dir>/<name>.html`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateChoice {
    #[default]
    Default,
    Modern,
    Classic,
}

impl TemplateChoice {
    pub const ALL: [TemplateChoice; 3] = [
        TemplateChoice::Default,
        TemplateChoice::Modern,
        TemplateChoice::Classic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TemplateChoice::Default => "default",
            TemplateChoice::Modern => "modern",
            TemplateChoice::Classic => "classic",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.html", self.name())
    }
}

impl fmt::Display for TemplateChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TemplateChoice {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateChoice::ALL
            .into_iter()
            .find(|choice| choice.name() == s.trim())
            .ok_or_else(|| RenderError::TemplateNotFound(s.to_string()))
    }
}

#[derive(Clone)]
pub struct DocumentRenderer {
    template_dir: PathBuf,
    output_dir: PathBuf,
    converter: Arc<dyn PdfConverter>,
}

impl DocumentRenderer {
    pub fn new(template_dir: PathBuf, output_dir: PathBuf, converter: Arc<dyn PdfConverter>) -> Self {
        Self {
            template_dir,
            output_dir,
            converter,
        }
    }

    pub fn template_path(&self, choice: TemplateChoice) -> PathBuf {
        self.template_dir.join(choice.file_name())
    }

    /// Fills `choice` with `sections`, writes the HTML and converts it to PDF.
    /// Partial output is removed when any step fails.
    pub async fn render(
        &self,
        sections: &Sections,
        choice: TemplateChoice,
        request_id: Uuid,
    ) -> Result<RenderedDocument, RenderError> {
        let template_path = self.template_path(choice);
        let source = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|_| RenderError::TemplateNotFound(template_path.display().to_string()))?;

        let html = fill_template(&source, sections)?;

        let document = RenderedDocument {
            request_id,
            html_path: self.output_dir.join(format!("{request_id}.html")),
            pdf_path: self.output_dir.join(format!("{request_id}.pdf")),
            generated_at: Utc::now(),
        };

        match self.write_and_convert(&html, &document).await {
            Ok(()) => {
                info!(
                    "Rendered {} with template '{}'",
                    document.pdf_path.display(),
                    choice
                );
                Ok(document)
            }
            Err(e) => {
                document.remove_files().await;
                Err(e)
            }
        }
    }

    async fn write_and_convert(
        &self,
        html: &str,
        document: &RenderedDocument,
    ) -> Result<(), RenderError> {
        tokio::fs::write(&document.html_path, html)
            .await
            .map_err(|e| {
                RenderError::RenderFailure(format!(
                    "could not write {}: {e}",
                    document.html_path.display()
                ))
            })?;
        debug!("Wrote intermediate HTML to {}", document.html_path.display());

        self.converter
            .convert(&document.html_path, &document.pdf_path)
            .await?;

        ensure_non_empty(&document.pdf_path).await
    }
}

/// Renders a template in non-strict mode: unknown keys become empty strings.
/// Values are inserted unescaped because sections already carry markup.
pub fn fill_template(source: &str, sections: &Sections) -> Result<String, RenderError> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(false);
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .render_template(source, sections)
        .map_err(|e| RenderError::RenderFailure(format!("template error: {e}")))
}

async fn ensure_non_empty(path: &Path) -> Result<(), RenderError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => Err(RenderError::RenderFailure(format!(
            "converter produced an empty file at {}",
            path.display()
        ))),
        Err(_) => Err(RenderError::RenderFailure(format!(
            "converter produced no file at {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Writes the HTML bytes behind a fixed header, standing in for wkhtmltopdf.
    pub struct EchoConverter;

    #[async_trait::async_trait]
    impl PdfConverter for EchoConverter {
        async fn convert(&self, html_path: &Path, pdf_path: &Path) -> Result<(), RenderError> {
            let html = tokio::fs::read(html_path)
                .await
                .map_err(|e| RenderError::RenderFailure(e.to_string()))?;
            let mut pdf = b"%PDF-1.4\n".to_vec();
            pdf.extend_from_slice(&html);
            tokio::fs::write(pdf_path, pdf)
                .await
                .map_err(|e| RenderError::RenderFailure(e.to_string()))
        }
    }

    /// Always fails, like a converter exiting non-zero.
    pub struct FailingConverter;

    #[async_trait::async_trait]
    impl PdfConverter for FailingConverter {
        async fn convert(&self, _html: &Path, _pdf: &Path) -> Result<(), RenderError> {
            Err(RenderError::RenderFailure("converter exited with 1".to_string()))
        }
    }

    pub const TEST_TEMPLATE: &str =
        "<h1>{{ name }}</h1><p>{{ job_title }}</p><p>{{ summary }}</p>{{ skills }}{{ languages }}<span>{{ missing_key }}</span>";

    /// A template dir containing only `default.html`, and an empty output dir.
    pub fn template_fixture() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let templates = root.path().join("html_templates");
        let output = root.path().join("generated");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(templates.join("default.html"), TEST_TEMPLATE).unwrap();
        (root, templates, output)
    }
}
