//! CV Generation — orchestrates one generation request.
//!
//! Flow: validate profile → build prompt → completion call → parse/normalize →
//!       fill template → convert to PDF.
//!
//! Each stage returns its own error type; they are folded into `PipelineError`
//! here and only turned into a user-facing message at the HTTP boundary.

use std::sync::Arc;

use handlebars::html_escape;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::generation::prompts::{build_cv_prompt, CV_SCHEMA};
use crate::generation::response_parser::{parse_completion, GeneratedContent, ParseError};
use crate::llm_client::{CompletionClient, LlmError};
use crate::models::document::RenderedDocument;
use crate::models::profile::CandidateProfile;
use crate::render::{DocumentRenderer, RenderError, Sections, TemplateChoice};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),

    #[error("Completion request failed: {0}")]
    Completion(#[from] LlmError),

    #[error("The AI response could not be read: {0}")]
    MalformedResponse(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("PDF rendering failed: {0}")]
    RenderFailure(String),
}

impl From<ParseError> for PipelineError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::MalformedResponse(msg) => PipelineError::MalformedResponse(msg),
        }
    }
}

impl From<RenderError> for PipelineError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::TemplateNotFound(name) => PipelineError::TemplateNotFound(name),
            RenderError::RenderFailure(msg) => PipelineError::RenderFailure(msg),
        }
    }
}

/// Everything needed to turn a profile into a PDF.
#[derive(Clone)]
pub struct CvGenerator {
    llm: Arc<dyn CompletionClient>,
    renderer: DocumentRenderer,
}

impl CvGenerator {
    pub fn new(llm: Arc<dyn CompletionClient>, renderer: DocumentRenderer) -> Self {
        Self { llm, renderer }
    }

    /// Runs the pipeline once. Nothing is written to disk unless the
    /// completion parses.
    pub async fn generate(
        &self,
        profile: &CandidateProfile,
        template: TemplateChoice,
        request_id: Uuid,
    ) -> Result<RenderedDocument, PipelineError> {
        profile.validate().map_err(PipelineError::Validation)?;

        let prompt = build_cv_prompt(profile, CV_SCHEMA);
        info!(
            "[{request_id}] Requesting completion (model: {})",
            self.llm.model()
        );
        let raw = self.llm.complete(&prompt).await?;

        let content = parse_completion(&raw, profile)?;
        info!("[{request_id}] Completion parsed");

        let sections = build_sections(profile, &content);
        let document = self.renderer.render(&sections, template, request_id).await?;

        Ok(document)
    }
}

/// Candidate identity fields (escaped) plus the normalized generated sections.
pub fn build_sections(profile: &CandidateProfile, content: &GeneratedContent) -> Sections {
    let identity = [
        ("name", profile.name.as_str()),
        ("email", profile.email.as_str()),
        ("phone", profile.phone.as_str()),
        ("address", profile.address.as_str()),
        ("linkedin", profile.linkedin_or_empty()),
        ("job_title", profile.job_title.as_str()),
    ];

    identity
        .into_iter()
        .map(|(key, value)| (key.to_string(), html_escape(value)))
        .chain(
            content
                .markup_sections()
                .into_iter()
                .map(|(key, markup)| (key.to_string(), markup)),
        )
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
