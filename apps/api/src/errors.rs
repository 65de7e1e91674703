use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::generation::generator::PipelineError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Render failure: {0}")]
    RenderFailure(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Validation(msg) => AppError::Validation(msg),
            PipelineError::Completion(e) => AppError::Completion(e.to_string()),
            PipelineError::MalformedResponse(msg) => AppError::MalformedResponse(msg),
            PipelineError::TemplateNotFound(name) => AppError::TemplateNotFound(name),
            PipelineError::RenderFailure(msg) => AppError::RenderFailure(msg),
        }
    }
}

impl AppError {
    /// The single message shown to the candidate.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(msg) | AppError::Validation(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }
            AppError::Completion(_) => {
                "The AI service could not be reached. Please try again later.".to_string()
            }
            AppError::MalformedResponse(_) => {
                "The AI returned a response that could not be turned into a CV. Please try again."
                    .to_string()
            }
            AppError::TemplateNotFound(_) => "The selected CV template is not available.".to_string(),
            AppError::RenderFailure(_) => "The PDF could not be produced.".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::Completion(_) => (StatusCode::BAD_GATEWAY, "COMPLETION_ERROR"),
            AppError::MalformedResponse(_) => (StatusCode::BAD_GATEWAY, "MALFORMED_RESPONSE"),
            AppError::TemplateNotFound(_) => (StatusCode::NOT_FOUND, "TEMPLATE_NOT_FOUND"),
            AppError::RenderFailure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RENDER_FAILURE"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        match &self {
            AppError::Completion(msg)
            | AppError::MalformedResponse(msg)
            | AppError::RenderFailure(msg) => tracing::error!("{code}: {msg}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            _ => {}
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.user_message()
            }
        }));

        (status, body).into_response()
    }
}
