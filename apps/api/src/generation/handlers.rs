//! Axum route handlers for the CV form: sessions, generation and download.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::generator::PipelineError;
use crate::models::profile::{CandidateProfile, Proficiency, LANGUAGE_OPTIONS, MAX_LANGUAGES};
use crate::render::TemplateChoice;
use crate::session::SessionView;
use crate::state::AppState;

/// File name offered to the browser for every download.
pub const DOWNLOAD_FILE_NAME: &str = "SmartCV.pdf";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Template name; the session's current choice when omitted.
    pub template: Option<String>,
    pub profile: CandidateProfile,
}

#[derive(Debug, Serialize)]
pub struct FormOptions {
    pub templates: Vec<&'static str>,
    pub languages: Vec<&'static str>,
    pub proficiencies: Vec<&'static str>,
    pub max_languages: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/options
pub async fn handle_options() -> Json<FormOptions> {
    Json(FormOptions {
        templates: TemplateChoice::ALL.iter().map(|t| t.name()).collect(),
        languages: LANGUAGE_OPTIONS.to_vec(),
        proficiencies: Proficiency::ALL.iter().map(|p| p.as_str()).collect(),
        max_languages: MAX_LANGUAGES,
    })
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let view = state.sessions.create();
    info!("Session {} opened", view.session_id);
    (StatusCode::CREATED, Json(view))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.view(id)?))
}

/// DELETE /api/v1/sessions/:id
///
/// Ends the session and deletes its rendered files.
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let ended = state.sessions.remove(id)?;
    if let Some(document) = ended.document {
        document.remove_files().await;
    }
    info!("Session {id} closed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/generate
///
/// Validates the form, then runs prompt → completion → parse → render.
/// On failure the session keeps whatever document it had before.
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<SessionView>, AppError> {
    let template = match request.template.as_deref() {
        Some(name) => match name.parse::<TemplateChoice>() {
            Ok(choice) => choice,
            Err(e) => return Err(reject(&state, id, PipelineError::from(e).into())),
        },
        None => state.sessions.view(id)?.template,
    };

    if let Err(message) = request.profile.validate() {
        return Err(reject(&state, id, AppError::Validation(message)));
    }

    state.sessions.begin_generation(id, template)?;

    let request_id = Uuid::new_v4();
    info!("[{request_id}] Generating CV for session {id} with template '{template}'");

    // Run to completion even if the client disconnects, so the session never
    // stays stuck in Generating.
    let task_state = state.clone();
    let outcome = tokio::spawn(async move {
        let result = task_state
            .generator
            .generate(&request.profile, template, request_id)
            .await;

        match result {
            Ok(document) => {
                if let Some(stale) = task_state.sessions.finish_success(id, document) {
                    stale.remove_files().await;
                }
                info!("[{request_id}] CV ready for session {id}");
                Ok(())
            }
            Err(e) => {
                let err = AppError::from(e);
                warn!("[{request_id}] Generation failed: {err}");
                task_state.sessions.finish_failure(id, err.user_message());
                Err(err)
            }
        }
    })
    .await;

    match outcome {
        Ok(Ok(())) => Ok(Json(state.sessions.view(id)?)),
        Ok(Err(err)) => Err(err),
        Err(join_error) => {
            let err = AppError::Internal(anyhow::anyhow!("generation task failed: {join_error}"));
            state.sessions.finish_failure(id, err.user_message());
            Err(err)
        }
    }
}

/// GET /api/v1/sessions/:id/download
///
/// Serves the most recently rendered PDF. Only available once the session is Ready.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let document = state.sessions.downloadable(id)?;

    // A regeneration finishing after `downloadable` may already have deleted this file.
    let pdf = tokio::fs::read(&document.pdf_path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::NotFound(
            "The generated CV was replaced; download the current one".to_string(),
        ),
        _ => AppError::Internal(anyhow::anyhow!(
            "could not read {}: {e}",
            document.pdf_path.display()
        )),
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
        ],
        Bytes::from(pdf),
    ))
}

/// Records a rejected trigger on the session and returns the error to send.
fn reject(state: &AppState, id: Uuid, err: AppError) -> AppError {
    match state.sessions.record_error(id, err.user_message()) {
        Ok(_) => err,
        Err(not_found) => not_found,
    }
}
