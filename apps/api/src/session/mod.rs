//! Per-session form state.
//!
//! A session starts Idle, enters Generating on a valid trigger, and settles in
//! Ready once a document exists. Each session holds at most one document.
//! Locks are never held across an await. Sessions nobody has touched for a
//! while are swept so abandoned browser tabs do not pin their files.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::document::RenderedDocument;
use crate::render::TemplateChoice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Generating,
    Ready,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub template: TemplateChoice,
    pub generating: bool,
    pub document: Option<RenderedDocument>,
    pub last_error: Option<String>,
    /// Last time a request reached this session.
    pub last_seen: Instant,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            template: TemplateChoice::default(),
            generating: false,
            document: None,
            last_error: None,
            last_seen: Instant::now(),
        }
    }

    fn is_expired(&self, idle_ttl: Duration) -> bool {
        !self.generating && self.last_seen.elapsed() >= idle_ttl
    }

    pub fn status(&self) -> SessionStatus {
        if self.generating {
            SessionStatus::Generating
        } else if self.document.is_some() {
            SessionStatus::Ready
        } else {
            SessionStatus::Idle
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub download_url: String,
}

/// What clients see of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub template: TemplateChoice,
    pub document: Option<DocumentView>,
    pub last_error: Option<String>,
}

impl SessionView {
    fn new(session_id: Uuid, state: &SessionState) -> Self {
        let document = match state.status() {
            SessionStatus::Ready => state.document.as_ref().map(|doc| DocumentView {
                request_id: doc.request_id,
                generated_at: doc.generated_at,
                download_url: format!("/api/v1/sessions/{session_id}/download"),
            }),
            _ => None,
        };

        Self {
            session_id,
            status: state.status(),
            template: state.template,
            document,
            last_error: state.last_error.clone(),
        }
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, SessionState>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> SessionView {
        let id = Uuid::new_v4();
        let state = SessionState::new();
        let view = SessionView::new(id, &state);
        self.sessions.lock().insert(id, state);
        view
    }

    pub fn view(&self, id: Uuid) -> Result<SessionView, AppError> {
        let mut sessions = self.sessions.lock();
        let state = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
        state.last_seen = Instant::now();
        Ok(SessionView::new(id, state))
    }

    /// Ends a session and hands back its state so the caller can discard files.
    pub fn remove(&self, id: Uuid) -> Result<SessionState, AppError> {
        self.sessions
            .lock()
            .remove(&id)
            .ok_or_else(|| session_not_found(id))
    }

    /// Records a rejected trigger without touching status or document.
    pub fn record_error(&self, id: Uuid, message: String) -> Result<SessionView, AppError> {
        self.update(id, |state| state.last_error = Some(message))
    }

    /// Idle/Ready → Generating. Rejects a second trigger while one is in flight.
    pub fn begin_generation(&self, id: Uuid, template: TemplateChoice) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock();
        let state = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
        if state.generating {
            return Err(AppError::Conflict(
                "A CV is already being generated for this session".to_string(),
            ));
        }
        state.generating = true;
        state.template = template;
        state.last_error = None;
        state.last_seen = Instant::now();
        Ok(())
    }

    /// Generating → Ready. Returns the document that is no longer current:
    /// the replaced one, or `document` itself if the session ended meanwhile.
    pub fn finish_success(&self, id: Uuid, document: RenderedDocument) -> Option<RenderedDocument> {
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(&id) {
            Some(state) => {
                state.generating = false;
                state.last_error = None;
                state.last_seen = Instant::now();
                state.document.replace(document)
            }
            None => Some(document),
        }
    }

    /// Generating → Idle (or back to Ready if an earlier document exists).
    pub fn finish_failure(&self, id: Uuid, message: String) {
        if let Some(state) = self.sessions.lock().get_mut(&id) {
            state.generating = false;
            state.last_error = Some(message);
            state.last_seen = Instant::now();
        }
    }

    /// The current document, available only in the Ready state.
    pub fn downloadable(&self, id: Uuid) -> Result<RenderedDocument, AppError> {
        let mut sessions = self.sessions.lock();
        let state = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
        state.last_seen = Instant::now();
        match (state.status(), &state.document) {
            (SessionStatus::Ready, Some(document)) => Ok(document.clone()),
            _ => Err(AppError::NotFound(
                "No generated CV is available for download yet".to_string(),
            )),
        }
    }

    /// Ends every session idle for at least `idle_ttl` and returns the
    /// documents they held so the caller can delete the files.
    /// Sessions with a generation in flight are never swept.
    pub fn sweep_idle(&self, idle_ttl: Duration) -> Vec<RenderedDocument> {
        let mut sessions = self.sessions.lock();
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, state)| state.is_expired(idle_ttl))
            .map(|(id, _)| *id)
            .collect();

        expired
            .into_iter()
            .filter_map(|id| sessions.remove(&id))
            .filter_map(|state| state.document)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    fn update(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SessionState),
    ) -> Result<SessionView, AppError> {
        let mut sessions = self.sessions.lock();
        let state = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
        state.last_seen = Instant::now();
        f(state);
        Ok(SessionView::new(id, state))
    }
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}
