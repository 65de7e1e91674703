use crate::generation::generator::CvGenerator;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub generator: CvGenerator,
    /// One entry per open form session. Discarded on DELETE.
    pub sessions: SessionStore,
}
