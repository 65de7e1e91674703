pub mod health;

use axum::{
    response::Html,
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

const FORM_PAGE: &str = include_str!("../../static/index.html");

/// GET /
async fn form_page() -> Html<&'static str> {
    Html(FORM_PAGE)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(form_page))
        .route("/health", get(health::health_handler))
        .route("/api/v1/options", get(handlers::handle_options))
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/generate",
            post(handlers::handle_generate),
        )
        .route(
            "/api/v1/sessions/:id/download",
            get(handlers::handle_download),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::generation::generator::testing::{CannedCompletion, CANNED_CV};
    use crate::generation::generator::CvGenerator;
    use crate::models::profile::sample_profile;
    use crate::render::testing::{template_fixture, EchoConverter};
    use crate::render::DocumentRenderer;
    use crate::session::SessionStore;

    struct Harness {
        _root: tempfile::TempDir,
        output: PathBuf,
        llm: Arc<CannedCompletion>,
        app: Router,
    }

    fn harness(completion: CannedCompletion) -> Harness {
        let (root, templates, output) = template_fixture();
        let llm = Arc::new(completion);
        let renderer = DocumentRenderer::new(templates, output.clone(), Arc::new(EchoConverter));
        let state = AppState {
            generator: CvGenerator::new(llm.clone(), renderer),
            sessions: SessionStore::new(),
        };
        Harness {
            _root: root,
            output,
            llm,
            app: build_router(state),
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let (status, bytes) = send(app, request).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn open_session(app: &Router) -> String {
        let (status, body) = send_json(app, "POST", "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    fn generate_body(template: &str) -> Value {
        json!({ "template": template, "profile": sample_profile() })
    }

    #[tokio::test]
    async fn test_health_and_form_page() {
        let h = harness(CannedCompletion::ok(CANNED_CV));
        let (status, body) = send_json(&h.app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, page) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(page).unwrap().contains("<form"));
    }

    #[tokio::test]
    async fn test_options_list_templates_and_languages() {
        let h = harness(CannedCompletion::ok(CANNED_CV));
        let (status, body) = send_json(&h.app, "GET", "/api/v1/options", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["templates"], json!(["default", "modern", "classic"]));
        assert_eq!(body["proficiencies"][3], "Native");
        assert_eq!(body["max_languages"], 10);
    }

    #[tokio::test]
    async fn test_generate_then_download() {
        let h = harness(CannedCompletion::ok(CANNED_CV));
        let id = open_session(&h.app).await;

        let (status, view) = send_json(
            &h.app,
            "POST",
            &format!("/api/v1/sessions/{id}/generate"),
            Some(generate_body("default")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["status"], "ready");
        assert_eq!(
            view["document"]["download_url"],
            format!("/api/v1/sessions/{id}/download")
        );

        let request = Request::builder()
            .uri(format!("/api/v1/sessions/{id}/download"))
            .body(Body::empty())
            .unwrap();
        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"SmartCV.pdf\""
        );
        let pdf = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_regenerating_keeps_one_document_per_session() {
        let h = harness(CannedCompletion::ok(CANNED_CV));
        let id = open_session(&h.app).await;
        let uri = format!("/api/v1/sessions/{id}/generate");

        send_json(&h.app, "POST", &uri, Some(generate_body("default"))).await;
        let (status, _) = send_json(&h.app, "POST", &uri, Some(generate_body("default"))).await;
        assert_eq!(status, StatusCode::OK);

        let pdfs = std::fs::read_dir(&h.output)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "pdf"))
            .count();
        assert_eq!(pdfs, 1);
    }

    #[tokio::test]
    async fn test_missing_required_field_blocks_generation() {
        let h = harness(CannedCompletion::ok(CANNED_CV));
        let id = open_session(&h.app).await;
        let mut body = generate_body("default");
        body["profile"]["job_title"] = json!("");

        let (status, error) = send_json(
            &h.app,
            "POST",
            &format!("/api/v1/sessions/{id}/generate"),
            Some(body),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(h.llm.calls(), 0);

        let (_, view) = send_json(&h.app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(view["status"], "idle");
        assert!(view["last_error"].as_str().unwrap().contains("job title"));
    }

    #[tokio::test]
    async fn test_validation_failure_leaves_ready_state() {
        let h = harness(CannedCompletion::ok(CANNED_CV));
        let id = open_session(&h.app).await;
        let uri = format!("/api/v1/sessions/{id}/generate");
        send_json(&h.app, "POST", &uri, Some(generate_body("default"))).await;

        let mut body = generate_body("default");
        body["profile"]["email"] = json!("");
        let (status, _) = send_json(&h.app, "POST", &uri, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, view) = send_json(&h.app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(view["status"], "ready");
        assert!(view["document"].is_object());
        assert_eq!(h.llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_template_is_not_found() {
        let h = harness(CannedCompletion::ok(CANNED_CV));
        let id = open_session(&h.app).await;

        let (status, error) = send_json(
            &h.app,
            "POST",
            &format!("/api/v1/sessions/{id}/generate"),
            Some(generate_body("fancy")),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"]["code"], "TEMPLATE_NOT_FOUND");
        assert_eq!(std::fs::read_dir(&h.output).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_completion_returns_to_idle() {
        let h = harness(CannedCompletion::ok("Here is your CV: summary..."));
        let id = open_session(&h.app).await;

        let (status, error) = send_json(
            &h.app,
            "POST",
            &format!("/api/v1/sessions/{id}/generate"),
            Some(generate_body("default")),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(error["error"]["code"], "MALFORMED_RESPONSE");
        assert_eq!(std::fs::read_dir(&h.output).unwrap().count(), 0);

        let (_, view) = send_json(&h.app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(view["status"], "idle");
        assert!(view["last_error"].is_string());
    }

    #[tokio::test]
    async fn test_download_before_ready_is_not_found() {
        let h = harness(CannedCompletion::ok(CANNED_CV));
        let id = open_session(&h.app).await;
        let (status, _) =
            send_json(&h.app, "GET", &format!("/api/v1/sessions/{id}/download"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_download_of_deleted_pdf_is_not_found() {
        let h = harness(CannedCompletion::ok(CANNED_CV));
        let id = open_session(&h.app).await;
        send_json(
            &h.app,
            "POST",
            &format!("/api/v1/sessions/{id}/generate"),
            Some(generate_body("default")),
        )
        .await;

        for entry in std::fs::read_dir(&h.output).unwrap() {
            let path = entry.unwrap().path();
            if path.extension().is_some_and(|x| x == "pdf") {
                std::fs::remove_file(path).unwrap();
            }
        }

        let (status, error) =
            send_json(&h.app, "GET", &format!("/api/v1/sessions/{id}/download"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_delete_session_discards_files() {
        let h = harness(CannedCompletion::ok(CANNED_CV));
        let id = open_session(&h.app).await;
        send_json(
            &h.app,
            "POST",
            &format!("/api/v1/sessions/{id}/generate"),
            Some(generate_body("default")),
        )
        .await;

        let (status, _) = send_json(&h.app, "DELETE", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(std::fs::read_dir(&h.output).unwrap().count(), 0);

        let (status, _) = send_json(&h.app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
