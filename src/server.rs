use crate::commands::{chat, documents, settings};
use crate::page;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Build the HTTP surface: the chat page plus the JSON session API.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.settings.max_upload_bytes);

    Router::new()
        .route("/", get(page::index))
        .route("/healthz", get(|| async { "ok" }))
        .route("/api/settings", get(settings::get_settings))
        .route("/api/models", get(settings::get_available_models))
        .route("/api/sessions", post(documents::create_session))
        .route(
            "/api/sessions/{id}",
            get(documents::get_session).delete(documents::delete_session),
        )
        .route("/api/sessions/{id}/document", put(documents::replace_document))
        .route("/api/sessions/{id}/ask", post(chat::ask))
        .route(
            "/api/sessions/{id}/messages",
            get(chat::get_messages).delete(chat::clear_messages),
        )
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `RUST_LOG` wins over the configured filter.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppSettings;
    use crate::doc_processor::{DocumentReadError, PageSource};
    use crate::engine::tests::{EchoHemoglobin, Garbled};
    use crate::llm::{Connect, Generate, LlmError};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "doc-chat-test-boundary";
    const LAB_REPORT: &str = "Patient: Jane Doe. Hemoglobin: 13.5 g/dL (normal).";

    /// Pretends every upload is a one-page PDF whose text is the upload body after the magic.
    struct BodyAsPage;

    impl PageSource for BodyAsPage {
        fn pages(&self, bytes: &[u8]) -> Result<Vec<String>, DocumentReadError> {
            let text = String::from_utf8_lossy(&bytes[b"%PDF-1.4\n".len()..]).to_string();
            Ok(vec![text])
        }
    }

    /// `stub/fail` connects to a model that always errors.
    struct StubConnector;

    impl Connect for StubConnector {
        fn connect(&self, model: &str, _api_key: Option<&str>) -> Result<Arc<dyn Generate>, LlmError> {
            match model {
                "stub/fail" => Ok(Arc::new(Garbled)),
                _ => Ok(Arc::new(EchoHemoglobin::default())),
            }
        }
    }

    fn stub_app() -> Router {
        stub_app_with(AppSettings::default())
    }

    fn stub_app_with(settings: AppSettings) -> Router {
        let state = AppState::with_parts(
            settings,
            Arc::new(StubConnector),
            Arc::new(BodyAsPage),
        );
        router(Arc::new(state))
    }

    fn upload(method: &str, uri: &str, filename: &str, text: &str, model: Option<&str>) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"pdf\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.4\n{text}\r\n"
            )
            .as_bytes(),
        );
        if let Some(model) = model {
            body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"model\"\r\n\r\n{model}\r\n").as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn ask(id: &str, question: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/api/sessions/{id}/ask"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::json!({ "question": question }).to_string()))
            .unwrap()
    }

    fn plain(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn new_session(app: &Router, model: Option<&str>) -> String {
        let (status, body) = send(app, upload("POST", "/api/sessions", "labs.pdf", LAB_REPORT, model)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_healthz_and_index() {
        let app = stub_app();
        let resp = app.clone().oneshot(plain("GET", "/healthz")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app.clone().oneshot(plain("GET", "/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&html).contains("<title>PDF Chatbot</title>"));
    }

    #[tokio::test]
    async fn test_upload_then_ask() {
        let app = stub_app();
        let (status, body) = send(&app, upload("POST", "/api/sessions", "scans/labs.pdf", LAB_REPORT, None)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["document"]["filename"], "labs.pdf");
        assert_eq!(body["document"]["char_count"], LAB_REPORT.len());
        assert_eq!(body["message_count"], 0);
        let id = body["session_id"].as_str().unwrap();

        let (status, body) = send(&app, ask(id, "What is the hemoglobin level?")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["answer"].as_str().unwrap().contains("13.5"));
        assert_eq!(body["message_count"], 2);

        let (status, body) = send(&app, plain("GET", &format!("/api/sessions/{id}/messages"))).await;
        assert_eq!(status, StatusCode::OK);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "What is the hemoglobin level?");
        assert_eq!(messages[1]["role"], "assistant");
    }

    #[tokio::test]
    async fn test_generation_failure_is_bad_gateway_and_not_recorded() {
        let app = stub_app();
        let id = new_session(&app, Some("stub/fail")).await;

        let (status, body) = send(&app, ask(&id, "anything")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Error generating response:"));
        assert_eq!(body["kind"], "parse");

        let (_, body) = send(&app, plain("GET", &format!("/api/sessions/{id}"))).await;
        assert_eq!(body["message_count"], 0);
    }

    #[tokio::test]
    async fn test_clear_history_and_delete_session() {
        let app = stub_app();
        let id = new_session(&app, None).await;
        send(&app, ask(&id, "q")).await;

        let (status, _) = send(&app, plain("DELETE", &format!("/api/sessions/{id}/messages"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = send(&app, plain("GET", &format!("/api/sessions/{id}"))).await;
        assert_eq!(body["message_count"], 0);
        assert_eq!(body["document"]["filename"], "labs.pdf");

        let (status, _) = send(&app, plain("DELETE", &format!("/api/sessions/{id}"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, plain("GET", &format!("/api/sessions/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().starts_with("Session not found"));
    }

    #[tokio::test]
    async fn test_replace_document_resets_history() {
        let app = stub_app();
        let id = new_session(&app, None).await;
        send(&app, ask(&id, "q")).await;

        let (status, body) = send(
            &app,
            upload("PUT", &format!("/api/sessions/{id}/document"), "rx.pdf", "Amoxicillin 500mg", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session_id"], id.as_str());
        assert_eq!(body["document"]["filename"], "rx.pdf");
        assert_eq!(body["message_count"], 0);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let app = stub_app();
        let first = new_session(&app, None).await;
        let (_, body) = send(&app, upload("POST", "/api/sessions", "rx.pdf", "Amoxicillin 500mg", None)).await;
        let second = body["session_id"].as_str().unwrap().to_string();
        assert_ne!(first, second);

        send(&app, ask(&first, "q")).await;
        let (_, body) = send(&app, plain("GET", &format!("/api/sessions/{second}"))).await;
        assert_eq!(body["message_count"], 0);
        assert_eq!(body["document"]["filename"], "rx.pdf");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = stub_app();
        let id = uuid::Uuid::new_v4().to_string();
        let (status, _) = send(&app, ask(&id, "q")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_pdf_upload_rejected() {
        let app = stub_app();
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"pdf\"; filename=\"notes.txt\"\r\n\r\nplain text\r\n--{BOUNDARY}--\r\n"
        );
        let req = Request::builder()
            .method("POST")
            .uri("/api/sessions")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Error reading PDF: file is not a PDF");
    }

    #[tokio::test]
    async fn test_oversized_upload_is_payload_too_large() {
        let app = stub_app_with(AppSettings {
            max_upload_bytes: 1024,
            ..AppSettings::default()
        });
        let big_report = "Hemoglobin: 13.5 g/dL. ".repeat(500);
        let (status, body) = send(&app, upload("POST", "/api/sessions", "big.pdf", &big_report, None)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "Upload is larger than the 1024 byte limit");

        let (status, _) = send(&app, upload("POST", "/api/sessions", "small.pdf", LAB_REPORT, None)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_unknown_form_fields_are_skipped() {
        let app = stub_app();
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nignored\r\n\
             --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"pdf\"; filename=\"labs.pdf\"\r\n\r\n%PDF-1.4\n{LAB_REPORT}\r\n\
             --{BOUNDARY}--\r\n"
        );
        let req = Request::builder()
            .method("POST")
            .uri("/api/sessions")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["document"]["filename"], "labs.pdf");
    }

    #[tokio::test]
    async fn test_missing_api_key_rejected() {
        let app = router(Arc::new(AppState::new(AppSettings::default())));
        let (status, body) = send(&app, upload("POST", "/api/sessions", "labs.pdf", LAB_REPORT, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Configuration error: Gemini API key not configured"
        );
    }

    #[tokio::test]
    async fn test_settings_are_masked() {
        let settings = AppSettings {
            gemini_api_key: Some("AIzaSyA1234567890xyz".into()),
            ..AppSettings::default()
        };
        let app = router(Arc::new(AppState::new(settings)));
        let (status, body) = send(&app, plain("GET", "/api/settings")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["gemini_api_key"], "AIza...0xyz");

        let (_, body) = send(&app, plain("GET", "/api/models")).await;
        assert_eq!(body[0]["id"], "gemini/gemini-2.5-flash");
    }
}
