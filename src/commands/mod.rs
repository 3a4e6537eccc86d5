pub mod chat;
pub mod documents;
pub mod settings;

use crate::doc_processor::DocumentReadError;
use crate::engine::GenerationError;
use crate::llm::LlmError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Document(#[from] DocumentReadError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("{0}")]
    PayloadTooLarge(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Document(_) => StatusCode::BAD_REQUEST,
            ApiError::Llm(LlmError::Config(_)) => StatusCode::BAD_REQUEST,
            ApiError::Generation(_) => StatusCode::BAD_GATEWAY,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Llm(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        let body = match &self {
            ApiError::Generation(err) => json!({ "error": self.to_string(), "kind": err.kind }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Look up a session or fail with 404.
pub(crate) async fn session_handle(
    state: &crate::state::AppState,
    id: Uuid,
) -> ApiResult<std::sync::Arc<tokio::sync::Mutex<crate::session::Session>>> {
    state
        .sessions
        .get(id)
        .await
        .ok_or(ApiError::SessionNotFound(id))
}
