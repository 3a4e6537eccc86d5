use super::{session_handle, ApiResult};
use crate::session::models::{AskRequest, AskResponse, Transcript};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<AskRequest>,
) -> ApiResult<Json<AskResponse>> {
    let handle = session_handle(&state, id).await?;

    // Held for the whole round trip so answers land in history in question order.
    let mut session = handle.lock().await;
    let answer = session.ask(&request.question).await?;

    Ok(Json(AskResponse {
        answer,
        message_count: session.history().message_count(),
    }))
}

pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Transcript>> {
    let handle = session_handle(&state, id).await?;
    let session = handle.lock().await;
    Ok(Json(Transcript {
        session_id: id,
        messages: session.history().messages(),
    }))
}

pub async fn clear_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let handle = session_handle(&state, id).await?;
    handle.lock().await.clear_history();
    tracing::info!(session_id = %id, "chat history cleared");
    Ok(StatusCode::NO_CONTENT)
}
