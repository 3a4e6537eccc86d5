use super::{session_handle, ApiError, ApiResult};
use crate::doc_processor::{self, DocumentReadError};
use crate::engine::ChatEngine;
use crate::session::models::SessionSummary;
use crate::session::Session;
use crate::state::AppState;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

/// Parsed fields of a document upload form.
pub struct UploadForm {
    pub filename: String,
    pub data: Vec<u8>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

/// Map a multipart read failure, reporting the upload limit when it was hit.
fn form_error(what: &str, err: MultipartError, max_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(format!(
            "Upload is larger than the {} byte limit",
            max_bytes
        ))
    } else {
        ApiError::BadRequest(format!("Failed to read {}: {}", what, err))
    }
}

pub async fn parse_upload(mut multipart: Multipart, max_bytes: usize) -> ApiResult<UploadForm> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut api_key: Option<String> = None;
    let mut model: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error("form field", e, max_bytes))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "pdf" => {
                let filename = field.file_name().unwrap_or("upload.pdf").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| form_error("file data", e, max_bytes))?
                    .to_vec();
                file = Some((filename, data));
            }
            "api_key" | "model" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| form_error(&name, e, max_bytes))?;
                let val = val.trim().to_string();
                if !val.is_empty() {
                    if name == "api_key" {
                        api_key = Some(val);
                    } else {
                        model = Some(val);
                    }
                }
            }
            other => {
                let what = format!("field {}", other);
                field
                    .bytes()
                    .await
                    .map_err(|e| form_error(&what, e, max_bytes))?;
            }
        }
    }

    let (filename, data) = file.ok_or_else(|| ApiError::BadRequest("Please upload a PDF document".into()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".into()));
    }

    Ok(UploadForm {
        filename,
        data,
        api_key,
        model,
    })
}

/// Connect to the model, extract the PDF, and build an engine for it.
async fn build_engine(state: &AppState, form: UploadForm) -> ApiResult<(ChatEngine, String)> {
    let model = form
        .model
        .unwrap_or_else(|| state.settings.default_model.clone());
    let client = state.connector.connect(&model, form.api_key.as_deref())?;

    let UploadForm { filename, data, .. } = form;
    let extractor = Arc::clone(&state.extractor);
    let document = tokio::task::spawn_blocking(move || {
        doc_processor::load_document_with(extractor.as_ref(), &filename, &data)
    })
    .await
    .map_err(|e| DocumentReadError::Parse(format!("text extraction aborted: {}", e)))??;

    tracing::info!(
        filename = document.filename(),
        chars = document.full_text().len(),
        %model,
        "document ready"
    );

    let engine = ChatEngine::new(
        client,
        document,
        state.settings.persona,
        state.settings.max_history_turns,
    );
    Ok((engine, model))
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SessionSummary>)> {
    let form = parse_upload(multipart, state.settings.max_upload_bytes).await?;
    let (engine, model) = build_engine(&state, form).await?;
    let session = Session::new(engine, model);
    let summary = session.summary();
    state.sessions.insert(session).await;
    tracing::info!(session_id = %summary.session_id, "session created");
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionSummary>> {
    let handle = session_handle(&state, id).await?;
    let session = handle.lock().await;
    Ok(Json(session.summary()))
}

pub async fn replace_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<SessionSummary>> {
    let handle = session_handle(&state, id).await?;
    let form = parse_upload(multipart, state.settings.max_upload_bytes).await?;
    let (engine, model) = build_engine(&state, form).await?;

    let mut session = handle.lock().await;
    session.reseat(engine, model);
    tracing::info!(session_id = %id, filename = session.document().filename(), "document replaced");
    Ok(Json(session.summary()))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.sessions.remove(id).await {
        tracing::info!(session_id = %id, "session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}
