use crate::llm::ModelInfo;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use std::collections::BTreeMap;
use std::sync::Arc;

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, String>> {
    Json(state.settings.masked())
}

pub async fn get_available_models(State(state): State<Arc<AppState>>) -> Json<Vec<ModelInfo>> {
    Json(state.settings.available_models())
}
