use crate::doc_processor::DocumentInfo;
use crate::llm::ChatMessage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub document: DocumentInfo,
    pub model: String,
    pub message_count: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Transcript {
    pub session_id: Uuid,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AskResponse {
    pub answer: String,
    pub message_count: usize,
}
