use crate::doc_processor::Document;
use crate::history::Exchange;
use crate::llm::{Generate, LlmError};
use crate::prompt::{self, Persona, DEFAULT_MAX_HISTORY_TURNS};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Prefix used when a generation failure is shown in place of an answer.
pub const ERROR_INDICATOR: &str = "Error generating response:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    Transport,
    Api { status: u16 },
    Parse,
    Blocked,
    Config,
}

/// The model collaborator failed to answer one question.
#[derive(Debug, Clone, thiserror::Error, Serialize)]
#[error("Error generating response: {message}")]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        let kind = match &err {
            LlmError::Http(_) => GenerationErrorKind::Transport,
            LlmError::Api { status, .. } => GenerationErrorKind::Api { status: *status },
            LlmError::Parse(_) => GenerationErrorKind::Parse,
            LlmError::Blocked(_) => GenerationErrorKind::Blocked,
            LlmError::Config(_) => GenerationErrorKind::Config,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Answers questions about one document by framing each question with the
/// document text and a window of prior exchanges.
#[derive(Clone)]
pub struct ChatEngine {
    client: Arc<dyn Generate>,
    document: Document,
    persona: Persona,
    preamble: String,
    max_history_turns: usize,
}

impl fmt::Debug for ChatEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatEngine")
            .field("filename", &self.document.filename())
            .field("persona", &self.persona)
            .field("max_history_turns", &self.max_history_turns)
            .finish_non_exhaustive()
    }
}

impl ChatEngine {
    pub fn new(
        client: Arc<dyn Generate>,
        document: Document,
        persona: Persona,
        max_history_turns: usize,
    ) -> Self {
        let preamble = prompt::system_preamble(persona, &document);
        Self {
            client,
            document,
            persona,
            preamble,
            max_history_turns,
        }
    }

    pub fn with_defaults(client: Arc<dyn Generate>, document: Document) -> Self {
        Self::new(client, document, Persona::General, DEFAULT_MAX_HISTORY_TURNS)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    pub fn max_history_turns(&self) -> usize {
        self.max_history_turns
    }

    /// The exact text sent to the model for `question`. Pure in its inputs.
    pub fn build_payload(&self, question: &str, history: &[Exchange]) -> String {
        prompt::build_payload(
            &self.preamble,
            self.persona,
            history,
            self.max_history_turns,
            question,
        )
    }

    pub async fn ask(&self, question: &str, history: &[Exchange]) -> Result<String, GenerationError> {
        let payload = self.build_payload(question, history);
        let started = Instant::now();
        tracing::info!(
            filename = self.document.filename(),
            question_len = question.len(),
            history = history.len(),
            payload_len = payload.len(),
            "sending question to model"
        );

        match self.client.generate(&payload).await {
            Ok(answer) => {
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    answer_len = answer.len(),
                    "model answered"
                );
                Ok(answer)
            }
            Err(err) => {
                tracing::warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "model request failed"
                );
                Err(err.into())
            }
        }
    }

    /// Like [`ask`](Self::ask) but renders a failure as answer text.
    pub async fn ask_or_error_text(&self, question: &str, history: &[Exchange]) -> String {
        match self.ask(question, history).await {
            Ok(answer) => answer,
            Err(err) => err.to_string(),
        }
    }
}
