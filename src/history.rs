use crate::llm::ChatMessage;
use serde::{Deserialize, Serialize};

/// One completed question/answer round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

impl Exchange {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Chronological list of exchanges. Entries are only ever appended or bulk-cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversationHistory {
    entries: Vec<Exchange>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, exchange: Exchange) {
        self.entries.push(exchange);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Exchange] {
        &self.entries
    }

    /// Number of chat bubbles the UI shows: two per exchange.
    pub fn message_count(&self) -> usize {
        self.entries.len() * 2
    }

    /// Flatten into the user/assistant message list rendered by the chat page.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.entries
            .iter()
            .flat_map(|e| {
                [
                    ChatMessage::user(e.user.clone()),
                    ChatMessage {
                        role: "assistant".to_string(),
                        content: e.assistant.clone(),
                    },
                ]
            })
            .collect()
    }
}

/// The last `n` entries of `history`, oldest first.
pub fn recent(history: &[Exchange], n: usize) -> &[Exchange] {
    &history[history.len().saturating_sub(n)..]
}
