pub mod models;

use crate::doc_processor::Document;
use crate::engine::{ChatEngine, GenerationError};
use crate::history::{ConversationHistory, Exchange};
use models::SessionSummary;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// One user's chat: the engine (which owns the loaded document) and the history.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    model: String,
    engine: ChatEngine,
    history: ConversationHistory,
}

impl Session {
    pub fn new(engine: ChatEngine, model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            model: model.into(),
            engine,
            history: ConversationHistory::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document(&self) -> &Document {
        self.engine.document()
    }

    pub fn engine(&self) -> &ChatEngine {
        &self.engine
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Ask about the loaded document. Only successful answers join the history.
    pub async fn ask(&mut self, question: &str) -> Result<String, GenerationError> {
        let answer = self.engine.ask(question, self.history.entries()).await?;
        self.history.push(Exchange::new(question, answer.clone()));
        Ok(answer)
    }

    /// Swap in an engine for a new document. The old conversation no longer applies.
    pub fn reseat(&mut self, engine: ChatEngine, model: impl Into<String>) {
        self.engine = engine;
        self.model = model.into();
        self.history.clear();
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            document: self.document().info(),
            model: self.model.clone(),
            message_count: self.history.message_count(),
        }
    }
}

/// In-memory sessions keyed by id. Each session has its own lock, so calls on
/// one session run one at a time while different sessions proceed independently.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) -> Uuid {
        let id = session.id();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
