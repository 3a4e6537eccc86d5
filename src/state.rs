use crate::config::AppSettings;
use crate::doc_processor::{PageSource, PdfExtract};
use crate::llm::Connect;
use crate::session::SessionStore;
use std::sync::Arc;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub settings: AppSettings,
    pub sessions: SessionStore,
    pub connector: Arc<dyn Connect>,
    pub extractor: Arc<dyn PageSource>,
}

impl AppState {
    pub fn new(settings: AppSettings) -> Self {
        let connector: Arc<dyn Connect> = Arc::new(settings.clone());
        Self::with_parts(settings, connector, Arc::new(PdfExtract))
    }

    pub fn with_parts(
        settings: AppSettings,
        connector: Arc<dyn Connect>,
        extractor: Arc<dyn PageSource>,
    ) -> Self {
        Self {
            settings,
            sessions: SessionStore::new(),
            connector,
            extractor,
        }
    }
}
