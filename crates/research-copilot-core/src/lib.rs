//! Research Copilot Core Library
//!
//! This library provides the client side of the research copilot:
//! - A typed client for the document backend (upload, summary, Q&A, translation)
//! - View state machines for the upload, analysis, Q&A and translation views
//! - Path routing between views with back navigation
//! - A persisted cache of uploaded documents

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod progress;
pub mod router;
pub mod util;
pub mod view;

pub use api::{Answer, BackendApi, HttpBackend, UploadFile};
pub use cache::{DiskStore, DocumentCache, KeyValueStore, MemoryStore};
pub use config::{
    AppConfig, Lang, LanguageOption, download_languages, find_language, require_language,
    summary_languages, DEFAULT_DOWNLOAD_LANG,
};
pub use error::{Error, ErrorKind, Result};
pub use model::{DocId, DocumentRecord, Download, FileMetadata, Role, TranscriptEntry};
pub use progress::{NoProgress, ProcessingStage, ProgressSchedule, ProgressSink};
pub use router::{History, Route};
pub use util::clear_document_cache;
pub use view::{AnalysisView, LoadState, QaView, TranslateView, UploadView};

use std::sync::Arc;
use tracing::info;

/// A view instance created for a route
pub enum View {
    Upload(UploadView),
    Analysis(AnalysisView),
    Qa(QaView),
    Translate(TranslateView),
}

/// Entry point tying the backend, the persisted cache and navigation
/// together. Views are created fresh on every navigation; nothing but the
/// route and the cache carries over between them.
pub struct Copilot {
    api: Arc<dyn BackendApi>,
    cache: DocumentCache,
    config: AppConfig,
    history: History,
}

impl Copilot {
    /// Create a copilot talking HTTP to `config.api_base`
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let api = Arc::new(HttpBackend::from_config(&config)?);
        let cache = DocumentCache::from_config(&config.cache)?;

        Ok(Self::with_backend(api, cache, config))
    }

    /// Create with a custom backend and cache
    pub fn with_backend(api: Arc<dyn BackendApi>, cache: DocumentCache, config: AppConfig) -> Self {
        Self {
            api,
            cache,
            config,
            history: History::new(),
        }
    }

    pub fn api(&self) -> &dyn BackendApi {
        self.api.as_ref()
    }

    pub const fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    pub const fn history(&self) -> &History {
        &self.history
    }

    /// Navigate to `path` and enter its view.
    pub async fn navigate(&mut self, path: &str) -> Result<View> {
        let route = self.history.navigate(path)?.clone();
        Ok(self.enter(&route).await)
    }

    /// Go back one step and re-enter the previous view.
    pub async fn back(&mut self) -> View {
        let route = self.history.back().clone();
        self.enter(&route).await
    }

    /// Create the view for `route` and run its entry actions.
    pub async fn enter(&self, route: &Route) -> View {
        info!("Entering {}", route);
        let api = self.api.as_ref();

        match route {
            Route::Upload => {
                let mut view = UploadView::new(self.cache.clone(), &self.config);
                view.refresh(api).await;
                View::Upload(view)
            }
            Route::Analyze(id) => {
                let mut view = AnalysisView::new(id.clone());
                view.enter(api, Some(&self.cache)).await;
                View::Analysis(view)
            }
            Route::Qa(id) => {
                let mut view = QaView::new(id.clone());
                view.enter(api, Some(&self.cache)).await;
                View::Qa(view)
            }
            Route::Translate(id) => {
                let mut view = TranslateView::new(id.clone());
                view.enter(api, Some(&self.cache)).await;
                View::Translate(view)
            }
        }
    }
}
