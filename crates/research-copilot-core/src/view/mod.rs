//! View state machines.
//!
//! Each view owns its state and talks to the backend through
//! [`BackendApi`]. Serialized actions are split into a synchronous
//! `begin_*` call, which validates, updates state and returns an owned
//! request (or `None` when the action is currently disabled), and a
//! `finish_*` call that applies the backend result. The async methods run
//! both halves around the backend call.

mod analyze;
mod qa;
mod translate;
mod upload;

pub use analyze::{AnalysisState, AnalysisView, SummaryTranslation};
pub use qa::{PendingQuestion, QaView};
pub use translate::{DownloadRequest, TranslateView, download_filename};
pub use upload::{DeleteOutcome, ListStatus, UploadStatus, UploadView};

use tracing::debug;

use crate::api::BackendApi;
use crate::cache::DocumentCache;
use crate::error::Result;
use crate::model::{DocId, FileMetadata};

/// Lifecycle of a value fetched once when a view is entered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Resolve a document's filename and upload date: the persisted cache
/// first, then the backend's file-info endpoint.
pub async fn resolve_metadata(
    api: &dyn BackendApi,
    cache: Option<&DocumentCache>,
    id: &DocId,
) -> Result<FileMetadata> {
    if let Some(record) = cache.and_then(|cache| cache.lookup(id)) {
        debug!("Metadata for {} served from cache", id);
        return Ok(FileMetadata::from(&record));
    }

    api.file_info(id).await
}

/// Metadata resolution shared by the three per-document views.
pub(crate) async fn load_metadata(
    api: &dyn BackendApi,
    cache: Option<&DocumentCache>,
    id: &DocId,
    fallback: &str,
) -> LoadState<FileMetadata> {
    match resolve_metadata(api, cache, id).await {
        Ok(metadata) => LoadState::Loaded(metadata),
        Err(e) => {
            debug!("Metadata lookup for {} failed: {}", id, e);
            LoadState::Failed(e.user_message(fallback))
        }
    }
}
