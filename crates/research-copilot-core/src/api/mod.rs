mod http;
mod types;

pub use http::HttpBackend;
pub use types::{Answer, UploadFile};

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::Lang;
use crate::error::Result;
use crate::model::{DocId, DocumentRecord, FileMetadata};

/// Operations offered by the document backend.
///
/// Views only talk to the backend through this trait so tests can swap in
/// a scripted implementation.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Upload a PDF; processing (extraction, summary, indexing) happens
    /// before the call returns.
    async fn upload(&self, file: UploadFile) -> Result<DocId>;

    /// Authoritative list of documents
    async fn list_files(&self) -> Result<Vec<DocumentRecord>>;

    async fn file_info(&self, id: &DocId) -> Result<FileMetadata>;

    async fn delete(&self, id: &DocId) -> Result<()>;

    /// Precomputed or on-demand summary
    async fn analyze(&self, id: &DocId) -> Result<String>;

    /// Translate the summary, returning the text
    async fn translate_summary(&self, id: &DocId, lang: &Lang) -> Result<String>;

    /// Translate the document, returning the raw file body
    async fn translate_document(&self, id: &DocId, lang: &Lang) -> Result<Bytes>;

    async fn ask(&self, id: &DocId, question: &str) -> Result<Answer>;
}
