//! Wire formats of the backend API.

use serde::{Deserialize, Serialize};

use crate::model::{DocId, DocumentRecord, FileMetadata, parse_timestamp};

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// Answer to a question, with the passages it was drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Answer {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub doc_id: DocId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FilesResponse {
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileEntry {
    pub doc_id: DocId,
    pub filename: String,
    pub upload_date: String,
}

impl From<FileEntry> for DocumentRecord {
    fn from(entry: FileEntry) -> Self {
        Self {
            uploaded_at: timestamp_or_now(&entry.upload_date),
            id: entry.doc_id,
            filename: entry.filename,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileInfoResponse {
    pub filename: String,
    pub upload_date: String,
}

impl From<FileInfoResponse> for FileMetadata {
    fn from(info: FileInfoResponse) -> Self {
        Self {
            uploaded_at: timestamp_or_now(&info.upload_date),
            filename: info.filename,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TranslateRequest<'a> {
    pub target_lang: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranslatedSummaryResponse {
    pub translated_summary: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionRequest<'a> {
    pub question: &'a str,
}

/// Error body. Request validation failures put a list in `detail`, so any
/// JSON value is accepted.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn detail_text(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::String(text) => Some(text),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

fn timestamp_or_now(raw: &str) -> chrono::DateTime<chrono::Utc> {
    parse_timestamp(raw).unwrap_or_else(|| {
        tracing::warn!("Unparseable upload date '{}', using current time", raw);
        chrono::Utc::now()
    })
}
