use tracing::{info, warn};

use super::{LoadState, load_metadata};
use crate::api::BackendApi;
use crate::cache::DocumentCache;
use crate::config::{DEFAULT_DOWNLOAD_LANG, Lang, LanguageOption, download_languages};
use crate::error::{Error, ErrorKind, Result};
use crate::model::{DocId, Download, FileMetadata};

const METADATA_FAILED: &str = "Failed to load document info";
const REJECTED_FALLBACK: &str = "request rejected";
const SERVICE_UNAVAILABLE: &str = "Translation service unavailable. Please try again later.";
const CONNECTION_FAILED: &str = "Translation failed. Please check your connection.";

/// A translation accepted for sending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub id: DocId,
    pub lang: Lang,
}

/// Name of the downloaded translation file
pub fn download_filename(filename: &str, lang: &Lang) -> String {
    format!("translated_{filename}_{lang}.txt")
}

/// Downloadable translation of one document.
pub struct TranslateView {
    id: DocId,
    metadata: LoadState<FileMetadata>,
    lang: Lang,
    in_flight: bool,
    error: Option<String>,
    languages: Vec<LanguageOption>,
}

impl TranslateView {
    pub fn new(id: DocId) -> Self {
        Self {
            id,
            metadata: LoadState::Loading,
            lang: Lang::new(DEFAULT_DOWNLOAD_LANG),
            in_flight: false,
            error: None,
            languages: download_languages(),
        }
    }

    pub async fn enter(&mut self, api: &dyn BackendApi, cache: Option<&DocumentCache>) {
        self.metadata = load_metadata(api, cache, &self.id, METADATA_FAILED).await;
        if let Some(message) = self.metadata.error() {
            self.error = Some(message.to_string());
        }
    }

    pub const fn id(&self) -> &DocId {
        &self.id
    }

    pub fn filename(&self) -> Option<&str> {
        self.metadata.value().map(|m| m.filename.as_str())
    }

    pub const fn lang(&self) -> &Lang {
        &self.lang
    }

    pub fn languages(&self) -> &[LanguageOption] {
        &self.languages
    }

    pub const fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Pick the target language. Ignored while a request is in flight.
    ///
    /// Codes outside [`Self::languages`] are passed through untouched; the
    /// backend decides what it accepts.
    pub fn select_language(&mut self, lang: &Lang) {
        if !self.in_flight {
            self.lang = lang.clone();
        }
    }

    pub fn begin_download(&mut self) -> Option<DownloadRequest> {
        if self.in_flight {
            return None;
        }

        self.in_flight = true;
        self.error = None;
        Some(DownloadRequest {
            id: self.id.clone(),
            lang: self.lang.clone(),
        })
    }

    /// Apply the backend result, returning the file to save on success.
    pub fn finish_download(&mut self, result: Result<bytes::Bytes>) -> Option<Download> {
        if !self.in_flight {
            return None;
        }
        self.in_flight = false;

        match result {
            Ok(body) => {
                // Without metadata the id stands in for the filename
                let base = self.filename().unwrap_or(self.id.as_str());
                let download = Download {
                    filename: download_filename(base, &self.lang),
                    bytes: body.to_vec(),
                };
                info!("Translation ready: {} ({} bytes)", download.filename, download.bytes.len());
                Some(download)
            }
            Err(e) => {
                warn!("Translating {} to {} failed: {}", self.id, self.lang, e);
                self.error = Some(failure_message(&e));
                None
            }
        }
    }

    pub async fn download(&mut self, api: &dyn BackendApi) -> Option<Download> {
        let request = self.begin_download()?;
        let result = api.translate_document(&request.id, &request.lang).await;
        self.finish_download(result)
    }
}

fn failure_message(err: &Error) -> String {
    match err.kind() {
        ErrorKind::Client => format!(
            "Invalid request: {}",
            err.detail().unwrap_or(REJECTED_FALLBACK)
        ),
        ErrorKind::Server => SERVICE_UNAVAILABLE.to_string(),
        _ => CONNECTION_FAILED.to_string(),
    }
}
