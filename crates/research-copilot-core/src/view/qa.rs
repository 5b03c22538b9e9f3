use tracing::{debug, warn};

use super::{LoadState, load_metadata};
use crate::api::{Answer, BackendApi};
use crate::cache::DocumentCache;
use crate::error::Result;
use crate::model::{DocId, FileMetadata, TranscriptEntry};

const METADATA_FAILED: &str = "Failed to load document info";
const ANSWER_FAILED: &str = "Failed to get answer";

/// A question accepted for sending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuestion {
    pub id: DocId,
    pub question: String,
}

/// Question-answering chat over one document.
///
/// The transcript only grows: a failed question keeps its user entry and
/// gets no assistant entry.
pub struct QaView {
    id: DocId,
    metadata: LoadState<FileMetadata>,
    transcript: Vec<TranscriptEntry>,
    input: String,
    pending: bool,
    error: Option<String>,
    scroll_to: Option<usize>,
}

impl QaView {
    pub fn new(id: DocId) -> Self {
        Self {
            id,
            metadata: LoadState::Loading,
            transcript: Vec::new(),
            input: String::new(),
            pending: false,
            error: None,
            scroll_to: None,
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

    pub const fn metadata(&self) -> &LoadState<FileMetadata> {
        &self.metadata
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Index of the entry the transcript should be scrolled to
    pub const fn scroll_target(&self) -> Option<usize> {
        self.scroll_to
    }

    /// Whether the ask control is enabled
    pub fn can_submit(&self) -> bool {
        !self.pending && !self.input.trim().is_empty()
    }

    /// Accept the current input as a question and append it to the
    /// transcript. `None` for blank input or while a question is pending.
    pub fn submit(&mut self) -> Option<PendingQuestion> {
        if !self.can_submit() {
            return None;
        }

        let question = self.input.clone();
        self.pending = true;
        self.error = None;
        self.transcript.push(TranscriptEntry::user(question.clone()));

        Some(PendingQuestion {
            id: self.id.clone(),
            question,
        })
    }

    /// Apply the answer to the pending question.
    pub fn complete(&mut self, result: Result<Answer>) {
        if !self.pending {
            return;
        }

        match result {
            Ok(answer) => {
                debug!("Answer with {} sources", answer.sources.len());
                self.transcript
                    .push(TranscriptEntry::assistant(answer.answer, answer.sources));
            }
            Err(e) => {
                warn!("Question on {} failed: {}", self.id, e);
                self.error = Some(e.user_message(ANSWER_FAILED));
            }
        }

        self.pending = false;
        self.input.clear();
        self.scroll_to = self.transcript.len().checked_sub(1);
    }

    /// Ask the current input. Returns `false` if nothing was sent.
    pub async fn ask(&mut self, api: &dyn BackendApi) -> bool {
        let Some(pending) = self.submit() else {
            return false;
        };
        let result = api.ask(&pending.id, &pending.question).await;
        self.complete(result);
        true
    }

    /// Set the input to `question` and ask it.
    pub async fn ask_text(&mut self, api: &dyn BackendApi, question: &str) -> bool {
        if self.pending {
            return false;
        }
        self.set_input(question);
        self.ask(api).await
    }
}
