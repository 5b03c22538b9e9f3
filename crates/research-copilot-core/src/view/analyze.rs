use tracing::{debug, warn};

use super::{LoadState, load_metadata};
use crate::api::BackendApi;
use crate::cache::DocumentCache;
use crate::config::{Lang, LanguageOption, find_language, summary_languages};
use crate::error::Result;
use crate::model::{DocId, FileMetadata};

const METADATA_FAILED: &str = "Failed to load document";
const ANALYSIS_FAILED: &str = "Analysis failed";
const TRANSLATION_FAILED: &str = "Translation failed";

/// Translated rendition of the summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryTranslation {
    pub lang: Lang,
    pub text: String,
}

/// Summary lifecycle of the analysis view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisState {
    /// Entered, metadata not resolved yet
    Loading,
    /// No summary requested yet
    Ready,
    /// Summary requested; an earlier summary stays on display until it
    /// is replaced
    Summarizing { previous: Option<String> },
    Summarized { summary: String },
    Translating { summary: String, lang: Lang },
    Translated {
        summary: String,
        translation: SummaryTranslation,
    },
    /// Last action failed. A summary obtained earlier stays on display.
    Failed {
        message: String,
        summary: Option<String>,
    },
}

/// Summary of one document, with inline translation.
pub struct AnalysisView {
    id: DocId,
    metadata: LoadState<FileMetadata>,
    state: AnalysisState,
    languages: Vec<LanguageOption>,
}

impl AnalysisView {
    pub fn new(id: DocId) -> Self {
        Self {
            id,
            metadata: LoadState::Loading,
            state: AnalysisState::Loading,
            languages: summary_languages(),
        }
    }

    pub const fn id(&self) -> &DocId {
        &self.id
    }

    pub const fn metadata(&self) -> &LoadState<FileMetadata> {
        &self.metadata
    }

    pub const fn state(&self) -> &AnalysisState {
        &self.state
    }

    pub fn languages(&self) -> &[LanguageOption] {
        &self.languages
    }

    /// The untranslated summary, if one has been obtained.
    pub fn summary(&self) -> Option<&str> {
        match &self.state {
            AnalysisState::Summarized { summary }
            | AnalysisState::Summarizing {
                previous: Some(summary),
            }
            | AnalysisState::Translating { summary, .. }
            | AnalysisState::Translated { summary, .. }
            | AnalysisState::Failed {
                summary: Some(summary),
                ..
            } => Some(summary),
            _ => None,
        }
    }

    /// Text currently on display: the translation when one is shown,
    /// otherwise the summary.
    pub fn display_text(&self) -> Option<&str> {
        match &self.state {
            AnalysisState::Translated { translation, .. } => Some(&translation.text),
            _ => self.summary(),
        }
    }

    /// Displayed text split into non-blank lines
    pub fn paragraphs(&self) -> Vec<&str> {
        self.display_text()
            .map(|text| {
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            AnalysisState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Language whose translation is in flight, for the per-language spinner
    pub const fn translating(&self) -> Option<&Lang> {
        match &self.state {
            AnalysisState::Translating { lang, .. } => Some(lang),
            _ => None,
        }
    }

    pub fn supports(&self, lang: &Lang) -> bool {
        find_language(&self.languages, lang.as_str()).is_some()
    }

    pub const fn can_summarize(&self) -> bool {
        !matches!(
            self.state,
            AnalysisState::Loading
                | AnalysisState::Summarizing { .. }
                | AnalysisState::Translating { .. }
        )
    }

    /// Whether the language selector is enabled
    pub fn can_translate(&self) -> bool {
        !matches!(
            self.state,
            AnalysisState::Summarizing { .. } | AnalysisState::Translating { .. }
        ) && self.summary().is_some()
    }

    /// Resolve metadata, then request the summary once.
    pub async fn enter(&mut self, api: &dyn BackendApi, cache: Option<&DocumentCache>) {
        self.metadata = load_metadata(api, cache, &self.id, METADATA_FAILED).await;
        self.state = AnalysisState::Ready;
        self.summarize(api).await;
    }

    pub fn begin_summarize(&mut self) -> Option<DocId> {
        if !self.can_summarize() {
            return None;
        }
        let previous = self.summary().map(str::to_string);
        self.state = AnalysisState::Summarizing { previous };
        Some(self.id.clone())
    }

    pub fn finish_summarize(&mut self, result: Result<String>) {
        let AnalysisState::Summarizing { previous } = &mut self.state else {
            return;
        };
        let previous = previous.take();

        self.state = match result {
            Ok(summary) => {
                debug!("Summary for {} has {} bytes", self.id, summary.len());
                AnalysisState::Summarized { summary }
            }
            Err(e) => {
                warn!("Summarizing {} failed: {}", self.id, e);
                AnalysisState::Failed {
                    message: e.user_message(ANALYSIS_FAILED),
                    summary: previous,
                }
            }
        };
    }

    pub async fn summarize(&mut self, api: &dyn BackendApi) {
        let Some(id) = self.begin_summarize() else {
            return;
        };
        let result = api.analyze(&id).await;
        self.finish_summarize(result);
    }

    /// Start translating the summary into `lang`. `None` if the selector is
    /// disabled or the language is not offered.
    pub fn begin_translate(&mut self, lang: &Lang) -> Option<Lang> {
        if !self.can_translate() || !self.supports(lang) {
            return None;
        }

        let summary = self.summary()?.to_string();
        self.state = AnalysisState::Translating {
            summary,
            lang: lang.clone(),
        };
        Some(lang.clone())
    }

    pub fn finish_translate(&mut self, result: Result<String>) {
        if self.translating().is_none() {
            return;
        }
        let AnalysisState::Translating { summary, lang } =
            std::mem::replace(&mut self.state, AnalysisState::Ready)
        else {
            return;
        };

        self.state = match result {
            Ok(text) => AnalysisState::Translated {
                summary,
                translation: SummaryTranslation { lang, text },
            },
            Err(e) => {
                warn!("Translating summary of {} to {} failed: {}", self.id, lang, e);
                AnalysisState::Failed {
                    message: e.user_message(TRANSLATION_FAILED),
                    summary: Some(summary),
                }
            }
        };
    }

    pub async fn translate(&mut self, api: &dyn BackendApi, lang: &Lang) {
        let Some(lang) = self.begin_translate(lang) else {
            return;
        };
        let result = api.translate_summary(&self.id, &lang).await;
        self.finish_translate(result);
    }

    /// Drop the translation and show the summary again.
    pub fn show_original(&mut self) {
        if let AnalysisState::Translated { summary, .. } = &mut self.state {
            let summary = std::mem::take(summary);
            self.state = AnalysisState::Summarized { summary };
        }
    }
}
