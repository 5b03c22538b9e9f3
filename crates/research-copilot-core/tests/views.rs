//! Integration tests for the view state machines
//!
//! These tests drive each view against a scripted backend:
//! - Upload, refresh and delete with the persisted cache
//! - Summary and inline translation
//! - Question answering transcript rules
//! - Translation downloads and their error messages

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use pretty_assertions::assert_eq;
use research_copilot_core::{
    Answer, AnalysisView, BackendApi, Copilot, DocId, DocumentCache, DocumentRecord, Error,
    FileMetadata, Lang, ProcessingStage, ProgressSchedule, ProgressSink, QaView, Result, Role,
    TranslateView, UploadFile, UploadView, View,
    config::{AppConfig, ProgressConfig},
    view::{AnalysisState, DeleteOutcome, ListStatus},
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Scripted Backend
// =============================================================================

/// In-memory backend. Every call is counted; individual operations can be
/// scripted to fail with an HTTP status, or the whole backend taken offline.
struct MockBackend {
    files: Mutex<Vec<DocumentRecord>>,
    next_doc_id: String,
    summary: String,
    upload_delay: Duration,
    failures: Mutex<HashMap<&'static str, (u16, Option<String>)>>,
    offline: AtomicBool,
    calls: Mutex<Vec<&'static str>>,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            files: Mutex::new(Vec::new()),
            next_doc_id: "abc123".to_string(),
            summary: "Key findings\nThe method improves recall.\n\nLimitations apply.".to_string(),
            upload_delay: Duration::from_secs(5),
            failures: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_files(records: Vec<DocumentRecord>) -> Self {
        let backend = Self::new();
        *backend.files.lock().unwrap() = records;
        backend
    }

    fn fail(&self, op: &'static str, status: u16, detail: Option<&str>) {
        self.failures
            .lock()
            .unwrap()
            .insert(op, (status, detail.map(str::to_string)));
    }

    fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    fn check(&self, op: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(op);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("connection refused".to_string()));
        }
        match self.failures.lock().unwrap().get(op) {
            Some((status, detail)) => Err(Error::Api {
                status: *status,
                detail: detail.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BackendApi for MockBackend {
    async fn upload(&self, file: UploadFile) -> Result<DocId> {
        self.check("upload")?;
        tokio::time::sleep(self.upload_delay).await;

        let id = DocId::new(self.next_doc_id.clone());
        self.files.lock().unwrap().push(DocumentRecord {
            id: id.clone(),
            filename: file.filename,
            uploaded_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_files(&self) -> Result<Vec<DocumentRecord>> {
        self.check("list_files")?;
        Ok(self.files.lock().unwrap().clone())
    }

    async fn file_info(&self, id: &DocId) -> Result<FileMetadata> {
        self.check("file_info")?;
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|r| &r.id == id)
            .map(FileMetadata::from)
            .ok_or(Error::Api {
                status: 404,
                detail: Some("Document not found".to_string()),
            })
    }

    async fn delete(&self, id: &DocId) -> Result<()> {
        self.check("delete")?;
        self.files.lock().unwrap().retain(|r| &r.id != id);
        Ok(())
    }

    async fn analyze(&self, _id: &DocId) -> Result<String> {
        self.check("analyze")?;
        Ok(self.summary.clone())
    }

    async fn translate_summary(&self, _id: &DocId, lang: &Lang) -> Result<String> {
        self.check("translate_summary")?;
        Ok(format!("[{lang}] {}", self.summary))
    }

    async fn translate_document(&self, _id: &DocId, lang: &Lang) -> Result<Bytes> {
        self.check("translate_document")?;
        Ok(Bytes::from(format!("document translated into {lang}")))
    }

    async fn ask(&self, _id: &DocId, question: &str) -> Result<Answer> {
        self.check("ask")?;
        Ok(Answer {
            answer: format!("Answer to: {question}"),
            sources: vec!["page 2".to_string(), "page 7".to_string()],
        })
    }
}

/// Records every stage reported during an upload.
#[derive(Default)]
struct StageLog {
    stages: Mutex<Vec<ProcessingStage>>,
}

impl ProgressSink for StageLog {
    fn stage_changed(&self, stage: ProcessingStage) {
        self.stages.lock().unwrap().push(stage);
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

fn record(id: &str, filename: &str) -> DocumentRecord {
    DocumentRecord {
        id: DocId::new(id),
        filename: filename.to_string(),
        uploaded_at: Utc::now(),
    }
}

fn fast_schedule() -> ProgressSchedule {
    ProgressSchedule::from_config(&ProgressConfig {
        extracting_after_ms: 1_000,
        summarizing_after_ms: 2_000,
        indexing_after_ms: 3_000,
        finalizing_after_ms: 4_000,
        tick_ms: 100,
    })
}

fn upload_view(cache: &DocumentCache) -> UploadView {
    UploadView::with_timing(cache.clone(), fast_schedule(), Duration::from_secs(2))
}

fn ids(records: &[DocumentRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

// =============================================================================
// Upload View
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_upload_adds_single_record_and_schedules_refresh() {
    let backend = MockBackend::new();
    let cache = DocumentCache::in_memory();
    let mut view = upload_view(&cache);
    view.refresh(&backend).await;
    assert!(view.files().is_empty());

    let log = StageLog::default();
    let record = view
        .upload(&backend, UploadFile::new("paper.pdf", b"%PDF-1.7".to_vec()), &log)
        .await
        .expect("upload succeeds");

    assert_eq!(record.id.as_str(), "abc123");
    assert_eq!(record.filename, "paper.pdf");
    assert_eq!(ids(view.files()), vec!["abc123"]);
    assert_eq!(view.files()[0].filename, "paper.pdf");
    assert_eq!(ids(&cache.load()), vec!["abc123"]);
    assert_eq!(view.stage(), ProcessingStage::Complete);

    let stages = log.stages.lock().unwrap().clone();
    assert_eq!(stages.first(), Some(&ProcessingStage::Uploading));
    assert_eq!(stages.last(), Some(&ProcessingStage::Complete));
    assert!(stages.contains(&ProcessingStage::Indexing));
    assert!(stages.windows(2).all(|w| w[0] < w[1]));

    // The scheduled refresh runs two seconds later and keeps one record
    let lists_before = backend.calls("list_files");
    view.settle(&backend).await;
    assert_eq!(backend.calls("list_files"), lists_before + 1);
    assert_eq!(ids(view.files()), vec!["abc123"]);
    assert_eq!(view.stage(), ProcessingStage::NotStarted);
}

#[tokio::test]
async fn test_upload_failure_surfaces_detail_and_keeps_list() {
    let backend = MockBackend::with_files(vec![record("a", "a.pdf")]);
    backend.fail("upload", 413, Some("File too large"));
    let cache = DocumentCache::in_memory();
    let mut view = upload_view(&cache);
    view.refresh(&backend).await;

    let result = view
        .upload(&backend, UploadFile::new("huge.pdf", vec![0; 16]), &research_copilot_core::NoProgress)
        .await;

    assert!(result.is_none());
    assert_eq!(view.error(), Some("File too large"));
    assert_eq!(ids(view.files()), vec!["a"]);
    assert_eq!(view.stage(), ProcessingStage::NotStarted);
    assert!(view.can_upload());
}

#[tokio::test]
async fn test_upload_failure_without_detail_uses_generic_message() {
    let backend = MockBackend::new();
    backend.go_offline();
    let mut view = upload_view(&DocumentCache::in_memory());

    view.upload(&backend, UploadFile::new("p.pdf", vec![1]), &research_copilot_core::NoProgress)
        .await;

    assert_eq!(view.error(), Some("Upload failed. Please try again."));
}

#[tokio::test(start_paused = true)]
async fn test_failed_upload_keeps_refresh_owed_by_earlier_success() {
    let backend = MockBackend::new();
    let mut view = upload_view(&DocumentCache::in_memory());

    view.upload(&backend, UploadFile::new("paper.pdf", vec![1]), &research_copilot_core::NoProgress)
        .await
        .expect("first upload succeeds");
    let due = view.refresh_due().expect("refresh scheduled");

    backend.fail("upload", 500, None);
    let log = StageLog::default();
    let second = view
        .upload(&backend, UploadFile::new("other.pdf", vec![2]), &log)
        .await;
    assert!(second.is_none());
    assert_eq!(view.stage(), ProcessingStage::NotStarted);
    assert_eq!(log.stages.lock().unwrap().last(), Some(&ProcessingStage::NotStarted));
    assert_eq!(view.refresh_due(), Some(due));

    view.settle(&backend).await;
    assert_eq!(backend.calls("list_files"), 1);
    assert_eq!(ids(view.files()), vec!["abc123"]);
    assert_eq!(view.refresh_due(), None);
}

#[test]
fn test_second_upload_rejected_while_first_in_flight() {
    let mut view = upload_view(&DocumentCache::in_memory());

    assert!(view.begin_upload(UploadFile::new("one.pdf", vec![1])).is_some());
    assert!(view.begin_upload(UploadFile::new("two.pdf", vec![2])).is_none());
    assert!(view.begin_upload(UploadFile::new("  ", vec![3])).is_none());
}

#[tokio::test]
async fn test_startup_shows_cache_until_refresh_replaces_it() {
    let cache = DocumentCache::in_memory();
    cache.replace(&[record("stale", "old.pdf")]).unwrap();
    let backend = MockBackend::with_files(vec![record("fresh", "new.pdf")]);

    let mut view = upload_view(&cache);
    assert_eq!(view.list_status(), ListStatus::Cached);
    assert_eq!(ids(view.files()), vec!["stale"]);

    view.refresh(&backend).await;
    assert_eq!(view.list_status(), ListStatus::Validated);
    assert_eq!(ids(view.files()), vec!["fresh"]);
    assert_eq!(ids(&cache.load()), vec!["fresh"]);
}

#[tokio::test]
async fn test_refresh_failure_clears_cache_instead_of_showing_it() {
    let cache = DocumentCache::in_memory();
    cache.replace(&[record("stale", "old.pdf")]).unwrap();
    let backend = MockBackend::new();
    backend.go_offline();

    let mut view = upload_view(&cache);
    view.refresh(&backend).await;

    assert!(view.files().is_empty());
    assert!(cache.load().is_empty());
    assert_eq!(view.list_status(), ListStatus::Unavailable);
    assert_eq!(view.error(), Some("Failed to load files"));
}

#[tokio::test]
async fn test_empty_backend_list_clears_cache() {
    let cache = DocumentCache::in_memory();
    cache.replace(&[record("gone", "gone.pdf")]).unwrap();
    let backend = MockBackend::new();

    let mut view = upload_view(&cache);
    view.refresh(&backend).await;

    assert!(view.files().is_empty());
    assert!(cache.load().is_empty());
}

#[tokio::test]
async fn test_delete_removes_from_list_and_cache() {
    let backend = MockBackend::with_files(vec![record("a", "a.pdf"), record("b", "b.pdf")]);
    let cache = DocumentCache::in_memory();
    let mut view = upload_view(&cache);
    view.refresh(&backend).await;

    let outcome = view.delete(&backend, &DocId::new("a"), |r| r.filename == "a.pdf").await;
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(ids(view.files()), vec!["b"]);
    assert_eq!(ids(&cache.load()), vec!["b"]);

    // A later authoritative refresh keeps it gone
    view.refresh(&backend).await;
    assert_eq!(ids(view.files()), vec!["b"]);
    assert_eq!(ids(&cache.load()), vec!["b"]);
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let backend = MockBackend::with_files(vec![record("a", "a.pdf")]);
    let mut view = upload_view(&DocumentCache::in_memory());
    view.refresh(&backend).await;

    let outcome = view.delete(&backend, &DocId::new("a"), |_| false).await;
    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert_eq!(backend.calls("delete"), 0);
    assert_eq!(ids(view.files()), vec!["a"]);
}

#[tokio::test]
async fn test_delete_failure_leaves_state_unchanged() {
    let backend = MockBackend::with_files(vec![record("a", "a.pdf")]);
    backend.fail("delete", 500, None);
    let cache = DocumentCache::in_memory();
    let mut view = upload_view(&cache);
    view.refresh(&backend).await;

    let outcome = view.delete(&backend, &DocId::new("a"), |_| true).await;
    assert_eq!(outcome, DeleteOutcome::Failed("Failed to delete file".to_string()));
    assert_eq!(ids(view.files()), vec!["a"]);
    assert_eq!(ids(&cache.load()), vec!["a"]);
    assert!(view.is_delete_enabled(&DocId::new("a")));
}

#[tokio::test]
async fn test_delete_is_serialized_per_row() {
    let backend = MockBackend::with_files(vec![record("a", "a.pdf"), record("b", "b.pdf")]);
    let mut view = upload_view(&DocumentCache::in_memory());
    view.refresh(&backend).await;

    let a = DocId::new("a");
    let b = DocId::new("b");
    assert!(view.begin_delete(&a).is_some());
    assert!(!view.is_delete_enabled(&a));
    assert!(view.begin_delete(&a).is_none());

    // Other rows stay interactive
    assert!(view.is_delete_enabled(&b));
    assert!(view.begin_delete(&b).is_some());

    assert_eq!(view.finish_delete(&a, Ok(())), DeleteOutcome::Deleted);
    assert!(view.is_delete_enabled(&a));
    assert_eq!(ids(view.files()), vec!["b"]);
}

// =============================================================================
// Analysis View
// =============================================================================

#[tokio::test]
async fn test_entering_analysis_summarizes_exactly_once() {
    let backend = MockBackend::with_files(vec![record("abc123", "paper.pdf")]);
    let mut view = AnalysisView::new(DocId::new("abc123"));

    view.enter(&backend, None).await;

    assert_eq!(backend.calls("analyze"), 1);
    assert_eq!(view.summary(), Some(backend.summary.as_str()));
    assert_eq!(view.error(), None);
    assert_eq!(
        view.paragraphs(),
        vec!["Key findings", "The method improves recall.", "Limitations apply."]
    );
    assert_eq!(view.metadata().value().unwrap().filename, "paper.pdf");
}

#[tokio::test]
async fn test_analysis_failure_is_retryable() {
    let backend = MockBackend::new();
    backend.fail("analyze", 404, Some("Document not found"));
    let mut view = AnalysisView::new(DocId::new("nope"));

    view.enter(&backend, None).await;
    assert_eq!(view.error(), Some("Document not found"));
    assert_eq!(view.summary(), None);
    assert!(view.can_summarize());

    backend.failures.lock().unwrap().clear();
    view.summarize(&backend).await;
    assert_eq!(view.error(), None);
    assert!(view.summary().is_some());
    assert_eq!(backend.calls("analyze"), 2);
}

#[tokio::test]
async fn test_failed_resummarize_keeps_summary_on_display() {
    let backend = MockBackend::new();
    let mut view = AnalysisView::new(DocId::new("abc123"));
    view.enter(&backend, None).await;
    let original = view.display_text().unwrap().to_string();

    let id = view.begin_summarize().expect("summary can be regenerated");
    assert_eq!(view.display_text(), Some(original.as_str()));
    assert!(!view.can_translate());

    backend.fail("analyze", 503, None);
    let result = backend.analyze(&id).await;
    view.finish_summarize(result);

    assert_eq!(view.error(), Some("Analysis failed"));
    assert_eq!(view.display_text(), Some(original.as_str()));
    assert!(view.can_summarize());
}

#[tokio::test]
async fn test_translate_then_revert_restores_summary() {
    let backend = MockBackend::new();
    let mut view = AnalysisView::new(DocId::new("abc123"));
    view.enter(&backend, None).await;
    let original = view.display_text().unwrap().to_string();

    view.translate(&backend, &Lang::new("ja")).await;
    assert!(matches!(view.state(), AnalysisState::Translated { .. }));
    assert_eq!(view.display_text().unwrap(), format!("[ja] {original}"));

    view.show_original();
    assert_eq!(view.display_text().unwrap(), original);
    assert!(matches!(view.state(), AnalysisState::Summarized { .. }));
}

#[tokio::test]
async fn test_failed_translation_keeps_summary_visible() {
    let backend = MockBackend::new();
    backend.fail("translate_summary", 500, None);
    let mut view = AnalysisView::new(DocId::new("abc123"));
    view.enter(&backend, None).await;

    view.translate(&backend, &Lang::new("fr")).await;

    assert_eq!(view.error(), Some("Translation failed"));
    assert_eq!(view.display_text(), Some(backend.summary.as_str()));
    assert!(view.can_translate());
}

#[tokio::test]
async fn test_one_summary_translation_at_a_time() {
    let backend = MockBackend::new();
    let mut view = AnalysisView::new(DocId::new("abc123"));
    view.enter(&backend, None).await;

    assert_eq!(view.begin_translate(&Lang::new("de")), Some(Lang::new("de")));
    assert_eq!(view.translating(), Some(&Lang::new("de")));
    assert_eq!(view.begin_translate(&Lang::new("es")), None);
    assert!(!view.can_summarize());

    view.finish_translate(Ok("Zusammenfassung".to_string()));
    assert_eq!(view.display_text(), Some("Zusammenfassung"));
}

#[tokio::test]
async fn test_inline_translation_only_offers_summary_languages() {
    let backend = MockBackend::new();
    let mut view = AnalysisView::new(DocId::new("abc123"));
    view.enter(&backend, None).await;

    assert_eq!(view.begin_translate(&Lang::new("it")), None);
    assert_eq!(backend.calls("translate_summary"), 0);
}

// =============================================================================
// Question-Answering View
// =============================================================================

#[tokio::test]
async fn test_questions_alternate_with_answers() {
    let backend = MockBackend::new();
    let mut view = QaView::new(DocId::new("abc123"));
    view.enter(&backend, None).await;

    let questions = ["What is the dataset?", "How large is it?", "Who wrote it?"];
    for question in questions {
        assert!(view.ask_text(&backend, question).await);
    }

    let transcript = view.transcript();
    assert_eq!(transcript.len(), 2 * questions.len());
    for (i, question) in questions.iter().enumerate() {
        let asked = &transcript[2 * i];
        let answered = &transcript[2 * i + 1];
        assert_eq!(asked.role, Role::User);
        assert_eq!(asked.text, *question);
        assert_eq!(answered.role, Role::Assistant);
        assert_eq!(answered.text, format!("Answer to: {question}"));
        assert_eq!(answered.sources, vec!["page 2", "page 7"]);
    }
    assert_eq!(view.scroll_target(), Some(5));
    assert_eq!(view.input(), "");
}

#[test]
fn test_submit_while_pending_is_noop() {
    let mut view = QaView::new(DocId::new("abc123"));

    view.set_input("first?");
    let pending = view.submit().expect("first question accepted");
    assert_eq!(pending.question, "first?");

    view.set_input("second?");
    assert!(view.submit().is_none());
    assert_eq!(view.transcript().len(), 1);
    assert!(view.is_pending());

    view.complete(Ok(Answer {
        answer: "yes".to_string(),
        sources: Vec::new(),
    }));
    assert_eq!(view.transcript().len(), 2);
    assert!(!view.is_pending());
}

#[test]
fn test_blank_question_rejected() {
    let mut view = QaView::new(DocId::new("abc123"));
    view.set_input("   \t");

    assert!(!view.can_submit());
    assert!(view.submit().is_none());
    assert!(view.transcript().is_empty());
}

#[tokio::test]
async fn test_missing_document_keeps_question_and_shows_error() {
    let backend = MockBackend::new();
    backend.fail("ask", 404, None);
    let mut view = QaView::new(DocId::new("missing-doc"));
    view.enter(&backend, None).await;

    assert!(view.ask_text(&backend, "Is anyone there?").await);

    assert_eq!(view.transcript().len(), 1);
    assert_eq!(view.transcript()[0].role, Role::User);
    assert_eq!(view.error(), Some("Failed to get answer"));
    assert_eq!(view.input(), "");
    assert_eq!(view.scroll_target(), Some(0));
}

#[tokio::test]
async fn test_metadata_failure_shows_banner() {
    let backend = MockBackend::new();
    backend.go_offline();
    let mut view = QaView::new(DocId::new("abc123"));

    view.enter(&backend, None).await;

    assert_eq!(view.error(), Some("Failed to load document info"));
    assert!(view.transcript().is_empty());
}

#[tokio::test]
async fn test_metadata_prefers_cache_over_backend() {
    let backend = MockBackend::new();
    let cache = DocumentCache::in_memory();
    cache.replace(&[record("abc123", "cached.pdf")]).unwrap();

    let mut view = QaView::new(DocId::new("abc123"));
    view.enter(&backend, Some(&cache)).await;

    assert_eq!(view.metadata().value().unwrap().filename, "cached.pdf");
    assert_eq!(backend.calls("file_info"), 0);
}

// =============================================================================
// Translation View
// =============================================================================

#[tokio::test]
async fn test_download_named_after_document_and_language() {
    let backend = MockBackend::with_files(vec![record("abc123", "paper.pdf")]);
    let mut view = TranslateView::new(DocId::new("abc123"));
    view.enter(&backend, None).await;
    view.select_language(&Lang::new("it"));

    let download = view.download(&backend).await.expect("download produced");

    assert_eq!(download.filename, "translated_paper.pdf_it.txt");
    assert_eq!(download.bytes, b"document translated into it");
    assert_eq!(view.error(), None);
    assert!(!view.is_in_flight());
}

#[tokio::test]
async fn test_rejected_language_shows_backend_detail() {
    let backend = MockBackend::with_files(vec![record("abc123", "paper.pdf")]);
    backend.fail("translate_document", 400, Some("unsupported language"));
    let mut view = TranslateView::new(DocId::new("abc123"));
    view.enter(&backend, None).await;
    view.select_language(&Lang::new("xx"));

    let download = view.download(&backend).await;

    assert!(download.is_none());
    assert_eq!(view.error(), Some("Invalid request: unsupported language"));
}

#[tokio::test]
async fn test_server_and_network_failures_use_generic_messages() {
    let backend = MockBackend::with_files(vec![record("abc123", "paper.pdf")]);
    let mut view = TranslateView::new(DocId::new("abc123"));
    view.enter(&backend, None).await;

    backend.fail("translate_document", 500, Some("stack trace"));
    assert!(view.download(&backend).await.is_none());
    assert_eq!(
        view.error(),
        Some("Translation service unavailable. Please try again later.")
    );

    backend.go_offline();
    assert!(view.download(&backend).await.is_none());
    assert_eq!(view.error(), Some("Translation failed. Please check your connection."));
}

// =============================================================================
// Navigation
// =============================================================================

#[tokio::test]
async fn test_navigation_enters_views_and_goes_back() {
    let backend = Arc::new(MockBackend::with_files(vec![record("abc123", "paper.pdf")]));
    let mut copilot = Copilot::with_backend(
        backend.clone(),
        DocumentCache::in_memory(),
        AppConfig::default(),
    );

    let view = copilot.navigate("/analyze/abc123").await.unwrap();
    let View::Analysis(analysis) = view else {
        panic!("expected the analysis view");
    };
    assert!(analysis.summary().is_some());
    assert_eq!(backend.calls("analyze"), 1);

    assert!(matches!(copilot.navigate("/qa/abc123").await.unwrap(), View::Qa(_)));
    assert!(matches!(copilot.back().await, View::Analysis(_)));
    assert_eq!(backend.calls("analyze"), 2);
    assert!(matches!(copilot.back().await, View::Upload(_)));

    assert!(matches!(
        copilot.navigate("/settings").await,
        Err(Error::UnknownRoute(_))
    ));
}
