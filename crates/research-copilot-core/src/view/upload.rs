use chrono::Utc;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::{BackendApi, UploadFile};
use crate::cache::DocumentCache;
use crate::config::AppConfig;
use crate::error::Result;
use crate::model::{DocId, DocumentRecord};
use crate::progress::{ProcessingStage, ProgressSchedule, ProgressSink, SimulatedProgress};

const LIST_FAILED: &str = "Failed to load files";
const UPLOAD_FAILED: &str = "Upload failed. Please try again.";
const DELETE_FAILED: &str = "Failed to delete file";

/// Where the displayed document list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
    /// Showing the persisted cache; not yet confirmed by the backend
    Cached,
    Refreshing,
    /// Matches the backend as of the last refresh
    Validated,
    /// Backend unreachable; the list was emptied
    Unavailable,
}

/// Upload slot of the view. One upload at a time.
#[derive(Debug, Clone)]
pub enum UploadStatus {
    Idle,
    InFlight {
        filename: String,
        progress: SimulatedProgress,
    },
    /// Upload succeeded; an authoritative refresh is pending
    Complete { record: DocumentRecord },
}

/// Result of a delete attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user declined the confirmation
    Cancelled,
    /// Unknown id, or a delete for this row is already in flight
    Unavailable,
    Failed(String),
}

/// Document list with upload and delete.
pub struct UploadView {
    files: Vec<DocumentRecord>,
    list_status: ListStatus,
    status: UploadStatus,
    deleting: HashSet<DocId>,
    error: Option<String>,
    /// Refresh owed to the last successful upload. Survives later uploads
    /// until `settle` runs it.
    refresh_due: Option<Instant>,
    cache: DocumentCache,
    schedule: ProgressSchedule,
    refresh_delay: Duration,
}

impl UploadView {
    /// Create the view, showing the cached list until the first refresh.
    pub fn new(cache: DocumentCache, config: &AppConfig) -> Self {
        Self::with_timing(
            cache,
            ProgressSchedule::from_config(&config.progress),
            config.refresh_delay(),
        )
    }

    pub fn with_timing(
        cache: DocumentCache,
        schedule: ProgressSchedule,
        refresh_delay: Duration,
    ) -> Self {
        let files = cache.load();
        debug!("Upload view starting with {} cached records", files.len());

        Self {
            files,
            list_status: ListStatus::Cached,
            status: UploadStatus::Idle,
            deleting: HashSet::new(),
            error: None,
            refresh_due: None,
            cache,
            schedule,
            refresh_delay,
        }
    }

    pub fn files(&self) -> &[DocumentRecord] {
        &self.files
    }

    pub const fn list_status(&self) -> ListStatus {
        self.list_status
    }

    pub const fn status(&self) -> &UploadStatus {
        &self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn stage(&self) -> ProcessingStage {
        match &self.status {
            UploadStatus::Idle => ProcessingStage::NotStarted,
            UploadStatus::InFlight { progress, .. } => progress.stage(),
            UploadStatus::Complete { .. } => ProcessingStage::Complete,
        }
    }

    pub const fn can_upload(&self) -> bool {
        !matches!(self.status, UploadStatus::InFlight { .. })
    }

    /// When the refresh scheduled by a successful upload is due
    pub const fn refresh_due(&self) -> Option<Instant> {
        self.refresh_due
    }

    pub fn is_delete_enabled(&self, id: &DocId) -> bool {
        !self.deleting.contains(id)
    }

    // ------------------------------------------------------------------
    // File list
    // ------------------------------------------------------------------

    pub fn begin_refresh(&mut self) {
        self.list_status = ListStatus::Refreshing;
    }

    /// Apply the backend list. On failure the stale cache is dropped rather
    /// than shown.
    pub fn finish_refresh(&mut self, result: Result<Vec<DocumentRecord>>) {
        match result {
            Ok(files) => {
                debug!("Backend lists {} documents", files.len());
                self.files = files;
                self.list_status = ListStatus::Validated;
            }
            Err(e) => {
                warn!("Failed to load file list: {}", e);
                self.files.clear();
                self.list_status = ListStatus::Unavailable;
                self.error = Some(e.user_message(LIST_FAILED));
            }
        }
        self.persist();
    }

    pub async fn refresh(&mut self, api: &dyn BackendApi) {
        self.begin_refresh();
        let result = api.list_files().await;
        self.finish_refresh(result);
    }

    // ------------------------------------------------------------------
    // Upload
    // ------------------------------------------------------------------

    /// Start an upload. `None` while another upload is in flight or when no
    /// file name was given.
    pub fn begin_upload(&mut self, file: UploadFile) -> Option<UploadFile> {
        if !self.can_upload() || file.filename.trim().is_empty() {
            return None;
        }

        self.error = None;
        self.status = UploadStatus::InFlight {
            filename: file.filename.clone(),
            progress: SimulatedProgress::start(self.schedule.clone()),
        };
        Some(file)
    }

    /// Apply the upload result, returning the new record on success.
    pub fn finish_upload(&mut self, result: Result<DocId>) -> Option<DocumentRecord> {
        if self.can_upload() {
            return None;
        }
        let UploadStatus::InFlight { filename, .. } =
            std::mem::replace(&mut self.status, UploadStatus::Idle)
        else {
            return None;
        };

        match result {
            Ok(id) => {
                info!("Uploaded {} as {}", filename, id);
                let record = DocumentRecord {
                    id,
                    filename,
                    uploaded_at: Utc::now(),
                };

                match self.files.iter_mut().find(|r| r.id == record.id) {
                    Some(existing) => *existing = record.clone(),
                    None => self.files.push(record.clone()),
                }
                self.persist();

                self.refresh_due = Some(Instant::now() + self.refresh_delay);
                self.status = UploadStatus::Complete {
                    record: record.clone(),
                };
                Some(record)
            }
            Err(e) => {
                warn!("Upload of {} failed: {}", filename, e);
                self.error = Some(e.user_message(UPLOAD_FAILED));
                None
            }
        }
    }

    /// Upload one file, reporting simulated stages to `sink` while the
    /// request is in flight.
    pub async fn upload(
        &mut self,
        api: &dyn BackendApi,
        file: UploadFile,
        sink: &dyn ProgressSink,
    ) -> Option<DocumentRecord> {
        let file = self.begin_upload(file)?;

        let request = api.upload(file);
        tokio::pin!(request);

        let mut ticker = tokio::time::interval(self.schedule.tick());
        let mut shown = ProcessingStage::NotStarted;
        let result = loop {
            tokio::select! {
                result = &mut request => break result,
                _ = ticker.tick() => {
                    let stage = self.stage();
                    if stage != shown {
                        sink.stage_changed(stage);
                        shown = stage;
                    }
                }
            }
        };

        let record = self.finish_upload(result);
        let stage = if record.is_some() {
            ProcessingStage::Complete
        } else {
            ProcessingStage::NotStarted
        };
        sink.stage_changed(stage);
        record
    }

    /// Run the refresh scheduled by a successful upload, waiting until it
    /// is due. Does nothing if no refresh is owed.
    pub async fn settle(&mut self, api: &dyn BackendApi) {
        let Some(due) = self.refresh_due else {
            return;
        };

        tokio::time::sleep_until(due).await;
        self.refresh(api).await;
        self.refresh_due = None;
        if matches!(self.status, UploadStatus::Complete { .. }) {
            self.status = UploadStatus::Idle;
        }
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Start deleting `id`; the caller has already confirmed. `None` for an
    /// unknown id or while this row's delete is in flight.
    pub fn begin_delete(&mut self, id: &DocId) -> Option<DocId> {
        if !self.files.iter().any(|r| &r.id == id) || !self.deleting.insert(id.clone()) {
            return None;
        }

        self.error = None;
        Some(id.clone())
    }

    pub fn finish_delete(&mut self, id: &DocId, result: Result<()>) -> DeleteOutcome {
        self.deleting.remove(id);

        match result {
            Ok(()) => {
                info!("Deleted {}", id);
                self.files.retain(|r| &r.id != id);
                self.persist();
                DeleteOutcome::Deleted
            }
            Err(e) => {
                warn!("Delete of {} failed: {}", id, e);
                let message = e.user_message(DELETE_FAILED);
                self.error = Some(message.clone());
                DeleteOutcome::Failed(message)
            }
        }
    }

    /// Delete `id` after `confirm` approves the record.
    pub async fn delete<F>(&mut self, api: &dyn BackendApi, id: &DocId, confirm: F) -> DeleteOutcome
    where
        F: FnOnce(&DocumentRecord) -> bool,
    {
        let Some(record) = self.files.iter().find(|r| &r.id == id) else {
            return DeleteOutcome::Unavailable;
        };
        if !self.is_delete_enabled(id) {
            return DeleteOutcome::Unavailable;
        }
        if !confirm(record) {
            return DeleteOutcome::Cancelled;
        }

        let Some(id) = self.begin_delete(id) else {
            return DeleteOutcome::Unavailable;
        };
        let result = api.delete(&id).await;
        self.finish_delete(&id, result)
    }

    /// Overwrite the cache with the current list; an empty list clears it.
    fn persist(&self) {
        let written = if self.files.is_empty() {
            self.cache.clear()
        } else {
            self.cache.replace(&self.files)
        };

        if let Err(e) = written {
            warn!("Failed to update document cache: {}", e);
        }
    }
}
