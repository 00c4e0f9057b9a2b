//! Ingestion tracker facade
//!
//! The surface the view layer talks to: start an upload, observe the
//! snapshot and event stream, cancel tracking, clear transient state.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backend::DocumentBackend;
use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::types::{
    DocumentFilter, DocumentProgress, FileUpload, IngestionSnapshot, LibraryDocument,
    UploadOptions,
};

use super::events::{EventBus, IngestEvent};
use super::gateway::{self, UploadDisposition};
use super::library::LibraryStore;
use super::poller::{BatchHandle, BatchStatusPoller};
use super::reconciler::CompletionReconciler;
use super::refresher::{RefresherHandle, VisibilityRefresher};
use super::store::IngestionStateStore;

/// Outcome of a submission
pub enum UploadOutcome {
    /// Every document resolved in the upload response; no batch was started
    Immediate { succeeded: usize, failed: usize },
    /// A batch was accepted for background processing and is being polled.
    /// The caller owns the handle and its cancellation.
    Tracking(BatchHandle),
}

/// Batch currently being tracked
struct ActiveBatch {
    batch_id: String,
    cancel: CancellationToken,
}

/// The ingestion tracking core
pub struct IngestTracker {
    backend: Arc<dyn DocumentBackend>,
    store: Arc<IngestionStateStore>,
    library: Arc<LibraryStore>,
    reconciler: Arc<CompletionReconciler>,
    refresher: Arc<VisibilityRefresher>,
    events: EventBus,
    config: IngestConfig,
    active: Mutex<Option<ActiveBatch>>,
}

impl IngestTracker {
    /// Create a tracker over the given backend
    pub fn new(backend: Arc<dyn DocumentBackend>, config: IngestConfig) -> Self {
        let store = Arc::new(IngestionStateStore::new());
        let library = Arc::new(LibraryStore::new());
        let events = EventBus::default();

        let reconciler = Arc::new(CompletionReconciler::new(
            Arc::clone(&backend),
            Arc::clone(&store),
            Arc::clone(&library),
            events.clone(),
            config.reconcile.clear_delay(),
        ));

        let refresher = Arc::new(VisibilityRefresher::new(
            Arc::clone(&backend),
            Arc::clone(&library),
            events.clone(),
            DocumentFilter::default(),
        ));

        Self {
            backend,
            store,
            library,
            reconciler,
            refresher,
            events,
            config,
            active: Mutex::new(None),
        }
    }

    /// Read-only view of the current ingestion state
    pub fn snapshot(&self) -> IngestionSnapshot {
        self.store.snapshot()
    }

    /// Current contents of the document library
    pub fn library_documents(&self) -> Vec<LibraryDocument> {
        self.library.documents()
    }

    /// Subscribe to lifecycle and banner events
    pub fn subscribe(&self) -> broadcast::Receiver<IngestEvent> {
        self.events.subscribe()
    }

    /// The visibility-driven library refresher
    pub fn refresher(&self) -> Arc<VisibilityRefresher> {
        Arc::clone(&self.refresher)
    }

    /// Start the periodic silent library refresh loop
    pub fn spawn_refresher(&self) -> RefresherHandle {
        self.refresher.spawn_periodic(self.config.refresh.interval())
    }

    /// Submit files for ingestion.
    ///
    /// Rejects an empty file set without contacting the network. A request
    /// level failure is fatal for the submission: local upload state is
    /// cleared and a single error surfaced, with no retry.
    pub async fn start_upload(
        &self,
        files: Vec<FileUpload>,
        options: UploadOptions,
    ) -> Result<UploadOutcome> {
        if files.is_empty() {
            return Err(Error::EmptyUpload);
        }

        // A new submission supersedes whatever the previous batch left behind.
        self.cancel_active_batch();
        self.reconciler.cancel_pending_clear();
        self.store.clear();

        let placeholders: Vec<DocumentProgress> = files
            .iter()
            .map(|f| DocumentProgress::pending(&f.filename))
            .collect();
        let placeholder_ids: Vec<String> = placeholders
            .iter()
            .map(|d| d.document_id.clone())
            .collect();
        self.store.seed_documents(placeholders);

        let acks = match self.backend.upload_documents(&files, &options).await {
            Ok(acks) => acks,
            Err(e) => {
                self.store.clear();
                let err = match e {
                    Error::Submission(message) => Error::Submission(message),
                    other => Error::Submission(other.to_string()),
                };
                self.events.emit(IngestEvent::SubmissionFailed {
                    message: err.to_string(),
                });
                return Err(err);
            }
        };

        if acks.len() != files.len() {
            tracing::warn!(
                "Upload response has {} entries for {} files",
                acks.len(),
                files.len()
            );
        }

        // Acks are positional, one per submitted file: bridge the placeholder
        // identities to the server-assigned ids.
        for (placeholder, ack) in placeholder_ids.iter().zip(&acks) {
            self.store.rebind_identity(placeholder, &ack.document_id);
        }

        match gateway::classify(acks) {
            UploadDisposition::Synchronous { acks } => {
                let progress: Vec<DocumentProgress> = files
                    .iter()
                    .zip(&acks)
                    .map(|(f, a)| gateway::ack_progress(&f.filename, a))
                    .collect();
                let newly_terminal = self.store.merge_documents(progress);
                self.emit_terminal(newly_terminal);

                let snapshot = self.store.snapshot();
                let key = format!("immediate-{}", Uuid::new_v4());
                self.reconciler.on_batch_terminal(&key, None, &snapshot).await;

                let (succeeded, failed) = snapshot.partition_terminal();
                Ok(UploadOutcome::Immediate {
                    succeeded: succeeded.len(),
                    failed: failed.len(),
                })
            }
            UploadDisposition::Asynchronous { batch_id, acks } => {
                let progress: Vec<DocumentProgress> = files
                    .iter()
                    .zip(&acks)
                    .map(|(f, a)| gateway::ack_progress(&f.filename, a))
                    .collect();
                let batch = gateway::initial_batch(batch_id.clone(), &acks);
                let newly_terminal = self.store.merge(batch, progress);
                self.emit_terminal(newly_terminal);

                self.events.emit(IngestEvent::BatchStarted {
                    batch_id: batch_id.clone(),
                    total_documents: files.len(),
                });

                let poller = BatchStatusPoller::new(
                    Arc::clone(&self.backend),
                    Arc::clone(&self.store),
                    Arc::clone(&self.reconciler),
                    self.events.clone(),
                    self.config.polling.clone(),
                );
                let handle = poller.spawn(batch_id.clone());

                *self.active.lock() = Some(ActiveBatch {
                    batch_id,
                    cancel: handle.cancellation_token(),
                });

                Ok(UploadOutcome::Tracking(handle))
            }
        }
    }

    /// Stop tracking the active batch, if any. An in-flight status fetch is
    /// not interrupted; its late response is discarded.
    pub fn cancel_active_batch(&self) {
        if let Some(active) = self.active.lock().take() {
            tracing::info!("Cancelling tracking for batch {}", active.batch_id);
            active.cancel.cancel();
        }
    }

    /// Clear transient batch/progress state immediately
    pub fn clear_transient_state(&self) {
        self.reconciler.cancel_pending_clear();
        self.store.clear();
        self.events.emit(IngestEvent::TransientStateCleared);
    }

    fn emit_terminal(&self, documents: Vec<DocumentProgress>) {
        for doc in documents {
            self.events.emit(IngestEvent::DocumentTerminal {
                document_id: doc.document_id,
                filename: doc.filename,
                stage: doc.stage,
            });
        }
    }
}
