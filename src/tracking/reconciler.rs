//! Completion reconciliation
//!
//! Both the synchronous "all resolved immediately" upload path and the
//! asynchronous polling path funnel into this one component, so the
//! completion actions live in a single place and fire once per batch.

use dashmap::DashSet;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::backend::DocumentBackend;
use crate::types::{DocumentFilter, IngestionSnapshot};

use super::events::{EventBus, IngestEvent};
use super::library::LibraryStore;
use super::store::IngestionStateStore;

/// Runs the terminal-transition steps for a batch exactly once
pub struct CompletionReconciler {
    backend: Arc<dyn DocumentBackend>,
    store: Arc<IngestionStateStore>,
    library: Arc<LibraryStore>,
    events: EventBus,
    clear_delay: Duration,
    /// Key of the batch already reconciled; guards against duplicate terminal
    /// signals. Only the most recent key is retained, so the set stays
    /// bounded over the tracker's lifetime.
    reconciled: DashSet<String>,
    /// Pending deferred-clear task, replaced or aborted when a new batch starts
    clear_task: Mutex<Option<JoinHandle<()>>>,
}

impl CompletionReconciler {
    pub fn new(
        backend: Arc<dyn DocumentBackend>,
        store: Arc<IngestionStateStore>,
        library: Arc<LibraryStore>,
        events: EventBus,
        clear_delay: Duration,
    ) -> Self {
        Self {
            backend,
            store,
            library,
            events,
            clear_delay,
            reconciled: DashSet::new(),
            clear_task: Mutex::new(None),
        }
    }

    /// Reconcile a batch that reached its terminal condition.
    ///
    /// `batch_key` identifies the submission (the batch id for tracked
    /// batches, a synthetic key for the synchronous path); duplicate
    /// invocations for the same key are ignored.
    pub async fn on_batch_terminal(
        &self,
        batch_key: &str,
        batch_id: Option<&str>,
        snapshot: &IngestionSnapshot,
    ) {
        if self.reconciled.contains(batch_key) {
            tracing::debug!("Duplicate terminal signal for {}, ignoring", batch_key);
            return;
        }
        // A terminal signal for a new batch supersedes the previous key;
        // duplicates only ever arrive while that batch's poller is alive.
        self.reconciled.clear();
        self.reconciled.insert(batch_key.to_string());

        let (succeeded, failed) = snapshot.partition_terminal();
        tracing::info!(
            "Batch {} finished: {} succeeded, {} failed",
            batch_key,
            succeeded.len(),
            failed.len()
        );

        self.events.emit(IngestEvent::BatchTerminal {
            batch_id: batch_id.map(String::from),
            succeeded: succeeded.len(),
            failed: failed.len(),
        });

        if !failed.is_empty() {
            tracing::warn!(
                "{} of {} documents failed processing",
                failed.len(),
                succeeded.len() + failed.len()
            );
            self.events.emit(IngestEvent::PartialFailure {
                succeeded: succeeded.len(),
                failed: failed.len(),
            });
        }

        if let Some(first) = succeeded.first() {
            self.events.emit(IngestEvent::SelectionCleared);
            self.refresh_library().await;
            // Newest-artifact hand-off: at most once per batch
            self.events.emit(IngestEvent::PreviewDocument {
                document_id: first.document_id.clone(),
            });
        }

        self.schedule_clear();
    }

    /// Full library re-fetch; failure is logged, the completion flow continues
    async fn refresh_library(&self) {
        match self.backend.list_documents(&DocumentFilter::default()).await {
            Ok(documents) => {
                let total = documents.len();
                self.library.replace_all(documents);
                self.events.emit(IngestEvent::LibraryRefreshed { total });
            }
            Err(e) => {
                tracing::warn!("Library refresh after batch completion failed: {}", e);
            }
        }
    }

    /// Schedule clearing of transient batch/progress state so the user has
    /// time to read the outcome before it disappears
    fn schedule_clear(&self) {
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let delay = self.clear_delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            store.clear();
            events.emit(IngestEvent::TransientStateCleared);
        });

        if let Some(previous) = self.clear_task.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Abort a pending deferred clear (the user started a new batch)
    pub fn cancel_pending_clear(&self) {
        if let Some(task) = self.clear_task.lock().take() {
            task.abort();
        }
    }
}
