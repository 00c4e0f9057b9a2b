//! Merged ingestion state shared between the gateway, poller, and views
//!
//! All mutation goes through the merge operations; consumers only ever see
//! read-only snapshots. The monotonic-stage rule makes out-of-order snapshot
//! application harmless for document stage, and the aggregate guard extends
//! the same protection to batch progress.

use parking_lot::RwLock;

use crate::types::{BatchStatus, DocumentProgress, IngestionSnapshot, UploadBatch};

/// Store holding the current batch record and per-document progress
pub struct IngestionStateStore {
    inner: RwLock<IngestionSnapshot>,
}

impl IngestionStateStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(IngestionSnapshot::default()),
        }
    }

    /// Read-only clone of the current state
    pub fn snapshot(&self) -> IngestionSnapshot {
        self.inner.read().clone()
    }

    /// Seed locally-known documents at submission time, before the server
    /// reports anything. Seeded entries survive merges until they appear
    /// server-side under their real ids.
    pub fn seed_documents(&self, documents: Vec<DocumentProgress>) {
        let mut state = self.inner.write();
        for doc in documents {
            if state.document(&doc.document_id).is_none() {
                state.documents.push(doc);
            }
        }
    }

    /// Rebind a placeholder id to the server-assigned id once known
    pub fn rebind_identity(&self, placeholder_id: &str, server_id: &str) {
        let mut state = self.inner.write();
        if let Some(doc) = state
            .documents
            .iter_mut()
            .find(|d| d.document_id == placeholder_id)
        {
            doc.document_id = server_id.to_string();
        }
    }

    /// Merge a batch snapshot plus per-document entries.
    ///
    /// Returns the documents that newly reached a terminal stage in this
    /// merge, so the caller can emit terminal notifications exactly once.
    pub fn merge(
        &self,
        batch: UploadBatch,
        documents: Vec<DocumentProgress>,
    ) -> Vec<DocumentProgress> {
        let mut state = self.inner.write();
        Self::merge_batch_locked(&mut state, batch);
        Self::merge_documents_locked(&mut state, documents)
    }

    /// Merge only per-document entries (synchronous upload path)
    pub fn merge_documents(&self, documents: Vec<DocumentProgress>) -> Vec<DocumentProgress> {
        let mut state = self.inner.write();
        Self::merge_documents_locked(&mut state, documents)
    }

    /// Install or update the aggregate batch record
    pub fn merge_batch(&self, batch: UploadBatch) {
        let mut state = self.inner.write();
        Self::merge_batch_locked(&mut state, batch);
    }

    /// Drop all transient batch/progress state
    pub fn clear(&self) {
        let mut state = self.inner.write();
        state.documents.clear();
        state.batch = None;
    }

    fn merge_batch_locked(state: &mut IngestionSnapshot, mut incoming: UploadBatch) {
        if incoming.completed_documents + incoming.failed_documents > incoming.total_documents {
            tracing::warn!(
                "Batch {} reports {} completed + {} failed out of {} total; clamping",
                incoming.batch_id,
                incoming.completed_documents,
                incoming.failed_documents,
                incoming.total_documents
            );
            incoming.failed_documents = incoming.failed_documents.min(incoming.total_documents);
            incoming.completed_documents = incoming
                .completed_documents
                .min(incoming.total_documents - incoming.failed_documents);
        }

        match &mut state.batch {
            Some(current) if current.batch_id == incoming.batch_id => {
                // Overlapping fetches can deliver snapshots out of order;
                // never let a stale one walk progress backwards.
                if incoming.overall_progress_percent < current.overall_progress_percent
                    && incoming.status != BatchStatus::Completed
                {
                    tracing::debug!(
                        "Discarding stale batch snapshot for {} ({:.1}% < {:.1}%)",
                        incoming.batch_id,
                        incoming.overall_progress_percent,
                        current.overall_progress_percent
                    );
                    return;
                }

                let was_terminal = current.is_terminal();
                current.total_documents = incoming.total_documents;
                current.completed_documents =
                    current.completed_documents.max(incoming.completed_documents);
                current.failed_documents = current.failed_documents.max(incoming.failed_documents);
                current.overall_progress_percent = current
                    .overall_progress_percent
                    .max(incoming.overall_progress_percent);
                if incoming.status == BatchStatus::Completed {
                    current.status = BatchStatus::Completed;
                }
                // finished_at is set exactly once, on the terminal transition
                if !was_terminal && current.is_terminal() && current.finished_at.is_none() {
                    current.finished_at = incoming.finished_at.or_else(|| Some(chrono::Utc::now()));
                }
            }
            _ => {
                if incoming.is_terminal() && incoming.finished_at.is_none() {
                    incoming.finished_at = Some(chrono::Utc::now());
                }
                state.batch = Some(incoming);
            }
        }
    }

    fn merge_documents_locked(
        state: &mut IngestionSnapshot,
        documents: Vec<DocumentProgress>,
    ) -> Vec<DocumentProgress> {
        let mut newly_terminal = Vec::new();

        for incoming in documents {
            // Server entries supersede a seeded placeholder for the same file
            let existing = state
                .documents
                .iter_mut()
                .find(|d| {
                    d.document_id == incoming.document_id
                        || (d.has_placeholder_id() && d.filename == incoming.filename)
                });

            match existing {
                Some(current) => {
                    if current.stage.is_terminal() {
                        // Terminal stages never revert, even under stale snapshots
                        continue;
                    }
                    if incoming.stage.rank() < current.stage.rank() {
                        tracing::debug!(
                            "Discarding stale stage {:?} for '{}' (already {:?})",
                            incoming.stage,
                            current.filename,
                            current.stage
                        );
                        continue;
                    }

                    let progress = current.progress_percent.max(incoming.progress_percent);
                    let became_terminal = incoming.stage.is_terminal();
                    *current = incoming;
                    current.progress_percent = progress;
                    if became_terminal {
                        newly_terminal.push(current.clone());
                    }
                }
                None => {
                    if incoming.stage.is_terminal() {
                        newly_terminal.push(incoming.clone());
                    }
                    state.documents.push(incoming);
                }
            }
        }

        newly_terminal
    }
}

impl Default for IngestionStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentStage;

    fn doc(id: &str, filename: &str, stage: DocumentStage, progress: f32) -> DocumentProgress {
        DocumentProgress {
            document_id: id.to_string(),
            filename: filename.to_string(),
            stage,
            progress_percent: progress,
            message: String::new(),
            chunks_created: 0,
            tokens_used: 0,
        }
    }

    fn batch(id: &str, completed: usize, failed: usize, total: usize, progress: f32) -> UploadBatch {
        UploadBatch {
            batch_id: id.to_string(),
            total_documents: total,
            completed_documents: completed,
            failed_documents: failed,
            overall_progress_percent: progress,
            status: BatchStatus::InProgress,
            started_at: chrono::Utc::now(),
            finished_at: None,
        }
    }

    #[test]
    fn test_terminal_stage_never_downgraded() {
        let store = IngestionStateStore::new();
        store.merge_documents(vec![doc("d1", "a.pdf", DocumentStage::Completed, 100.0)]);

        // A stale snapshot arrives claiming the document is still processing
        store.merge_documents(vec![doc("d1", "a.pdf", DocumentStage::Processing, 40.0)]);

        let snap = store.snapshot();
        assert_eq!(snap.document("d1").unwrap().stage, DocumentStage::Completed);
        assert_eq!(snap.document("d1").unwrap().progress_percent, 100.0);
    }

    #[test]
    fn test_failed_never_becomes_completed() {
        let store = IngestionStateStore::new();
        store.merge_documents(vec![doc("d1", "a.pdf", DocumentStage::Failed, 100.0)]);
        store.merge_documents(vec![doc("d1", "a.pdf", DocumentStage::Completed, 100.0)]);

        let snap = store.snapshot();
        assert_eq!(snap.document("d1").unwrap().stage, DocumentStage::Failed);
    }

    #[test]
    fn test_seeded_documents_survive_merges() {
        let store = IngestionStateStore::new();
        let seeded = DocumentProgress::pending("b.pdf");
        let seeded_id = seeded.document_id.clone();
        store.seed_documents(vec![seeded, DocumentProgress::pending("c.pdf")]);

        // Server only reports one of the two files so far
        store.merge(
            batch("kb_batch_1", 0, 0, 2, 10.0),
            vec![doc("srv-1", "b.pdf", DocumentStage::Processing, 20.0)],
        );

        let snap = store.snapshot();
        assert_eq!(snap.documents.len(), 2);
        // Placeholder for b.pdf was superseded by the server entry
        assert!(snap.document(&seeded_id).is_none());
        assert_eq!(snap.document("srv-1").unwrap().stage, DocumentStage::Processing);
        assert!(snap.documents.iter().any(|d| d.filename == "c.pdf"));
    }

    #[test]
    fn test_rebind_identity() {
        let store = IngestionStateStore::new();
        let seeded = DocumentProgress::pending("a.pdf");
        let placeholder = seeded.document_id.clone();
        store.seed_documents(vec![seeded]);

        store.rebind_identity(&placeholder, "srv-9");

        let snap = store.snapshot();
        assert!(snap.document(&placeholder).is_none());
        assert_eq!(snap.document("srv-9").unwrap().filename, "a.pdf");
    }

    #[test]
    fn test_aggregate_progress_never_regresses() {
        let store = IngestionStateStore::new();
        store.merge_batch(batch("kb_batch_1", 1, 0, 2, 60.0));
        // Late-arriving older snapshot
        store.merge_batch(batch("kb_batch_1", 0, 0, 2, 30.0));

        let snap = store.snapshot();
        let current = snap.batch.unwrap();
        assert_eq!(current.overall_progress_percent, 60.0);
        assert_eq!(current.completed_documents, 1);
    }

    #[test]
    fn test_count_invariant_clamped() {
        let store = IngestionStateStore::new();
        store.merge_batch(batch("kb_batch_1", 3, 1, 3, 50.0));

        let snap = store.snapshot();
        let current = snap.batch.unwrap();
        assert!(current.completed_documents + current.failed_documents <= current.total_documents);
    }

    #[test]
    fn test_count_invariant_clamped_when_failed_exceeds_total() {
        let store = IngestionStateStore::new();
        store.merge_batch(batch("kb_batch_1", 1, 5, 3, 50.0));

        let snap = store.snapshot();
        let current = snap.batch.unwrap();
        assert!(
            current.completed_documents + current.failed_documents <= current.total_documents,
            "invariant violated: {} + {} > {}",
            current.completed_documents,
            current.failed_documents,
            current.total_documents
        );
        assert_eq!(current.failed_documents, 3);
        assert_eq!(current.completed_documents, 0);
    }

    #[test]
    fn test_finished_at_set_once() {
        let store = IngestionStateStore::new();
        store.merge_batch(batch("kb_batch_1", 0, 0, 2, 50.0));
        store.merge_batch(batch("kb_batch_1", 2, 0, 2, 100.0));

        let first_finish = store.snapshot().batch.unwrap().finished_at;
        assert!(first_finish.is_some());

        // A duplicate terminal snapshot must not move the timestamp
        store.merge_batch(batch("kb_batch_1", 2, 0, 2, 100.0));
        assert_eq!(store.snapshot().batch.unwrap().finished_at, first_finish);
    }

    #[test]
    fn test_newly_terminal_reported_once() {
        let store = IngestionStateStore::new();
        let first = store.merge_documents(vec![doc("d1", "a.pdf", DocumentStage::Completed, 100.0)]);
        assert_eq!(first.len(), 1);

        let second =
            store.merge_documents(vec![doc("d1", "a.pdf", DocumentStage::Completed, 100.0)]);
        assert!(second.is_empty());
    }
}
