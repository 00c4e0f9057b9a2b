//! Lifecycle events emitted to the view layer

use tokio::sync::broadcast;

use crate::types::DocumentStage;

/// Events the surrounding view layer can subscribe to.
///
/// Banner-style outcomes (submission failures, partial failures, tracking
/// loss) travel on the same stream as lifecycle notifications.
#[derive(Debug, Clone)]
pub enum IngestEvent {
    /// A batch was accepted for background processing
    BatchStarted {
        batch_id: String,
        total_documents: usize,
    },
    /// A document reached a terminal stage
    DocumentTerminal {
        document_id: String,
        filename: String,
        stage: DocumentStage,
    },
    /// The batch reached its terminal condition
    BatchTerminal {
        batch_id: Option<String>,
        succeeded: usize,
        failed: usize,
    },
    /// Some documents failed while others succeeded; warning, not an error
    PartialFailure { succeeded: usize, failed: usize },
    /// The initial upload call failed outright; no batch was created
    SubmissionFailed { message: String },
    /// Polling gave up after bounded retries or the wall-clock ceiling
    TrackingLost { batch_id: String, message: String },
    /// One-shot newest-artifact hand-off: preview this document
    PreviewDocument { document_id: String },
    /// The pending file selection was cleared
    SelectionCleared,
    /// The persisted document library was re-fetched
    LibraryRefreshed { total: usize },
    /// Transient batch/progress state was cleared
    TransientStateCleared,
}

/// Broadcast fan-out for ingestion events
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<IngestEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<IngestEvent> {
        self.sender.subscribe()
    }

    /// Emit an event; dropped silently when no subscriber is listening
    pub fn emit(&self, event: IngestEvent) {
        tracing::debug!("ingest event: {:?}", event);
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
