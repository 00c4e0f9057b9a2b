//! Batch and per-document progress types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Aggregate batch status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    InProgress,
    Completed,
}

/// Per-document processing stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStage {
    Uploading,
    Processing,
    Completed,
    Failed,
}

impl DocumentStage {
    /// Terminal stages never transition further
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentStage::Completed | DocumentStage::Failed)
    }

    /// Monotonic ordering: uploading < processing < {completed, failed}.
    /// Both terminal stages share the top rank and are mutually exclusive.
    pub(crate) fn rank(self) -> u8 {
        match self {
            DocumentStage::Uploading => 0,
            DocumentStage::Processing => 1,
            DocumentStage::Completed | DocumentStage::Failed => 2,
        }
    }
}

/// Status of one entry in an upload acknowledgement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    Processing,
    Completed,
    Failed,
}

/// One entry of the upload response, per submitted file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadAck {
    pub document_id: String,
    pub status: AckStatus,
    #[serde(default)]
    pub message: String,
}

/// Aggregate record for one server-tracked batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadBatch {
    /// Opaque handle, server-assigned or synthesized
    pub batch_id: String,
    pub total_documents: usize,
    pub completed_documents: usize,
    pub failed_documents: usize,
    /// Aggregate progress in [0, 100]
    pub overall_progress_percent: f32,
    pub status: BatchStatus,
    pub started_at: DateTime<Utc>,
    /// Set exactly once, on the transition to terminal
    pub finished_at: Option<DateTime<Utc>>,
}

impl UploadBatch {
    /// Create a fresh in-progress batch record
    pub fn started(batch_id: String, total_documents: usize) -> Self {
        Self {
            batch_id,
            total_documents,
            completed_documents: 0,
            failed_documents: 0,
            overall_progress_percent: 0.0,
            status: BatchStatus::InProgress,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Termination condition: 100% progress or an explicit completed status
    pub fn is_terminal(&self) -> bool {
        self.status == BatchStatus::Completed || self.overall_progress_percent >= 100.0
    }
}

/// Progress for one document within a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentProgress {
    /// Server-assigned once known; a locally generated placeholder before that
    pub document_id: String,
    pub filename: String,
    pub stage: DocumentStage,
    /// Progress in [0, 100]
    pub progress_percent: f32,
    /// Human-readable; not parsed for control flow except batch-id extraction
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub chunks_created: usize,
    #[serde(default)]
    pub tokens_used: usize,
}

impl DocumentProgress {
    /// Create the local placeholder entry used before the server acknowledges
    pub fn pending(filename: impl Into<String>) -> Self {
        Self {
            document_id: format!("pending-{}", Uuid::new_v4()),
            filename: filename.into(),
            stage: DocumentStage::Uploading,
            progress_percent: 0.0,
            message: String::new(),
            chunks_created: 0,
            tokens_used: 0,
        }
    }

    /// Whether the id is still a local placeholder
    pub fn has_placeholder_id(&self) -> bool {
        self.document_id.starts_with("pending-")
    }
}

/// Merged, view-facing snapshot of the ingestion state.
///
/// Documents keep submission order, so "first succeeded" is well defined
/// for the newest-artifact hand-off. Ids are unique within a snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionSnapshot {
    pub documents: Vec<DocumentProgress>,
    pub batch: Option<UploadBatch>,
}

impl IngestionSnapshot {
    /// Look up a document by id
    pub fn document(&self, document_id: &str) -> Option<&DocumentProgress> {
        self.documents.iter().find(|d| d.document_id == document_id)
    }

    /// Split terminal documents into (succeeded, failed), in submission order
    pub fn partition_terminal(&self) -> (Vec<&DocumentProgress>, Vec<&DocumentProgress>) {
        let succeeded = self
            .documents
            .iter()
            .filter(|d| d.stage == DocumentStage::Completed)
            .collect();
        let failed = self
            .documents
            .iter()
            .filter(|d| d.stage == DocumentStage::Failed)
            .collect();
        (succeeded, failed)
    }
}

/// Wire shape of a batch status fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatusReport {
    pub total_documents: usize,
    pub completed_documents: usize,
    pub failed_documents: usize,
    pub overall_progress_percent: f32,
    pub status: BatchStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_processing: Vec<DocumentProgress>,
}

impl BatchStatusReport {
    /// Split into the aggregate record and the per-document list for merging
    pub fn into_parts(self, batch_id: String) -> (UploadBatch, Vec<DocumentProgress>) {
        let batch = UploadBatch {
            batch_id,
            total_documents: self.total_documents,
            completed_documents: self.completed_documents,
            failed_documents: self.failed_documents,
            overall_progress_percent: self.overall_progress_percent.clamp(0.0, 100.0),
            status: self.status,
            started_at: self.started_at,
            finished_at: self.finished_at,
        };
        (batch, self.current_processing)
    }
}
