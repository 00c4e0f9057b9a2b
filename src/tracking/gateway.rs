//! Upload response interpretation
//!
//! Classifies the immediate upload acknowledgement as fully synchronous
//! (every entry already terminal) or asynchronous (a batch was accepted for
//! background processing). Already-terminal entries in an asynchronous
//! response are folded into the tracked batch, not reported separately.

use crate::types::{AckStatus, DocumentProgress, DocumentStage, UploadAck, UploadBatch};

use super::batch_id;

/// How a submission's acknowledgement should be handled
pub(crate) enum UploadDisposition {
    /// Every entry resolved immediately; no poller is started
    Synchronous { acks: Vec<UploadAck> },
    /// At least one entry is still processing; the whole submission is
    /// tracked as one batch
    Asynchronous { batch_id: String, acks: Vec<UploadAck> },
}

/// Classify the acknowledgement list for a submission
pub(crate) fn classify(acks: Vec<UploadAck>) -> UploadDisposition {
    let any_processing = acks.iter().any(|a| a.status == AckStatus::Processing);
    if any_processing {
        let message = acks.first().map(|a| a.message.as_str()).unwrap_or("");
        let batch_id = batch_id::resolve(message);
        UploadDisposition::Asynchronous { batch_id, acks }
    } else {
        UploadDisposition::Synchronous { acks }
    }
}

/// Translate one acknowledgement entry into document progress
pub(crate) fn ack_progress(filename: &str, ack: &UploadAck) -> DocumentProgress {
    let (stage, progress) = match ack.status {
        AckStatus::Processing => (DocumentStage::Processing, 0.0),
        AckStatus::Completed => (DocumentStage::Completed, 100.0),
        AckStatus::Failed => (DocumentStage::Failed, 100.0),
    };

    DocumentProgress {
        document_id: ack.document_id.clone(),
        filename: filename.to_string(),
        stage,
        progress_percent: progress,
        message: ack.message.clone(),
        chunks_created: 0,
        tokens_used: 0,
    }
}

/// Synthesize the initial batch record for an asynchronous submission,
/// folding in entries the server already resolved
pub(crate) fn initial_batch(batch_id: String, acks: &[UploadAck]) -> UploadBatch {
    let total = acks.len();
    let completed = acks.iter().filter(|a| a.status == AckStatus::Completed).count();
    let failed = acks.iter().filter(|a| a.status == AckStatus::Failed).count();

    let mut batch = UploadBatch::started(batch_id, total);
    batch.completed_documents = completed;
    batch.failed_documents = failed;
    if total > 0 {
        batch.overall_progress_percent = ((completed + failed) as f32 / total as f32) * 100.0;
    }
    batch
}
