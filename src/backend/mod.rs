//! Document processing backend abstraction
//!
//! The actual pipeline (OCR/extraction/chunking/indexing) is external; the
//! core only consumes its status contract through this trait.

pub mod http;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    BatchStatusReport, DocumentFilter, FileUpload, LibraryDocument, UploadAck, UploadOptions,
};

pub use http::HttpBackend;

/// Logical operations the ingestion core needs from the backend
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Submit one or more files in a single call; one ack per file
    async fn upload_documents(
        &self,
        files: &[FileUpload],
        options: &UploadOptions,
    ) -> Result<Vec<UploadAck>>;

    /// Fetch aggregate and per-document status for a batch.
    /// Returns [`crate::Error::BatchNotFound`] for an unknown batch id.
    async fn batch_status(&self, batch_id: &str) -> Result<BatchStatusReport>;

    /// List persisted documents
    async fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<LibraryDocument>>;

    /// Fetch the extracted content of a persisted document
    async fn document_content(&self, document_id: &str) -> Result<String>;
}
