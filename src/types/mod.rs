//! Domain types for batch ingestion tracking

pub mod batch;
pub mod document;

pub use batch::{
    AckStatus, BatchStatus, BatchStatusReport, DocumentProgress, DocumentStage,
    IngestionSnapshot, UploadAck, UploadBatch,
};
pub use document::{DocumentFilter, FileUpload, LibraryDocument, UploadOptions};
