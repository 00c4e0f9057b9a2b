//! docbatch: batch ingestion tracking for document workflows
//!
//! This crate tracks asynchronous document ingestion against a remote
//! processing backend: it submits uploads, classifies the response as
//! synchronous or asynchronous, polls batch status on a fixed period,
//! merges per-document and aggregate progress into a monotonic snapshot,
//! and reconciles completion (library refresh, newest-artifact preview)
//! exactly once per batch.

pub mod backend;
pub mod config;
pub mod error;
pub mod tracking;
pub mod types;

pub use backend::{DocumentBackend, HttpBackend};
pub use config::IngestConfig;
pub use error::{Error, Result};
pub use tracking::{BatchHandle, IngestEvent, IngestTracker, UploadOutcome};
pub use types::{
    DocumentProgress, DocumentStage, FileUpload, IngestionSnapshot, LibraryDocument,
    UploadBatch, UploadOptions,
};
