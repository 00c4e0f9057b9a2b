//! Upload inputs and persisted library documents

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// File data submitted for upload
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}

/// Options carried with an upload submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadOptions {
    /// Target index for the processed documents
    #[serde(default)]
    pub index: Option<String>,
    /// Target category within the index
    #[serde(default)]
    pub category: Option<String>,
    /// Whether the documents belong to the domain-specific corpus
    #[serde(default)]
    pub domain: bool,
}

/// Filter for listing persisted documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A previously persisted document as known to the server.
///
/// Refreshed wholesale by the library refresh paths, never patched
/// field-by-field from ingestion state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryDocument {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub doc_type: String,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub chunk_count: u32,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}
