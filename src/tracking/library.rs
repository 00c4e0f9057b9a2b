//! Local cache of the persisted document library

use parking_lot::RwLock;

use crate::types::LibraryDocument;

/// Holds the last wholesale fetch of the server-side document library.
///
/// Replaced in full on every refresh; never patched from ingestion state.
pub struct LibraryStore {
    documents: RwLock<Vec<LibraryDocument>>,
}

impl LibraryStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Replace the entire library with a fresh fetch
    pub fn replace_all(&self, documents: Vec<LibraryDocument>) {
        *self.documents.write() = documents;
    }

    /// Current library contents
    pub fn documents(&self) -> Vec<LibraryDocument> {
        self.documents.read().clone()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl Default for LibraryStore {
    fn default() -> Self {
        Self::new()
    }
}
