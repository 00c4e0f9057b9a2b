//! Asynchronous batch-ingestion tracking
//!
//! Uploads one or more documents, decides whether processing resolved
//! synchronously or runs in the background, polls batch status, merges
//! progress into a shared snapshot, and reconciles completion exactly once.

pub mod batch_id;
pub mod events;
mod gateway;
pub mod library;
pub mod poller;
pub mod reconciler;
pub mod refresher;
pub mod store;
pub mod tracker;

pub use events::{EventBus, IngestEvent};
pub use library::LibraryStore;
pub use poller::{BatchHandle, BatchStatusPoller};
pub use reconciler::CompletionReconciler;
pub use refresher::{RefresherHandle, VisibilityRefresher};
pub use store::IngestionStateStore;
pub use tracker::{IngestTracker, UploadOutcome};
