//! Silent library re-synchronization
//!
//! Refreshes the persisted document library when the host view regains
//! visibility or on a fixed period. This data path is independent of the
//! batch poller: both read from the backend, neither overwrites the
//! other's fields.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::backend::DocumentBackend;
use crate::types::DocumentFilter;

use super::events::{EventBus, IngestEvent};
use super::library::LibraryStore;

/// Re-fetches the document library without surfacing errors
pub struct VisibilityRefresher {
    backend: Arc<dyn DocumentBackend>,
    library: Arc<LibraryStore>,
    events: EventBus,
    filter: DocumentFilter,
}

impl VisibilityRefresher {
    pub fn new(
        backend: Arc<dyn DocumentBackend>,
        library: Arc<LibraryStore>,
        events: EventBus,
        filter: DocumentFilter,
    ) -> Self {
        Self {
            backend,
            library,
            events,
            filter,
        }
    }

    /// The hosting view regained visibility or focus
    pub async fn on_visibility_regained(&self) {
        self.silent_refresh().await;
    }

    /// Wholesale library re-fetch; failures are logged, never surfaced
    pub async fn silent_refresh(&self) {
        match self.backend.list_documents(&self.filter).await {
            Ok(documents) => {
                let total = documents.len();
                self.library.replace_all(documents);
                self.events.emit(IngestEvent::LibraryRefreshed { total });
            }
            Err(e) => {
                tracing::debug!("Silent library refresh failed: {}", e);
            }
        }
    }

    /// Start the periodic refresh loop. The first refresh fires immediately,
    /// which doubles as the initial library load.
    pub fn spawn_periodic(self: &Arc<Self>, every: Duration) -> RefresherHandle {
        let refresher = Arc::clone(self);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = ticker.tick() => {}
                }
                refresher.silent_refresh().await;
            }
        });

        RefresherHandle { cancel, join }
    }
}

/// Owned handle to the periodic refresh loop
pub struct RefresherHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl RefresherHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn wait(self) {
        let _ = self.join.await;
    }
}
