//! Batch status polling
//!
//! The poller owns the only timer in the subsystem. Fetches are serialized
//! per batch: the loop awaits the in-flight fetch before the interval can
//! deliver another tick, so out-of-order snapshot application cannot
//! originate here.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::backend::DocumentBackend;
use crate::config::PollingConfig;
use crate::error::Error;

use super::events::{EventBus, IngestEvent};
use super::reconciler::CompletionReconciler;
use super::store::IngestionStateStore;

/// Owned handle to an active batch tracker.
///
/// Dropping the handle does not stop polling; cancellation is explicit so
/// the owning view controls the poller's lifetime.
pub struct BatchHandle {
    batch_id: String,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl BatchHandle {
    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    /// Stop polling. An in-flight fetch is not interrupted, but its late
    /// response is discarded rather than merged.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token shared with the tracker so `cancel_active_batch` works even
    /// while the caller holds the handle
    pub(crate) fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the polling task to finish
    pub async fn wait(self) {
        let _ = self.join.await;
    }
}

/// Drives status fetches for one batch on a fixed period
pub struct BatchStatusPoller {
    backend: Arc<dyn DocumentBackend>,
    store: Arc<IngestionStateStore>,
    reconciler: Arc<CompletionReconciler>,
    events: EventBus,
    config: PollingConfig,
}

impl BatchStatusPoller {
    pub fn new(
        backend: Arc<dyn DocumentBackend>,
        store: Arc<IngestionStateStore>,
        reconciler: Arc<CompletionReconciler>,
        events: EventBus,
        config: PollingConfig,
    ) -> Self {
        Self {
            backend,
            store,
            reconciler,
            events,
            config,
        }
    }

    /// Start polling for `batch_id`, returning the owned handle
    pub fn spawn(self, batch_id: String) -> BatchHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let id = batch_id.clone();

        let join = tokio::spawn(async move {
            self.run(id, token).await;
        });

        BatchHandle {
            batch_id,
            cancel,
            join,
        }
    }

    async fn run(self, batch_id: String, cancel: CancellationToken) {
        // The first tick fires immediately so the UI reflects progress
        // without waiting a full period.
        let mut ticker = interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let deadline = Instant::now() + self.config.wall_clock_timeout();
        let mut consecutive_failures: u32 = 0;

        tracing::info!(
            "Polling batch {} every {}ms",
            batch_id,
            self.config.interval_ms
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Polling cancelled for batch {}", batch_id);
                    return;
                }
                _ = ticker.tick() => {}
            }

            let fetched = tokio::select! {
                _ = cancel.cancelled() => {
                    // The in-flight fetch is dropped; nothing is merged.
                    tracing::debug!("Polling cancelled mid-fetch for batch {}", batch_id);
                    return;
                }
                result = self.backend.batch_status(&batch_id) => result,
            };

            match fetched {
                Ok(report) => {
                    consecutive_failures = 0;
                    let (batch, documents) = report.into_parts(batch_id.clone());
                    let terminal = batch.is_terminal();

                    let newly_terminal = self.store.merge(batch, documents);
                    for doc in newly_terminal {
                        self.events.emit(IngestEvent::DocumentTerminal {
                            document_id: doc.document_id,
                            filename: doc.filename,
                            stage: doc.stage,
                        });
                    }

                    if terminal {
                        let snapshot = self.store.snapshot();
                        self.reconciler
                            .on_batch_terminal(&batch_id, Some(&batch_id), &snapshot)
                            .await;
                        return;
                    }
                }
                Err(Error::BatchNotFound(_)) => {
                    // The batch may not be durably recorded yet; keep polling.
                    consecutive_failures += 1;
                    tracing::debug!(
                        "Batch {} not found yet (attempt {})",
                        batch_id,
                        consecutive_failures
                    );
                }
                Err(e) => {
                    consecutive_failures += 1;
                    tracing::warn!(
                        "Status fetch for batch {} failed ({} consecutive): {}",
                        batch_id,
                        consecutive_failures,
                        e
                    );
                }
            }

            if consecutive_failures >= self.config.max_consecutive_failures {
                self.tracking_lost(
                    &batch_id,
                    format!("{} consecutive fetch failures", consecutive_failures),
                );
                return;
            }
            if Instant::now() >= deadline {
                self.tracking_lost(
                    &batch_id,
                    format!(
                        "no terminal state within {}s",
                        self.config.wall_clock_timeout_secs
                    ),
                );
                return;
            }
        }
    }

    /// Escalate to polling-fatal. Already-known terminal documents stay as-is.
    fn tracking_lost(&self, batch_id: &str, reason: String) {
        tracing::error!("Tracking lost for batch {}: {}", batch_id, reason);
        self.events.emit(IngestEvent::TrackingLost {
            batch_id: batch_id.to_string(),
            message: reason,
        });
    }
}
