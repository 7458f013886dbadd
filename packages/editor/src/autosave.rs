//! # Debounced Persistence
//!
//! The session pushes every new document into a `watch` channel. A
//! background task waits until no new document has arrived for the quiet
//! period and then saves the latest one, so a burst of edits turns into a
//! single write.
//!
//! Failed saves are retried with linear backoff and reported as
//! [`PersistenceEvent::Warning`]. In-memory state is never rolled back. A
//! newer document arriving during backoff supersedes the failing one.

use crate::config::EditorConfig;
use crate::storage::DocumentStore;
use pagecraft_document::Document;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceEvent {
    Saved { page_id: String, attempts: u32 },

    /// A save attempt failed and will be retried
    Warning {
        page_id: String,
        attempt: u32,
        message: String,
    },

    /// Retries exhausted; the document stays in memory only
    Failed { page_id: String, message: String },
}

#[derive(Debug, Clone)]
struct Policy {
    quiet_period: Duration,
    max_retries: u32,
    backoff: Duration,
}

pub struct Autosaver {
    page_id: String,
    tx: watch::Sender<Option<Document>>,
    events: broadcast::Sender<PersistenceEvent>,
    task: JoinHandle<()>,
}

impl Autosaver {
    /// Start the background task. Must be called inside a tokio runtime.
    pub fn spawn(
        page_id: impl Into<String>,
        store: Arc<dyn DocumentStore>,
        config: &EditorConfig,
    ) -> Self {
        let page_id = page_id.into();
        let (tx, rx) = watch::channel(None);
        let (events, _) = broadcast::channel(64);
        let policy = Policy {
            quiet_period: config.quiet_period(),
            max_retries: config.autosave_max_retries,
            backoff: config.retry_backoff(),
        };

        let task = tokio::spawn(run(page_id.clone(), store, rx, events.clone(), policy));
        debug!(page_id = %page_id, "Autosave started");

        Self {
            page_id,
            tx,
            events,
            task,
        }
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    /// Queue a document for saving; never blocks.
    pub fn notify(&self, document: &Document) {
        self.tx.send_replace(Some(document.clone()));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PersistenceEvent> {
        self.events.subscribe()
    }

    /// Save anything still pending and stop the task.
    pub async fn close(self) {
        let Autosaver {
            page_id, tx, task, ..
        } = self;
        drop(tx);
        if let Err(e) = task.await {
            warn!(page_id = %page_id, error = %e, "Autosave task ended abnormally");
        }
        debug!(page_id = %page_id, "Autosave stopped");
    }
}

async fn run(
    page_id: String,
    store: Arc<dyn DocumentStore>,
    mut rx: watch::Receiver<Option<Document>>,
    events: broadcast::Sender<PersistenceEvent>,
    policy: Policy,
) {
    let mut closed = false;
    while !closed {
        // Wait for the first change of a burst
        if rx.changed().await.is_err() {
            break;
        }

        // Debounce until quiet, or until the session closes
        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        closed = true;
                        break;
                    }
                }
                _ = tokio::time::sleep(policy.quiet_period) => break,
            }
        }

        let Some(document) = rx.borrow_and_update().clone() else {
            continue;
        };
        flush(&page_id, store.as_ref(), &document, &mut rx, &events, &policy, closed).await;
    }
}

#[instrument(skip_all, fields(page_id = %page_id, nodes = document.len()))]
async fn flush(
    page_id: &str,
    store: &dyn DocumentStore,
    document: &Document,
    rx: &mut watch::Receiver<Option<Document>>,
    events: &broadcast::Sender<PersistenceEvent>,
    policy: &Policy,
    closing: bool,
) {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match store.save(page_id, document).await {
            Ok(()) => {
                info!(attempts = attempt, "Page saved");
                let _ = events.send(PersistenceEvent::Saved {
                    page_id: page_id.to_string(),
                    attempts: attempt,
                });
                return;
            }
            Err(e) if attempt > policy.max_retries => {
                warn!(attempts = attempt, error = %e, "Giving up on saving page");
                let _ = events.send(PersistenceEvent::Failed {
                    page_id: page_id.to_string(),
                    message: e.to_string(),
                });
                return;
            }
            Err(e) => {
                warn!(attempt, error = %e, "Save failed, retrying");
                let _ = events.send(PersistenceEvent::Warning {
                    page_id: page_id.to_string(),
                    attempt,
                    message: e.to_string(),
                });
            }
        }

        let backoff = policy.backoff * attempt;
        if closing {
            tokio::time::sleep(backoff).await;
            continue;
        }
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_ok() {
                    // Mark unseen again so the outer loop picks it up
                    rx.mark_changed();
                    debug!("Newer document arrived, abandoning retries");
                    return;
                }
                tokio::time::sleep(backoff).await;
            }
            _ = tokio::time::sleep(backoff) => {}
        }
    }
}
