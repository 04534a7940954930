//! Debounced auto-save.
//!
//! The session publishes a [`Snapshot`] on every tracked change. A spawned
//! task waits for the changes to go quiet for the debounce period, then
//! writes the draft if its content differs from what was last saved. Manual
//! saves and auto-saves share one gate so they never overlap.

use std::sync::Arc;
use std::time::Duration;

use folio_common::DocumentStore;
use folio_common::blake3;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::document::Document;
use crate::error::SyncError;

/// Auto-save state, observable through [`EditorSession::subscribe_status`](crate::EditorSession::subscribe_status).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncStatus {
    #[default]
    Idle,
    /// Changes are waiting for the quiet period to elapse.
    PendingDebounce,
    Saving,
    /// The last auto-save failed. Transient: the status returns to idle
    /// right after.
    Error(String),
}

/// Tracked state at one point in time.
#[derive(Debug)]
pub(crate) struct Snapshot {
    pub hash: blake3::Hash,
    pub document: Document,
}

impl Snapshot {
    pub fn of(document: &Document) -> Self {
        Self {
            hash: document.content_hash(),
            document: document.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct SaveState {
    /// Hash of the last content the store accepted.
    pub last_saved: Option<blake3::Hash>,
}

/// State shared between a session and its auto-save task.
#[derive(Debug)]
pub(crate) struct Shared {
    /// Held for the duration of every store write.
    pub gate: Mutex<SaveState>,
    pub status: watch::Sender<SyncStatus>,
}

impl Shared {
    pub fn new(last_saved: Option<blake3::Hash>) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            gate: Mutex::new(SaveState { last_saved }),
            status,
        }
    }

    pub fn set_status(&self, status: SyncStatus) {
        let previous = self.status.send_replace(status.clone());
        if previous != status {
            tracing::debug!(?previous, current = ?status, "sync status changed");
        }
    }

    /// Move to `PendingDebounce` unless a save is running.
    pub fn mark_pending(&self) {
        self.status.send_if_modified(|status| match status {
            SyncStatus::Saving | SyncStatus::PendingDebounce => false,
            _ => {
                *status = SyncStatus::PendingDebounce;
                true
            }
        });
    }
}

/// Write the draft copy of `document`.
pub(crate) async fn write_draft<S: DocumentStore>(
    store: &S,
    document: &Document,
) -> Result<(), SyncError> {
    store.commit(document.draft_transaction()?).await?;
    Ok(())
}

pub(crate) fn spawn<S: DocumentStore + 'static>(
    store: Arc<S>,
    shared: Arc<Shared>,
    changes: watch::Receiver<Option<Arc<Snapshot>>>,
    debounce: Duration,
) -> JoinHandle<()> {
    tokio::spawn(run(store, shared, changes, debounce))
}

async fn run<S: DocumentStore>(
    store: Arc<S>,
    shared: Arc<Shared>,
    mut changes: watch::Receiver<Option<Arc<Snapshot>>>,
    debounce: Duration,
) {
    let mut rearm = false;
    loop {
        if !rearm && changes.changed().await.is_err() {
            break;
        }
        rearm = false;
        shared.mark_pending();

        // Every change restarts the quiet period.
        loop {
            match tokio::time::timeout(debounce, changes.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => {
                    tracing::debug!("session closed, pending auto-save cancelled");
                    return;
                }
                Err(_) => break,
            }
        }

        let Some(snapshot) = changes.borrow_and_update().clone() else {
            shared.set_status(SyncStatus::Idle);
            continue;
        };

        let Ok(mut state) = shared.gate.try_lock() else {
            tracing::debug!("save in flight, auto-save deferred");
            rearm = true;
            continue;
        };

        if state.last_saved == Some(snapshot.hash) {
            shared.set_status(SyncStatus::Idle);
            continue;
        }

        shared.set_status(SyncStatus::Saving);
        let id = snapshot.document.draft_id();
        match write_draft(store.as_ref(), &snapshot.document).await {
            Ok(()) => {
                state.last_saved = Some(snapshot.hash);
                drop(state);
                tracing::info!(%id, "auto-saved draft");
                shared.set_status(SyncStatus::Idle);
            }
            Err(error) => {
                drop(state);
                tracing::warn!(%id, %error, "auto-save failed");
                shared.set_status(SyncStatus::Error(error.to_string()));
                shared.set_status(SyncStatus::Idle);
            }
        }
    }
    tracing::trace!("auto-save task finished");
}
