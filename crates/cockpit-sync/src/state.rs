//! Observable sync state
//!
//! Presentation layers subscribe to a [`SyncState`] stream instead of
//! polling. A new subscriber sees the current state immediately, then every
//! transition.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

/// Snapshot of the sync queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub is_online: bool,
    pub is_syncing: bool,
    pub pending_count: usize,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            is_online: true,
            is_syncing: false,
            pending_count: 0,
            last_sync_time: None,
            last_error: None,
        }
    }
}

impl SyncState {
    /// Short label for a status indicator
    #[must_use]
    pub fn indicator(&self) -> &'static str {
        if !self.is_online {
            "offline"
        } else if self.is_syncing {
            "syncing"
        } else if self.pending_count > 0 {
            "pending"
        } else {
            "idle"
        }
    }
}

/// Shared cell publishing [`SyncState`] transitions
#[derive(Debug)]
pub(crate) struct StateCell {
    tx: watch::Sender<SyncState>,
}

impl StateCell {
    pub(crate) fn new(initial: SyncState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub(crate) fn snapshot(&self) -> SyncState {
        self.tx.borrow().clone()
    }

    /// Apply `f`; subscribers are notified only if the state changed
    pub(crate) fn update(&self, f: impl FnOnce(&mut SyncState)) {
        self.tx.send_if_modified(|state| {
            let before = state.clone();
            f(state);
            *state != before
        });
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SyncState> {
        let mut rx = self.tx.subscribe();
        rx.mark_changed();
        rx
    }
}
