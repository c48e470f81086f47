//! Durable FIFO of pending remote writes
//!
//! The whole queue is stored as one JSON array under
//! `cockpit_offline_queue` and rewritten after every mutation, so pending
//! writes survive a restart.
//!
//! # Coalescing
//!
//! Enqueueing a write for a `(cockpit, kind)` pair that already has a pending
//! entry replaces that entry's payload in place instead of appending. The
//! entry currently on the wire is never replaced.

use crate::error::StorageError;
use crate::payload::{CockpitPayload, WriteKind};
use crate::storage::{Storage, StorageExt};
use chrono::{DateTime, Utc};
use cockpit_model::{Cockpit, EntityId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use ulid::Ulid;

/// Storage key of the durable queue
pub const QUEUE_KEY: &str = "cockpit_offline_queue";

/// Identifier of a queued write
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteId(String);

impl WriteId {
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A write waiting to reach the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWrite {
    pub id: WriteId,
    pub cockpit_id: EntityId,
    pub kind: WriteKind,
    pub payload: CockpitPayload,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl PendingWrite {
    /// Whole-document update for `cockpit`
    #[must_use]
    pub fn update(cockpit: &Cockpit) -> Self {
        let now = Utc::now();
        Self {
            id: WriteId::generate(),
            cockpit_id: cockpit.id.clone(),
            kind: WriteKind::Update,
            payload: CockpitPayload::from_cockpit(cockpit, now),
            created_at: now,
            retry_count: 0,
            last_error: None,
        }
    }

    fn same_target(&self, other: &Self) -> bool {
        self.cockpit_id == other.cockpit_id && self.kind == other.kind
    }
}

/// What [`OfflineQueue::enqueue`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enqueued {
    /// New entry at the tail
    Appended(WriteId),
    /// Existing entry took the new payload
    Coalesced(WriteId),
}

impl Enqueued {
    /// Id of the entry now holding the write
    #[must_use]
    pub fn id(&self) -> &WriteId {
        match self {
            Self::Appended(id) | Self::Coalesced(id) => id,
        }
    }
}

/// FIFO of [`PendingWrite`]s mirrored to storage
#[derive(Debug)]
pub struct OfflineQueue {
    storage: Arc<dyn Storage>,
    entries: Vec<PendingWrite>,
}

impl OfflineQueue {
    /// Restore the queue from storage
    ///
    /// An unreadable queue is logged and replaced by an empty one.
    ///
    /// # Errors
    /// Storage read failure
    pub fn load(storage: Arc<dyn Storage>) -> Result<Self, StorageError> {
        let entries = match storage.get_json::<Vec<PendingWrite>>(QUEUE_KEY) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(StorageError::Codec { source, .. }) => {
                tracing::warn!(error = %source, "discarding unreadable offline queue");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        if !entries.is_empty() {
            tracing::info!(pending = entries.len(), "restored offline queue");
        }
        Ok(Self { storage, entries })
    }

    /// Add a write, coalescing with the latest pending entry for the same
    /// cockpit and kind
    ///
    /// `in_flight` names the entry currently being sent; it is never
    /// coalesced into.
    ///
    /// # Errors
    /// Storage write failure; the in-memory queue is updated regardless
    pub fn enqueue(
        &mut self,
        write: PendingWrite,
        in_flight: Option<&WriteId>,
    ) -> Result<Enqueued, StorageError> {
        let existing = self
            .entries
            .iter_mut()
            .rev()
            .find(|entry| entry.same_target(&write) && Some(&entry.id) != in_flight);

        let outcome = match existing {
            Some(entry) => {
                entry.payload = write.payload;
                entry.created_at = write.created_at;
                entry.retry_count = 0;
                entry.last_error = None;
                Enqueued::Coalesced(entry.id.clone())
            }
            None => {
                let id = write.id.clone();
                self.entries.push(write);
                Enqueued::Appended(id)
            }
        };
        self.persist()?;
        Ok(outcome)
    }

    /// Oldest entry
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<&PendingWrite> {
        self.entries.first()
    }

    /// Entry by id
    #[must_use]
    pub fn get(&self, id: &WriteId) -> Option<&PendingWrite> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Remove an entry
    ///
    /// # Errors
    /// Storage write failure; the entry is removed from memory regardless
    pub fn remove(&mut self, id: &WriteId) -> Result<Option<PendingWrite>, StorageError> {
        let Some(idx) = self.entries.iter().position(|e| &e.id == id) else {
            return Ok(None);
        };
        let removed = self.entries.remove(idx);
        self.persist()?;
        Ok(Some(removed))
    }

    /// Count a failed attempt; returns the new retry count
    ///
    /// # Errors
    /// Storage write failure
    pub fn record_failure(
        &mut self,
        id: &WriteId,
        error: impl Into<String>,
    ) -> Result<Option<u32>, StorageError> {
        let Some(entry) = self.entries.iter_mut().find(|e| &e.id == id) else {
            return Ok(None);
        };
        entry.retry_count += 1;
        entry.last_error = Some(error.into());
        let count = entry.retry_count;
        self.persist()?;
        Ok(Some(count))
    }

    /// True when another write for `cockpit_id` is still waiting
    #[must_use]
    pub fn has_pending_for(&self, cockpit_id: &EntityId) -> bool {
        self.entries.iter().any(|e| &e.cockpit_id == cockpit_id)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl Iterator<Item = &PendingWrite> {
        self.entries.iter()
    }

    /// Drop every entry
    ///
    /// # Errors
    /// Storage failure
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.entries.clear();
        self.persist()
    }

    fn persist(&self) -> Result<(), StorageError> {
        if self.entries.is_empty() {
            self.storage.remove(QUEUE_KEY)
        } else {
            self.storage.set_json(QUEUE_KEY, &self.entries)
        }
    }
}
