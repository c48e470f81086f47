//! Local backup store
//!
//! One full-document snapshot per cockpit under `cockpit_backup_{id}`,
//! written before every save attempt and cleared only after a confirmed
//! remote write.

use crate::error::StorageError;
use crate::storage::{Storage, StorageExt};
use chrono::{DateTime, Utc};
use cockpit_model::{Cockpit, EntityId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Key prefix for backups
pub const BACKUP_PREFIX: &str = "cockpit_backup_";

/// Snapshot of a cockpit and when it was taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub cockpit: Cockpit,
    pub backed_up_at: DateTime<Utc>,
}

impl Backup {
    /// True when this snapshot is strictly newer than the server copy
    ///
    /// A server copy without a timestamp never beats a backup.
    #[must_use]
    pub fn is_newer_than(&self, server: &Cockpit) -> bool {
        server
            .updated_at
            .map_or(true, |updated_at| self.backed_up_at > updated_at)
    }
}

/// Backups keyed by cockpit id
#[derive(Debug, Clone)]
pub struct BackupStore {
    storage: Arc<dyn Storage>,
}

impl BackupStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Storage key for a cockpit's backup
    #[must_use]
    pub fn key_for(id: &EntityId) -> String {
        format!("{BACKUP_PREFIX}{id}")
    }

    /// Snapshot `cockpit` now
    ///
    /// # Errors
    /// Storage write or encode failure
    pub fn save(&self, cockpit: &Cockpit) -> Result<Backup, StorageError> {
        self.save_at(cockpit, Utc::now())
    }

    /// Snapshot `cockpit` with an explicit capture time
    ///
    /// # Errors
    /// Storage write or encode failure
    pub fn save_at(&self, cockpit: &Cockpit, at: DateTime<Utc>) -> Result<Backup, StorageError> {
        let backup = Backup {
            cockpit: cockpit.clone(),
            backed_up_at: at,
        };
        self.storage.set_json(&Self::key_for(&cockpit.id), &backup)?;
        Ok(backup)
    }

    /// Backup for `id`
    ///
    /// An unreadable backup is logged and treated as absent.
    ///
    /// # Errors
    /// Storage read failure
    pub fn load(&self, id: &EntityId) -> Result<Option<Backup>, StorageError> {
        match self.storage.get_json::<Backup>(&Self::key_for(id)) {
            Err(StorageError::Codec { key, source }) => {
                tracing::warn!(%key, error = %source, "discarding unreadable backup");
                Ok(None)
            }
            other => other,
        }
    }

    /// Drop the backup for `id`
    ///
    /// # Errors
    /// Storage failure
    pub fn clear(&self, id: &EntityId) -> Result<(), StorageError> {
        self.storage.remove(&Self::key_for(id))
    }

    /// True when a backup exists for `id`
    ///
    /// # Errors
    /// Storage read failure
    pub fn exists(&self, id: &EntityId) -> Result<bool, StorageError> {
        Ok(self.storage.get(&Self::key_for(id))?.is_some())
    }

    /// Every readable backup
    ///
    /// # Errors
    /// Storage failure
    pub fn list(&self) -> Result<Vec<Backup>, StorageError> {
        let mut backups = Vec::new();
        for key in self.storage.keys()? {
            if let Some(id) = key.strip_prefix(BACKUP_PREFIX) {
                if let Some(backup) = self.load(&EntityId::new(id))? {
                    backups.push(backup);
                }
            }
        }
        Ok(backups)
    }
}
