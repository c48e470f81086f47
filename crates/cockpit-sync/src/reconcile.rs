//! Load-time reconciliation between server copy and local backup
//!
//! | Server fetch | Backup | Working copy | Re-save |
//! |--------------|--------|--------------|---------|
//! | ok | none | server | no |
//! | ok | older or equal | server, backup cleared | no |
//! | ok | strictly newer | backup | once |
//! | failed | present | backup | no, until online |
//! | failed | none | error | - |

use crate::backup::BackupStore;
use crate::error::SyncError;
use crate::transport::Transport;
use cockpit_model::{Cockpit, EntityId};
use std::sync::Arc;

/// Where the working copy came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Server,
    /// Backup newer than the server copy
    Backup,
    /// Backup used because the server was unreachable
    OfflineBackup,
}

/// Working copy chosen on load
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub cockpit: Cockpit,
    pub source: LoadSource,
}

impl Reconciled {
    /// Working copy must be pushed back to the server right away
    #[inline]
    #[must_use]
    pub fn needs_resave(&self) -> bool {
        self.source == LoadSource::Backup
    }
}

/// Picks the working copy for a cockpit
#[derive(Clone)]
pub struct Reconciler {
    transport: Arc<dyn Transport>,
    backups: BackupStore,
}

impl Reconciler {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, backups: BackupStore) -> Self {
        Self { transport, backups }
    }

    /// Fetch `id` and reconcile it against any local backup
    ///
    /// # Errors
    /// The fetch error when the server is unreachable and no backup exists,
    /// or a storage error reading the backup
    pub async fn load(&self, id: &EntityId) -> Result<Reconciled, SyncError> {
        let backup = self.backups.load(id)?;

        let server = match self.transport.fetch_cockpit(id).await {
            Ok(server) => server,
            Err(e) => {
                return match backup {
                    Some(backup) => {
                        tracing::warn!(cockpit = %id, error = %e, "server unreachable, loading local backup");
                        Ok(Reconciled {
                            cockpit: backup.cockpit,
                            source: LoadSource::OfflineBackup,
                        })
                    }
                    None => Err(e.into()),
                };
            }
        };

        match backup {
            Some(backup) if backup.is_newer_than(&server) => {
                tracing::info!(
                    cockpit = %id,
                    backed_up_at = %backup.backed_up_at,
                    server_updated_at = ?server.updated_at,
                    "local backup is newer than server copy"
                );
                Ok(Reconciled {
                    cockpit: backup.cockpit,
                    source: LoadSource::Backup,
                })
            }
            Some(_) => {
                tracing::info!(cockpit = %id, "server copy is current, discarding backup");
                if let Err(e) = self.backups.clear(id) {
                    tracing::warn!(error = %e, "backup not cleared");
                }
                Ok(Reconciled {
                    cockpit: server,
                    source: LoadSource::Server,
                })
            }
            None => Ok(Reconciled {
                cockpit: server,
                source: LoadSource::Server,
            }),
        }
    }
}
