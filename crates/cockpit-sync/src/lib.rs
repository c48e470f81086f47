//! Cockpit Sync - offline-resilient persistence
//!
//! The write path for cockpit documents:
//! - [`AutosaveScheduler`]: debounced or immediate save triggers
//! - [`BackupStore`]: full snapshot taken before every network write
//! - [`OfflineQueue`]: durable, coalescing FIFO of pending writes
//! - [`SyncService`]: drains the queue one write at a time with backoff
//! - [`Reconciler`]: picks server copy or backup on load
//!
//! # Example
//!
//! ```rust,ignore
//! use cockpit_sync::{FileStorage, HttpTransport, SyncConfig, SyncService};
//! use std::sync::Arc;
//!
//! let config = SyncConfig::default();
//! let storage = Arc::new(FileStorage::open("./state")?);
//! let transport = Arc::new(HttpTransport::new("https://cockpits.example", config.request_timeout)?);
//! let sync = SyncService::new(&config, storage, transport)?;
//! sync.start();
//! sync.persist(&cockpit);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod autosave;
pub mod backup;
pub mod config;
pub mod error;
pub mod payload;
pub mod queue;
pub mod reconcile;
pub mod service;
pub mod state;
pub mod storage;
pub mod transport;

pub use autosave::{AutosaveScheduler, DocumentSource, SaveSink};
pub use backup::{Backup, BackupStore, BACKUP_PREFIX};
pub use config::{RetryPolicy, SyncConfig};
pub use error::{StorageError, SyncError, TransportError};
pub use payload::{CockpitPayload, WriteKind};
pub use queue::{Enqueued, OfflineQueue, PendingWrite, WriteId, QUEUE_KEY};
pub use reconcile::{LoadSource, Reconciled, Reconciler};
pub use service::{DrainReport, SyncService};
pub use state::SyncState;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageExt};
pub use transport::{HttpTransport, Transport, WriteOutcome, WriteResponse};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
